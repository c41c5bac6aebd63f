use thiserror::Error;

/// Main error type for the useful-preset crate
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid matcher pattern '{pattern}': {message}")]
    InvalidMatcher { pattern: String, message: String },

    #[error("No files found matching the provided patterns")]
    NoFilesFound,

    #[error("Failed to parse CSS in {source_name} at byte {offset}: {message}")]
    CssParse {
        source_name: String,
        offset: usize,
        message: String,
    },

    #[error("Failed to write output to {path}: {message}")]
    OutputError { path: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Input error: {0}")]
    InputError(String),
}

pub type Result<T> = std::result::Result<T, PresetError>;
