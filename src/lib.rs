pub mod args;
pub mod config;
pub mod errors;
pub mod postprocess;
pub mod preset;
pub mod registry;
pub mod resolve;
pub mod shortcuts;
pub mod stylesheet;
pub mod theme;

pub use args::{Cli, Commands, PipeArgs, ProcessArgs, ResolveArgs};
pub use config::{
    ImportantOption, ImportantRulesOption, Matcher, PluginToggle, PreflightsOption, UnColorOption,
    UsefulOptions, DEFAULT_UN_COLOR,
};
pub use errors::{PresetError, Result};
pub use postprocess::{
    postprocess, ImportantProcessor, ImportantRules, LegacyColorCompat, Postprocessor, UnColorProcessor,
};
pub use preset::{preset_useful, Preflight, UsefulPreset, PRESET_NAME};
pub use registry::PluginInstance;
pub use resolve::{resolve_options, Preflights, ResolvedOptions};
pub use stylesheet::{CssNode, CssRule, Declaration};

use chrono::{DateTime, Utc};
use serde::Serialize;
#[cfg(feature = "cli")]
use std::fs;
use std::path::{Path, PathBuf};

/// Load preset options from `path`, or the defaults when no file is given
pub fn load_options(path: Option<&Path>) -> Result<UsefulOptions> {
    match path {
        Some(path) => UsefulOptions::from_file(path),
        None => Ok(UsefulOptions::default()),
    }
}

/// Build the preset for a CLI invocation
pub fn build_preset(config: Option<&Path>, legacy_compat: bool) -> Result<UsefulPreset> {
    let preset = preset_useful(load_options(config)?);
    Ok(if legacy_compat {
        preset.after(LegacyColorCompat)
    } else {
        preset
    })
}

/// Handle the resolve command: the resolved options as JSON
pub fn resolve_command(args: &ResolveArgs) -> Result<String> {
    let resolved = resolve_options(load_options(args.config.as_deref())?);
    let json = if args.compact {
        serde_json::to_string(&resolved)?
    } else {
        serde_json::to_string_pretty(&resolved)?
    };
    Ok(json)
}

/// Outcome for a single processed file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rules: usize,
    pub bytes_in: usize,
    pub bytes_out: usize,
}

/// Summary of a process run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub preset: &'static str,
    pub generated_at: DateTime<Utc>,
    pub files: Vec<FileReport>,
}

impl ProcessReport {
    pub fn total_rules(&self) -> usize {
        self.files.iter().map(|f| f.rules).sum()
    }
}

/// Postprocess one CSS text, returning the new text and its rule count
pub fn process_source(preset: &UsefulPreset, css: &str, source_name: &str) -> Result<(String, usize)> {
    let mut nodes = stylesheet::parse(css, source_name)?;
    let mut rules = 0;
    stylesheet::for_each_rule_mut(&mut nodes, &mut |_| rules += 1);
    preset.postprocess(&mut nodes);
    Ok((stylesheet::to_css(&nodes), rules))
}

/// Handle the process command
#[cfg(feature = "cli")]
pub fn process(args: ProcessArgs, verbose: bool) -> Result<ProcessReport> {
    use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
    use rayon::prelude::*;

    args.validate().map_err(PresetError::InvalidInput)?;

    let preset = build_preset(args.config.as_deref(), args.legacy_compat)?;
    let files = collect_files(&args.input, &args.exclude)?;
    if files.is_empty() {
        return Err(PresetError::NoFilesFound);
    }
    tracing::info!(files = files.len(), "processing generated CSS");

    if let Some(jobs) = args.jobs {
        let _ = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global();
    }

    let progress_bar = ProgressBar::new(files.len() as u64);
    if verbose {
        progress_bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
    {
        progress_bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }

    let reports: Result<Vec<FileReport>> = files
        .par_iter()
        .map(|input| {
            let report = process_file(&preset, input, &args);
            progress_bar.inc(1);
            progress_bar.set_message(
                input
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .into_owned(),
            );
            report
        })
        .collect();
    let report = ProcessReport {
        preset: preset.name,
        generated_at: Utc::now(),
        files: reports?,
    };
    progress_bar.finish_with_message(format!("✓ {} rules", report.total_rules()));

    if let Some(path) = &args.report {
        if !args.dry_run {
            write_atomic(path, &serde_json::to_string_pretty(&report)?).map_err(|e| {
                PresetError::OutputError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            })?;
        }
    }

    Ok(report)
}

#[cfg(feature = "cli")]
fn process_file(preset: &UsefulPreset, input: &Path, args: &ProcessArgs) -> Result<FileReport> {
    let css = fs::read_to_string(input)?;
    let (processed, rules) = process_source(preset, &css, &input.display().to_string())?;

    let output = match &args.output_dir {
        Some(dir) => dir.join(input.file_name().unwrap_or_default()),
        None => input.to_path_buf(),
    };
    tracing::debug!(input = %input.display(), output = %output.display(), rules, "processed");

    if !args.dry_run {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&output, &processed).map_err(|e| PresetError::OutputError {
            path: output.display().to_string(),
            message: e.to_string(),
        })?;
    }

    Ok(FileReport {
        input: input.to_path_buf(),
        output,
        rules,
        bytes_in: css.len(),
        bytes_out: processed.len(),
    })
}

/// Collect files matching the given patterns, skipping excluded paths and
/// duplicates
#[cfg(feature = "cli")]
fn collect_files(patterns: &[String], exclude_patterns: &[String]) -> Result<Vec<PathBuf>> {
    let excludes = exclude_patterns
        .iter()
        .map(|pattern| glob::Pattern::new(pattern))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut files = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for pattern in patterns {
        for entry in glob::glob(pattern)? {
            let path = entry?;
            if path.is_dir() || excludes.iter().any(|p| p.matches_path(&path)) {
                continue;
            }
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

/// Write file atomically by writing to temp file then renaming
#[cfg(feature = "cli")]
fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> std::io::Result<()> {
    use std::io::Write;

    let path = path.as_ref();
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Handle pipe command - read generated CSS from stdin, write the
/// postprocessed CSS to stdout
#[cfg(feature = "cli")]
pub async fn handle_pipe_command(args: PipeArgs) -> Result<()> {
    use tokio::io::{self, AsyncReadExt, AsyncWriteExt};

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .await
        .map_err(|e| PresetError::InputError(format!("Failed to read from stdin: {}", e)))?;

    if input.trim().is_empty() {
        return Ok(());
    }

    let preset = build_preset(args.config.as_deref(), args.legacy_compat)?;
    let (css, _) = process_source(&preset, &input, "stdin")?;

    let mut stdout = io::stdout();
    stdout
        .write_all(css.as_bytes())
        .await
        .map_err(|e| PresetError::OutputError {
            path: "stdout".to_string(),
            message: e.to_string(),
        })?;
    stdout.flush().await.map_err(|e| PresetError::OutputError {
        path: "stdout".to_string(),
        message: e.to_string(),
    })?;

    Ok(())
}
