use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Useful preset CLI - resolves preset options and postprocesses generated CSS
#[derive(Parser, Debug)]
#[command(name = "useful-preset")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        default_value_t = false,
        help = "Enable verbose output"
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved preset configuration as JSON
    Resolve(ResolveArgs),
    /// Postprocess generated CSS files
    Process(ProcessArgs),
    /// Postprocess CSS from stdin and write it to stdout
    Pipe(PipeArgs),
}

/// Arguments for the resolve command
#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    /// Preset options file (YAML or JSON)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Path to the preset options file (.yaml, .yml or .json)"
    )]
    pub config: Option<PathBuf>,

    /// Emit compact JSON
    #[arg(
        long = "compact",
        default_value_t = false,
        help = "Print the resolved options on a single line"
    )]
    pub compact: bool,
}

/// Arguments for the process command
#[derive(Parser, Debug, Clone)]
pub struct ProcessArgs {
    /// Input file patterns (glob patterns supported)
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATTERN",
        required = true,
        num_args = 1..,
        help = "Generated CSS files to postprocess"
    )]
    pub input: Vec<String>,

    /// Exclude patterns (glob patterns to exclude)
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "PATTERN",
        num_args = 0..,
        help = "Patterns to exclude from processing"
    )]
    pub exclude: Vec<String>,

    /// Output directory; files are rewritten in place when omitted
    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "DIR",
        help = "Directory for the processed files (defaults to rewriting in place)"
    )]
    pub output_dir: Option<PathBuf>,

    /// Preset options file (YAML or JSON)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Path to the preset options file (.yaml, .yml or .json)"
    )]
    pub config: Option<PathBuf>,

    /// JSON report path
    #[arg(
        short = 'r',
        long = "report",
        value_name = "PATH",
        help = "Write a JSON report of the processed files"
    )]
    pub report: Option<PathBuf>,

    /// Rewrite color functions to the legacy comma syntax first
    #[arg(
        long = "legacy-compat",
        default_value_t = false,
        help = "Rewrite color functions to comma-separated arguments before postprocessing"
    )]
    pub legacy_compat: bool,

    /// Number of parallel threads to use
    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "NUM",
        help = "Number of parallel threads to use (defaults to number of CPU cores)"
    )]
    pub jobs: Option<usize>,

    /// Dry run (don't write output files)
    #[arg(
        long = "dry-run",
        default_value_t = false,
        help = "Process files but don't write any output"
    )]
    pub dry_run: bool,
}

/// Arguments for the pipe command
#[derive(Parser, Debug, Clone)]
pub struct PipeArgs {
    /// Preset options file (YAML or JSON)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Path to the preset options file (.yaml, .yml or .json)"
    )]
    pub config: Option<PathBuf>,

    /// Rewrite color functions to the legacy comma syntax first
    #[arg(
        long = "legacy-compat",
        default_value_t = false,
        help = "Rewrite color functions to comma-separated arguments before postprocessing"
    )]
    pub legacy_compat: bool,
}

impl ProcessArgs {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.input.is_empty() {
            return Err("At least one input pattern must be provided".to_string());
        }

        if let Some(jobs) = self.jobs {
            if jobs == 0 {
                return Err("Number of jobs must be at least 1".to_string());
            }
        }

        if let (Some(report), Some(dir)) = (&self.report, &self.output_dir) {
            if report == dir {
                return Err("Report path and output directory must be different".to_string());
            }
        }

        Ok(())
    }
}
