use clap::Parser;
use tracing_subscriber::EnvFilter;
use useful_preset::{handle_pipe_command, process, resolve_command, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Resolve(args) => {
            println!("{}", resolve_command(&args)?);
            Ok(())
        }
        Commands::Process(args) => match process(args, cli.verbose) {
            Ok(report) => {
                println!("Processing successful!");
                println!("  - Processed {} files", report.files.len());
                println!("  - Rewrote {} rules", report.total_rules());
                Ok(())
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Pipe(args) => {
            handle_pipe_command(args).await?;
            Ok(())
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the level picked by `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "useful_preset=debug" } else { "useful_preset=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
