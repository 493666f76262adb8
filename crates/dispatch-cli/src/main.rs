mod loader;
mod report;

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;

use dispatch_model::{DataSource, DispatchModel, Dispatcher, Parameters, ResultSink, SolveOptions};
use loader::JsonDirSource;
use report::{JsonReport, TextReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dispatch")]
#[command(about = "Hourly load, PV and grid dispatch for a single prosumer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the dispatch problem for a case directory
    Solve {
        /// Directory holding the case's JSON files
        dir: PathBuf,
        /// Attach shadow prices to the result
        #[arg(long)]
        duals: bool,
        /// Log solver progress to stderr
        #[arg(long)]
        solver_output: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Write the result record to this file instead of stdout (json only)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load and validate a case directory without solving
    Check {
        /// Directory holding the case's JSON files
        dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            dir,
            duals,
            solver_output,
            format,
            output,
        } => {
            init_tracing(solver_output);

            let options = SolveOptions {
                extract_duals: duals,
                solver_output,
            };
            let dispatcher = Dispatcher::new(options);
            let source = JsonDirSource::new(dir);
            info!(dir = %source.dir().display(), "solving case");

            let mut sink: Box<dyn ResultSink> = match (format, output) {
                (Format::Json, Some(path)) => match JsonReport::create(&path) {
                    Ok(report) => Box::new(report),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
                (Format::Json, None) => Box::new(JsonReport::new(io::stdout())),
                (Format::Text, Some(_)) => {
                    eprintln!("Error: --output requires --format json");
                    std::process::exit(1);
                }
                (Format::Text, None) => Box::new(TextReport::new(io::stdout())),
            };

            match dispatcher.run(&source, sink.as_mut()) {
                Ok(result) if result.is_optimal() => {}
                Ok(result) => {
                    eprintln!("No optimal solution (status {})", result.status);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { dir } => {
            init_tracing(false);

            let input = match JsonDirSource::new(&dir).load() {
                Ok(input) => input,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            let params = match Parameters::from_input(&input) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Validation error: {}", e);
                    std::process::exit(1);
                }
            };

            let model = match DispatchModel::build(&params) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("Validation error: {}", e);
                    std::process::exit(1);
                }
            };

            println!("✓ {} is valid", dir.display());
            println!("  Horizon: {} steps", params.horizon);
            println!("  Emin: {:.4} kWh", params.e_min);
            println!(
                "  Model: {} variables, {} constraints",
                model.problem().num_variables(),
                model.problem().num_constraints()
            );
        }
    }
}
