use clap::{command, Parser, Subcommand};
use cppygen::{includes, Error, GeneratorConfig};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "cppygen.json")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Expand every template in a directory
    Generate {
        /// Directory holding the .cppy templates
        #[arg(short, long, default_value = "demos/cppy_source")]
        dir: PathBuf,
    },
    /// Report include cycles between local headers
    CheckIncludes {
        /// Directory of headers to scan
        #[arg(short, long, default_value = "include")]
        dir: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig, Error> {
    let config_path = cli.config.clone();
    let config: GeneratorConfig = if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| Error::internal(format!("Failed to read config file: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::internal(format!("Failed to parse config file: {}", e)))?
    } else {
        GeneratorConfig::default()
    };

    info!("config loaded.");
    debug!("config: {:?}", config);
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), Error> {
    match &cli.command {
        Command::Generate { dir } => {
            let config = load_config(cli)?;
            let outcome = cppygen::driver::run(dir, &config)?;
            println!("generated {} file(s)", outcome.written.len());
            if !outcome.is_success() {
                for (path, error) in &outcome.failed {
                    eprintln!("{}: {}", path.display(), error);
                }
                return Err(Error::internal(format!(
                    "{} template(s) failed",
                    outcome.failed.len()
                )));
            }
            Ok(())
        }
        Command::CheckIncludes { dir } => {
            let cycles = includes::check(dir)?;
            for cycle in &cycles {
                println!("{}", cycle.join(" -> "));
            }
            if cycles.is_empty() {
                Ok(())
            } else {
                Err(Error::internal(format!(
                    "found {} include cycle(s)",
                    cycles.len()
                )))
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
