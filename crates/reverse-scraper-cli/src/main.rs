use clap::{Parser, Subcommand};
use console::style;
use log::{info, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;

use reverse_scraper_core::{logging, selftest, Config, LogLevel, ReverseScraper, RunMode};

mod prompt;

#[derive(Parser)]
#[command(name = "reverse-scraper")]
#[command(about = "Find larger copies of local images through reverse image search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every image in the input folder
    Run {
        /// Process one file at a time and print every step
        #[arg(long)]
        single: bool,

        /// Candidate links to try per image (asked for when omitted)
        #[arg(long)]
        links: Option<String>,

        /// Folder holding the images to search
        #[arg(long)]
        input: Option<PathBuf>,

        /// Folder receiving the results
        #[arg(long)]
        output: Option<PathBuf>,

        /// Worker threads for parallel runs (0 = physical cores)
        #[arg(long)]
        workers: Option<usize>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbosity level
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },

    /// Move the files of single-file result folders into the no-match folder
    Extract {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run the offline self-test
    SelfTest,

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "reverse-scraper.json")]
        path: PathBuf,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    Ok(config)
}

/// Log to a file so the progress bar stays readable; fall back to stderr.
fn init_logging(config: &Config) {
    let level: LevelFilter = config.log_level.into();
    if let Err(e) = logging::init_logger(&config.log_dir, level) {
        env_logger::Builder::new().filter_level(level).init();
        log::warn!("File logging unavailable, using stderr: {}", e);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            single,
            links,
            input,
            output,
            workers,
            config,
            verbose,
        } => {
            let mut config = load_config(config)?;

            // Override config with command line arguments
            if let Some(input) = input {
                config.input_dir = input;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            config.log_level = match verbose {
                0 => config.log_level,
                1 => LogLevel::Debug,
                _ => LogLevel::Trace,
            };

            init_logging(&config);
            let scraper = ReverseScraper::new(config)?;
            let pending = scraper.pending_images()?;
            info!("{} images waiting in the input folder", pending.len());

            let links = match links {
                Some(raw) => scraper.config().links.resolve(Some(raw.as_str()))?,
                None => prompt::ask_link_count_stdin(&scraper.config().links)?,
            };
            let mode = if single {
                RunMode::Single
            } else {
                RunMode::Parallel
            };

            info!("Starting search with {} links per image", links);
            let summary = scraper.run(mode, links)?;

            println!(
                "{} {}",
                style("Done.").green().bold(),
                style(&summary).white()
            );
            println!("Total elapsed time: {}", summary.elapsed_display());
            Ok(())
        }

        Commands::Extract { config } => {
            let config = load_config(config)?;
            init_logging(&config);
            let scraper = ReverseScraper::new(config)?;

            let moved = scraper.extract()?;
            println!("{} {} files extracted", style("Done.").green().bold(), moved);
            Ok(())
        }

        Commands::SelfTest => {
            env_logger::init();
            let report = selftest::run()?;
            print!("{}", report);
            if report.passed() {
                println!("{}", style("All checks passed").green());
                Ok(())
            } else {
                anyhow::bail!("self-test failed")
            }
        }

        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
