use carwatch::error::{ErrorKind, Result};
use carwatch::{CycleReport, Monitor, commands, logging};
use carwatch_config::Config;
use carwatch_store::JsonStore;
use clap::{ArgAction, Parser, Subcommand};
use exn::{OptionExt, ResultExt};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "carwatch", version, about = "Watch a used-car search for new listings")]
struct Cli {
    /// Configuration file (JSON). Defaults to the platform config directory.
    #[arg(short, long, global = true, env = "CARWATCH_CONFIG")]
    config: Option<PathBuf>,
    /// More logging; repeat for more.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Less logging; repeat for less.
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "verbose")]
    quiet: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single check and exit.
    Check {
        /// Fetch and print matches without notifying or saving.
        #[arg(long)]
        dry_run: bool,
        /// Use a named search from `presets` instead of `search`.
        #[arg(long)]
        preset: Option<String>,
    },
    /// Check continuously on the configured schedule.
    Daemon,
    /// Print the effective configuration.
    Config {
        /// Write the default configuration file instead.
        #[arg(long)]
        init: bool,
    },
    /// Show the listings already reported.
    Status,
    /// Parse a saved search page and show what the monitor would see.
    Inspect {
        file: PathBuf,
        /// Use a named search from `presets` instead of `search`.
        #[arg(long)]
        preset: Option<String>,
    },
    /// Forget every reported listing.
    Reset,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if let Command::Config { init: true } = cli.command {
        let path = match cli.config.clone() {
            Some(path) => path,
            None => Config::default_path().ok_or_raise(|| ErrorKind::Config)?,
        };
        Config::write_default(&path).or_raise(|| ErrorKind::Config)?;
        println!("{}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Command::Check { preset: Some(name), .. } | Command::Inspect { preset: Some(name), .. } = &cli.command {
        config = config.with_preset(name).or_raise(|| ErrorKind::Config)?;
    }
    let verbosity = i8::try_from(cli.verbose).unwrap_or(i8::MAX) - i8::try_from(cli.quiet).unwrap_or(i8::MAX);
    let _log_guard = logging::init(&config.log, verbosity)?;
    let store = JsonStore::from_config(&config.store);

    match cli.command {
        Command::Check { dry_run, .. } => {
            let mut monitor = Monitor::from_config(&config)?.with_dry_run(dry_run);
            match monitor.cycle().await {
                Ok(report) => {
                    if dry_run {
                        print_matches(&report);
                    }
                    Ok(ExitCode::SUCCESS)
                },
                Err(err) => {
                    tracing::error!(error = ?err, "Check failed");
                    Ok(ExitCode::FAILURE)
                },
            }
        },
        Command::Daemon => {
            Monitor::from_config(&config)?.run(false).await?;
            Ok(ExitCode::SUCCESS)
        },
        Command::Config { .. } => {
            print!("{}", config.to_json_pretty().or_raise(|| ErrorKind::Config)?);
            println!();
            Ok(ExitCode::SUCCESS)
        },
        Command::Status => {
            print!("{}", commands::status(&store).await);
            Ok(ExitCode::SUCCESS)
        },
        Command::Inspect { file, .. } => {
            print!("{}", commands::inspect(&file, &config.search, &store).await?);
            Ok(ExitCode::SUCCESS)
        },
        Command::Reset => {
            let removed = store.reset().await.or_raise(|| ErrorKind::Store)?;
            println!("Removed {removed} file(s); every listing will be reported again.");
            Ok(ExitCode::SUCCESS)
        },
    }
}

fn print_matches(report: &CycleReport) {
    println!("{} listing(s), {} new", report.listings.len(), report.new_count());
    for classified in &report.listings {
        let listing = &classified.listing;
        let marker = if classified.is_first_seen { "+" } else { " " };
        println!(
            "{marker} {}  {}  {}",
            listing.price,
            listing.year.as_deref().unwrap_or("-"),
            listing.name
        );
    }
}
