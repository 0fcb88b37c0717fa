use anyhow::Result;
use clap::{Parser, Subcommand};
use daytally::OutputFormat;
use daytally::commands;
use daytally::config;
use daytally::utils::clock::SystemClock;
use daytally::utils::logging::enable_logging;

#[derive(Parser)]
#[command(name = "daytally")]
#[command(about = "Stopwatch with a history of daily time totals")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start or resume the timer in the foreground
    Start {
        #[arg(long, help = "Pause automatically after this many ticks")]
        ticks: Option<u64>,
    },
    /// Pause the running timer
    Pause,
    /// Pause the timer and decide whether to save its progress
    Reset,
    /// Save the active timer into the history
    Save,
    /// Discard the active timer
    Dismiss,
    /// Keep the active timer and close the pending decision
    Cancel,
    /// Show the active timer
    Status {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show saved daily totals, newest first
    History {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        #[arg(long, help = "Show at most this many days")]
        limit: Option<usize>,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    List,
    Set { key: String, value: String },
    Get { key: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = match config::load() {
        Ok(config) => (config, None),
        Err(e) => (config::Config::default(), Some(e)),
    };
    enable_logging(&config.logging.level)?;
    if let Some(e) = config_error {
        tracing::warn!("ignoring unreadable config, using defaults: {e:#}");
    }
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }

    match &cli.command {
        Commands::Start { ticks } => {
            tokio::runtime::Runtime::new()?.block_on(commands::timer::start(
                &config,
                &SystemClock,
                *ticks,
            ))?;
        }
        Commands::Pause => {
            commands::timer::pause(&config)?;
        }
        Commands::Reset => {
            commands::timer::reset(&config)?;
        }
        Commands::Save => {
            commands::timer::save(&config)?;
        }
        Commands::Dismiss => {
            commands::timer::dismiss(&config)?;
        }
        Commands::Cancel => {
            commands::timer::cancel(&config)?;
        }
        Commands::Status { format } => {
            commands::timer::status(&config, *format)?;
        }
        Commands::History { format, limit } => {
            commands::history::list(&config, *format, *limit)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::List => commands::config::list(&config)?,
            ConfigAction::Set { key, value } => commands::config::set(key, value, &config)?,
            ConfigAction::Get { key } => commands::config::get(key, &config)?,
        },
    }

    Ok(())
}
