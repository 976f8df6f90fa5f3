mod commands;
mod config;
mod render;
mod store;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::GlobalConfig;
use orbit_core::date_range::DateRange;

#[derive(Parser)]
#[command(name = "orbit")]
#[command(about = "Replay orbit event logs into entity state and reconcile them with external calendars")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fold the event log into current entity state
    Snapshot {
        /// Event log file (defaults to log_path from config)
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show every event addressing one entity, then its folded state
    History {
        /// Entity id to trace
        entity_id: String,

        /// Event log file (defaults to log_path from config)
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Print events and state as JSON
        #[arg(long)]
        json: bool,
    },
    /// List calendar occurrences in a window, expanding recurrences
    Occurrences {
        /// Event log file (defaults to log_path from config)
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Window start (YYYY-MM-DD, or "start" for all past occurrences)
        #[arg(long)]
        from: Option<String>,

        /// Window end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Diff internal state against an external calendar dump
    Reconcile {
        /// External snapshot dump (JSON array of provider events)
        #[arg(short, long)]
        external: PathBuf,

        /// Event log file (defaults to log_path from config)
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Extra links file (JSON map of externalEventId to calendarEventId)
        #[arg(long)]
        links: Option<PathBuf>,

        /// Device id stamped onto emitted events (defaults to config)
        #[arg(long)]
        device: Option<String>,

        /// Print emitted events and import candidates as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Snapshot { log, json } => {
            let log_path = resolve_log(log)?;
            commands::snapshot::run(&log_path, json)
        }
        Commands::History {
            entity_id,
            log,
            json,
        } => {
            let log_path = resolve_log(log)?;
            commands::history::run(&log_path, &entity_id, json)
        }
        Commands::Occurrences { log, from, to } => {
            let log_path = resolve_log(log)?;
            let range = DateRange::from_args(from.as_deref(), to.as_deref())?;
            commands::occurrences::run(&log_path, range)
        }
        Commands::Reconcile {
            external,
            log,
            links,
            device,
            json,
        } => {
            let log_path = resolve_log(log)?;
            let device_id = match device {
                Some(device) => device,
                None => GlobalConfig::load()?.device_id().to_string(),
            };
            commands::reconcile::run(&log_path, &external, links.as_deref(), &device_id, json)
        }
    }
}

fn resolve_log(log: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = log {
        return Ok(path);
    }

    let config = GlobalConfig::load()?;
    match config.log_path {
        Some(path) => Ok(path),
        None => anyhow::bail!(
            "No event log given.\n\n\
            Pass one with:\n  \
            orbit snapshot --log events.json\n\n\
            or set log_path in {}",
            GlobalConfig::config_path()?.display()
        ),
    }
}
