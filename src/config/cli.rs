use super::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "session-checkin")]
#[command(about = "Event attendance and session registration backed by CSV sheets")]
pub struct CliConfig {
    /// Path to TOML configuration file (optional, defaults apply when missing)
    #[arg(short, long, default_value = "checkin.toml")]
    pub config: String,

    /// Override the directory holding the sheet files
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Override the year sessions are scheduled in
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON log lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Register an attendee into a session
    Register {
        #[arg(long)]
        dni: String,
        #[arg(long)]
        session: String,
        /// ISO-8601 timestamp to record (defaults to now)
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Record general attendance for today
    General {
        #[arg(long)]
        dni: String,
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// List sessions
    Sessions,
    /// Show seats taken and available per session
    Capacity,
    /// Show an attendee's attendance
    Lookup {
        #[arg(long)]
        dni: String,
    },
    /// Export every attendee's attendance as CSV
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
}

impl CliConfig {
    /// Loads the TOML file when present and applies command line overrides.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = if Path::new(&self.config).exists() {
            TomlConfig::from_file(&self.config)?
        } else {
            tracing::debug!("No config file at {}, using defaults", self.config);
            TomlConfig::default()
        };

        if let Some(data_dir) = &self.data_dir {
            config.store.data_dir = data_dir.clone();
        }
        if let Some(year) = self.year {
            config.event.year = year;
        }
        if self.json_logs {
            config.logging.json = true;
        }
        Ok(config)
    }
}
