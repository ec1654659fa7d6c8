use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use dosewindow_core::{evaluate, should_auto_expire, SessionInputs};
use serde_json::json;

use super::config::load_config;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Evaluate the dose window and print the context as JSON
    Status {
        /// Session JSON file (persisted SessionInputs)
        #[arg(long)]
        file: PathBuf,
        /// Optional TOML config override
        #[arg(long)]
        config: Option<PathBuf>,
        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<String>,
    },
    /// Print the window boundary instants for a session
    Boundaries {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check whether a background sweep should expire the session
    ExpireCheck {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        at: Option<String>,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Status { file, config, at } => {
            let inputs = load_inputs(&file)?;
            let config = load_config(config.as_deref())?;
            let now = parse_at(at.as_deref())?;
            let context = evaluate(now, &inputs, &config);
            println!("{}", serde_json::to_string_pretty(&context)?);
            Ok(())
        }
        SessionAction::Boundaries { file, config } => {
            let inputs = load_inputs(&file)?;
            let config = load_config(config.as_deref())?;
            let dose1_at = inputs
                .dose1_at
                .ok_or("session has no dose1_at; boundaries are undefined")?;
            let minutes = |m: u32| Duration::minutes(m as i64);
            let report = json!({
                "dose1_at": dose1_at,
                "window_opens_at": dose1_at + minutes(config.min_interval_minutes),
                "default_target_at": dose1_at + minutes(config.default_target_minutes),
                "near_close_at": dose1_at
                    + minutes(config.max_interval_minutes - config.near_window_threshold_minutes),
                "window_closes_at": dose1_at + minutes(config.max_interval_minutes),
                "auto_expire_at": dose1_at
                    + minutes(config.max_interval_minutes + config.auto_expire_grace_minutes),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        SessionAction::ExpireCheck { file, config, at } => {
            let inputs = load_inputs(&file)?;
            let config = load_config(config.as_deref())?;
            let now = parse_at(at.as_deref())?;
            let stale = should_auto_expire(now, &inputs, &config);
            println!("{}", json!({ "should_auto_expire": stale }));
            Ok(())
        }
    }
}

fn load_inputs(path: &Path) -> Result<SessionInputs, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn parse_at(at: Option<&str>) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    match at {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}
