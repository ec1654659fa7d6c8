use std::path::{Path, PathBuf};

use clap::Subcommand;
use dosewindow_core::DoseWindowConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show {
        /// Optional TOML config override
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Validate a TOML config file
    Validate {
        #[arg(long)]
        file: PathBuf,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show { file } => {
            let config = load_config(file.as_deref())?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Validate { file } => {
            load_config(Some(&file))?;
            println!("ok");
            Ok(())
        }
    }
}

/// Load a validated window config: TOML file if given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<DoseWindowConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => DoseWindowConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
