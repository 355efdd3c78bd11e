pub mod anim;
pub mod auction;
pub mod config;
pub mod curve;
pub mod format;
pub mod geometry;
pub mod scale;
pub mod scene;
pub mod settlement;
pub mod tooltip;
pub mod visualizer;

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

pub use auction::{AuctionParameters, Bid, PriceFeed};
pub use config::theme::Rgb;
pub use config::{ConfigError, UserTimezone, VisualizerConfig};
pub use scene::Scene;
pub use visualizer::{Phase, SceneFrame, Visualizer};

use ::log::{info, warn};

pub const CONFIG_PATH: &str = "config.json";
pub const DATA_PATH_ENV: &str = "AUCTION_VISUALIZER_DATA_PATH";

pub fn write_json_to_file(json: &str, file_name: &str) -> std::io::Result<()> {
    let path = data_path(Some(file_name));

    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid config file path")
    })?;

    if !parent.exists() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// Reads and validates the visualizer config stored under the data path.
///
/// A file that fails to parse is moved aside to `<name>_old.<ext>` so the next
/// start does not trip over it again.
pub fn load_config(file_name: &str) -> Result<VisualizerConfig, ConfigError> {
    let path = data_path(Some(file_name));

    let mut contents = String::new();
    {
        let mut file = File::open(&path)?;
        file.read_to_string(&mut contents)?;
    }

    match serde_json::from_str::<VisualizerConfig>(&contents) {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(e) => {
            let backup_path = data_path(Some(&backup_file_name(file_name)));

            if let Err(rename_err) = std::fs::rename(&path, &backup_path) {
                warn!(
                    "Failed to backup corrupted config file '{}' to '{}': {}",
                    path.display(),
                    backup_path.display(),
                    rename_err
                );
            } else {
                info!(
                    "Backed up corrupted config file to '{}'. It can be restored manually.",
                    backup_path.display()
                );
            }

            Err(ConfigError::Parse(e))
        }
    }
}

pub fn save_config(config: &VisualizerConfig, file_name: &str) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(config)?;
    write_json_to_file(&json, file_name)?;
    Ok(())
}

fn backup_file_name(file_name: &str) -> String {
    if let Some(pos) = file_name.rfind('.') {
        format!("{}_old{}", &file_name[..pos], &file_name[pos..])
    } else {
        format!("{}_old", file_name)
    }
}

pub fn data_path(path_name: Option<&str>) -> PathBuf {
    let data_dir = if let Ok(path) = std::env::var(DATA_PATH_ENV) {
        PathBuf::from(path)
    } else {
        dirs_next::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("auction-visualizer")
    };

    match path_name {
        Some(path_name) => data_dir.join(path_name),
        None => data_dir,
    }
}
