// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf, str::FromStr};

use davsync_core::{RecordType, SyncConfig};
use davsync_dav::DavConfig;
use tokio::fs;

use crate::cli::APP_NAME;

const DAVSYNC_CONFIG_ENV: &str = "DAVSYNC_CONFIG";

const DATABASE_FILE: &str = "davsync.db";

#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<Config, Box<dyn Error>> {
    let path = if let Some(path) = path {
        path
    } else if let Ok(env_path) = std::env::var(DAVSYNC_CONFIG_ENV) {
        PathBuf::from(env_path)
    } else {
        let config = get_config_dir()?.join(format!("{APP_NAME}/config.toml"));
        if !config.exists() {
            return Err(format!("No config found at: {}", config.display()).into());
        }
        config
    };

    fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {}", path.display(), e))?
        .parse()
}

/// Configuration for the davsync application.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// The server all collections live on.
    pub server: DavConfig,

    /// Options shared by every run.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Where the local database lives. Defaults to `$XDG_STATE_HOME/davsync`.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Collections to synchronize.
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

/// A collection to synchronize.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CollectionConfig {
    /// Account name; runs of the same account and href never overlap.
    pub account: String,

    /// Collection href on the server.
    pub href: String,

    /// What the collection holds.
    pub kind: RecordType,
}

impl Config {
    /// Path of the local database, with `~/` expanded.
    pub fn database_path(&self) -> Result<PathBuf, Box<dyn Error>> {
        let dir = match &self.state_dir {
            Some(dir) => expand_path(dir),
            None => get_state_dir()?.join(APP_NAME),
        };
        Ok(dir.join(DATABASE_FILE))
    }
}

impl FromStr for Config {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

fn expand_path(path: &std::path::Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }

        tracing::warn!("home directory not found");
    }

    path.to_path_buf()
}

fn get_config_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(not(unix))]
    let config_dir = dirs::config_dir();
    config_dir.ok_or_else(|| "User-specific config directory not found".into())
}

fn get_state_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(not(unix))]
    let state_dir = dirs::data_local_dir();
    state_dir.ok_or_else(|| "User-specific state directory not found".into())
}
