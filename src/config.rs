use std::path::{Path, PathBuf};

use directories::{BaseDirs, UserDirs};

use crate::extractor::client::DEFAULT_PROGRAM;
use crate::utils::split_command;

pub const EXTRACTOR_ENV: &str = "SVD_YTDLP";
pub const DOWNLOAD_DIR_ENV: &str = "SVD_DOWNLOAD_DIR";
pub const LOG_FILTER_ENV: &str = "RUST_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

/// Startup configuration, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Program and leading arguments used to run the extractor
    pub extractor_command: Vec<String>,
    pub download_dir: PathBuf,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extractor_command: vec![DEFAULT_PROGRAM.to_string()],
            download_dir: default_download_dir(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; blank values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            extractor_command: value(EXTRACTOR_ENV)
                .map(|cmd| split_command(&cmd))
                .unwrap_or(defaults.extractor_command),
            download_dir: value(DOWNLOAD_DIR_ENV)
                .map(|dir| PathBuf::from(dir.trim()))
                .unwrap_or(defaults.download_dir),
            log_filter: value(LOG_FILTER_ENV).unwrap_or(defaults.log_filter),
        }
    }
}

/// The platform download folder, falling back to `<home>/Downloads`
pub fn default_download_dir() -> PathBuf {
    if let Some(dir) = UserDirs::new().and_then(|dirs| dirs.download_dir().map(Path::to_path_buf)) {
        return dir;
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}
