use std::path::{Path, PathBuf};

use recur_domain::CatchUpPolicy;
use serde::{Deserialize, Serialize};

/// Runtime settings for sweeps, storage and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `ledger.json` and its backups. Defaults to `<base>/data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub catch_up: CatchUpPolicy,
    #[serde(default = "Config::default_max_catch_up_periods")]
    pub max_catch_up_periods: u32,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    /// Write a ledger backup before each sweep.
    #[serde(default = "Config::default_backup_before_sweep")]
    pub backup_before_sweep: bool,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            catch_up: CatchUpPolicy::default(),
            max_catch_up_periods: Self::default_max_catch_up_periods(),
            backup_retention: Self::default_backup_retention(),
            backup_before_sweep: Self::default_backup_before_sweep(),
            log_filter: None,
            ui_color_enabled: Self::default_ui_color_enabled(),
        }
    }
}

impl Config {
    pub fn default_max_catch_up_periods() -> u32 {
        366
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_backup_before_sweep() -> bool {
        true
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        match &self.data_dir {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => base.join("data"),
        }
    }
}
