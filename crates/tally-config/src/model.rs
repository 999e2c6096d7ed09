use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tally_domain::DepreciationRule;

/// Environment variable that overrides the default data root.
pub const DATA_ROOT_ENV: &str = "TALLY_HOME";

/// Size at which the log file is rotated.
pub const DEFAULT_LOG_FILE_MAX_BYTES: u64 = 5 * 1024 * 1024;

const DEFAULT_DIR_NAME: &str = ".tally";

/// Backend settings. Every field has a default, so a partial file loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root for `registry.json` and `companies/`. Defaults to `$TALLY_HOME`
    /// or `~/.tally`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
    #[serde(default)]
    pub depreciation_rule: DepreciationRule,
    #[serde(default)]
    pub reject_two_sided_lines: bool,
    #[serde(default = "Config::default_carry_forward_description")]
    pub carry_forward_description: String,
    #[serde(default)]
    pub roll_profit_into_carry_forward: bool,
    /// `tracing` filter directive, e.g. `ledger_core=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    /// Also write logs to this file, rotated once it reaches
    /// `log_file_max_bytes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default = "Config::default_log_file_max_bytes")]
    pub log_file_max_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: None,
            depreciation_rule: DepreciationRule::default(),
            reject_two_sided_lines: false,
            carry_forward_description: Self::default_carry_forward_description(),
            roll_profit_into_carry_forward: false,
            log_filter: None,
            log_file: None,
            log_file_max_bytes: DEFAULT_LOG_FILE_MAX_BYTES,
        }
    }
}

impl Config {
    pub fn default_carry_forward_description() -> String {
        "Balance brought forward".into()
    }

    pub fn default_log_file_max_bytes() -> u64 {
        DEFAULT_LOG_FILE_MAX_BYTES
    }

    pub fn with_data_root(root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: Some(root.into()),
            ..Self::default()
        }
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        let from_env = std::env::var_os(DATA_ROOT_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        self.resolve_data_root_with(from_env)
    }

    /// Explicit setting, then the environment override, then the home directory.
    pub fn resolve_data_root_with(&self, env_override: Option<PathBuf>) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }
        if let Some(path) = env_override {
            return path;
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }
}
