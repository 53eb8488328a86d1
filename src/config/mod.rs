use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-user directory holding config, history and logs
const APP_DIR: &str = ".nlcmd";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub keybindings: KeyBindings,
}

/// Which endpoint family the backend exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Linux,
    #[serde(alias = "pwsh")]
    PowerShell,
}

impl Variant {
    #[must_use]
    pub fn translate_path(self) -> &'static str {
        match self {
            Self::Linux => "/translate",
            Self::PowerShell => "/translate_powershell",
        }
    }

    #[must_use]
    pub fn execute_path(self) -> &'static str {
        match self {
            Self::Linux => "/execute",
            Self::PowerShell => "/execute_powershell",
        }
    }

    /// Namespaced history file name, one per variant
    #[must_use]
    pub fn history_file_name(self) -> &'static str {
        match self {
            Self::Linux => "linux_command_history.json",
            Self::PowerShell => "powershell_command_history.json",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::PowerShell => "PowerShell",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the translator service, without a trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub variant: Variant,

    /// Per-request timeout; a hung backend must not leave the UI busy forever
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of entries kept (oldest evicted first)
    #[serde(default = "default_history_limit")]
    pub limit: usize,

    /// Persist history to disk across runs
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Override for the history file location
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Re-submit the query immediately when an entry is reused
    #[serde(default)]
    pub resubmit_on_reuse: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionConfig {
    /// Pre-filled value of the working directory prompt
    #[serde(default)]
    pub default_working_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_footer")]
    pub footer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub execute: String,
    pub copy: String,
    pub favorite: String,
    pub toggle_history: String,
    pub clear_history: String,
    pub clear: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_history_limit() -> usize {
    50
}

fn default_true() -> bool {
    true
}

fn default_footer() -> String {
    "nlcmd - natural language command translator".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            variant: Variant::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
            persist: true,
            file: None,
            resubmit_on_reuse: false,
        }
    }
}

impl HistoryConfig {
    /// In-memory history of ten entries, matching the minimal page
    #[must_use]
    pub fn simple() -> Self {
        Self {
            limit: 10,
            persist: false,
            file: None,
            resubmit_on_reuse: false,
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            footer: default_footer(),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            execute: "Ctrl+E".to_string(),
            copy: "Ctrl+Y".to_string(),
            favorite: "Ctrl+S".to_string(),
            toggle_history: "Ctrl+R".to_string(),
            clear_history: "Ctrl+Shift+X".to_string(),
            clear: "Ctrl+L".to_string(),
        }
    }
}

impl ExecutionConfig {
    /// Example path offered in the working directory prompt
    #[must_use]
    pub fn working_dir_for(&self, variant: Variant) -> String {
        if let Some(dir) = &self.default_working_dir {
            return dir.clone();
        }
        match variant {
            Variant::PowerShell => r"C:\Users\Administrator\Documents".to_string(),
            Variant::Linux => dirs::home_dir()
                .map_or_else(|| "/tmp".to_string(), |p| p.display().to_string()),
        }
    }
}

impl Config {
    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_yaml::to_string(self).context("Failed to serialize config")?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        fs::write(path.as_ref(), contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get default configuration path
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.yaml"))
    }

    /// Per-user application directory
    pub fn app_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;

        Ok(home.join(APP_DIR))
    }

    /// Where history is persisted, or `None` when persistence is off
    #[must_use]
    pub fn history_path(&self) -> Option<PathBuf> {
        if !self.history.persist {
            return None;
        }
        if let Some(file) = &self.history.file {
            return Some(file.clone());
        }
        Self::app_dir()
            .ok()
            .map(|dir| dir.join(self.backend.variant.history_file_name()))
    }
}
