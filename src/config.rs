use config::{self, File};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TskError};

/// One managed process entry, as written in the configuration file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessSpec {
    /// Display label shown in the menu; duplicates are allowed
    pub name: String,
    /// Command line to execute. The string is split with shell-style
    /// quoting rules and the first word is run directly with the rest as
    /// arguments; no shell is involved.
    pub cmd: String,
    /// Working directory for the process; defaults to tsk's own working
    /// directory when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

/// Top-level tsk configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TskConfig {
    /// Directory that receives per-process log files
    #[serde(default = "default_log_dir")]
    pub logs: String,

    /// Number of historical log files kept per process name
    #[serde(rename = "log-archive", default = "default_log_archive")]
    pub log_archive: usize,

    /// Logging level for tsk itself
    #[serde(rename = "log-level", default)]
    pub log_level: LogLevel,

    /// Processes available in the menu, in display order
    #[serde(default)]
    pub processes: Vec<ProcessSpec>,
}

fn default_log_dir() -> String {
    "~/.tsk.log".to_string()
}

fn default_log_archive() -> usize {
    5
}

/// Logging level
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// Load tsk configuration from a file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TskConfig> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());

    if !path.exists() {
        error!("Configuration file {} does not exist", path.display());
        return Err(TskError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        ))
        .into());
    }

    let extension = match path.extension() {
        Some(ext) => ext.to_string_lossy().to_lowercase(),
        None => {
            return Err(TskError::Config(format!(
                "Configuration file has no extension: {}",
                path.display()
            ))
            .into());
        }
    };

    let format = match extension.as_str() {
        "json" => config::FileFormat::Json,
        "toml" => config::FileFormat::Toml,
        "yaml" | "yml" => config::FileFormat::Yaml,
        format => {
            return Err(
                TskError::Config(format!("Unsupported config format: {}", format)).into(),
            );
        }
    };

    let settings = config::Config::builder()
        .add_source(File::from(path).format(format))
        .build()
        .map_err(|e| TskError::Config(e.to_string()))?;

    let mut cfg: TskConfig = settings
        .try_deserialize()
        .map_err(|e| TskError::Config(e.to_string()))?;

    if cfg.log_archive == 0 {
        warn!("log-archive must be at least 1, clamping");
        cfg.log_archive = 1;
    }

    cfg.logs = expand_user(&cfg.logs).to_string_lossy().into_owned();
    for spec in &mut cfg.processes {
        if let Some(cwd) = &spec.cwd {
            spec.cwd = Some(expand_user(cwd).to_string_lossy().into_owned());
        }
    }

    Ok(cfg)
}

/// Load a configuration file, writing a starter one first if none exists
pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<TskConfig> {
    let path = path.as_ref();
    if !path.exists() {
        create_starter_config(path)?;
        info!("Wrote starter configuration to {}", path.display());
    }
    load_config(path)
}

/// Write a starter configuration with a couple of example entries
pub fn create_starter_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                TskError::Config(format!(
                    "Could not create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let editor = if cfg!(target_os = "windows") {
        "notepad.exe"
    } else if cfg!(target_os = "macos") {
        "open -W -a TextEdit"
    } else {
        "gedit"
    };
    let listing = if cfg!(target_os = "windows") {
        "cmd /c dir"
    } else {
        "ls -l"
    };

    let starter = TskConfig {
        logs: default_log_dir(),
        log_archive: default_log_archive(),
        log_level: LogLevel::default(),
        processes: vec![
            ProcessSpec {
                name: "Text Editor".to_string(),
                cmd: editor.to_string(),
                cwd: None,
            },
            ProcessSpec {
                name: "List Home Directory".to_string(),
                cmd: listing.to_string(),
                cwd: Some("~".to_string()),
            },
        ],
    };

    let rendered = serde_json::to_string_pretty(&starter)
        .map_err(|e| TskError::Config(format!("Could not render starter config: {}", e)))?;
    fs::write(path, rendered).map_err(|e| {
        TskError::Config(format!(
            "Could not write starter config {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Default location of the configuration file (`~/.tsk.json`)
pub fn default_config_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".tsk.json"),
        None => PathBuf::from(".tsk.json"),
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_user<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Expand the configured log directory and make sure it exists
pub fn prepare_log_dir(cfg: &TskConfig) -> Result<PathBuf> {
    let dir = PathBuf::from(&cfg.logs);
    fs::create_dir_all(&dir).map_err(|e| {
        TskError::Config(format!(
            "Could not create log directory {}: {}",
            dir.display(),
            e
        ))
    })?;
    Ok(dir)
}
