//! Configuration for the `microc` driver: default output directory and
//! target triple, loaded from a `microc.toml` found by searching upward
//! from the invocation's usual places.

use crate::error::{DrvError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "microc.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Default directory assembly output is written to when `--emit-asm`
    /// is not given.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Target triple string, threaded through to the emitted assembly's
    /// header comment only — no target-specific codegen is driven by it.
    #[serde(default = "default_target")]
    pub target: String,
}

fn default_output_dir() -> String {
    "out".to_string()
}

fn default_target() -> String {
    std::env::var("TARGET").unwrap_or_else(|_| "x86_64-unknown-linux-gnu".to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            target: default_target(),
        }
    }
}

impl Config {
    /// Searches, in order: the current directory, `$HOME/.config/microc/`,
    /// then the system config directory. Falls back to defaults if none
    /// carry a `microc.toml`.
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(DrvError::ConfigSerialize)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn find_config_file() -> Option<PathBuf> {
        let cwd = PathBuf::from(CONFIG_FILE_NAME);
        if cwd.exists() {
            return Some(cwd);
        }
        let home = dirs::home_dir()
            .map(|d| d.join(".config").join("microc").join(CONFIG_FILE_NAME))
            .filter(|p| p.exists());
        if home.is_some() {
            return home;
        }
        dirs::config_dir()
            .map(|d| d.join("microc").join(CONFIG_FILE_NAME))
            .filter(|p| p.exists())
    }
}
