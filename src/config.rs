//! Persisted library settings.
//!
//! Stored as a JSON object; unknown keys are ignored and missing keys are
//! left unset, so files written by older versions keep loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Emulator locations the library scans.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// PPSSPP installation directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppsspp_path: Option<PathBuf>,
    /// PPSSPP `PSP/SAVEDATA` directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savedata_dir: Option<PathBuf>,
    /// PPSSPP `PSP/PPSSPP_STATE` directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savestate_dir: Option<PathBuf>,
    /// Snes9x installation directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snes9x_path: Option<PathBuf>,
    /// Snes9x SRAM and snapshot directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snes9x_save_dir: Option<PathBuf>,
}

impl LibraryConfig {
    /// Load from `path`. A missing file is the default config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }

    /// Write to `path` as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        tracing::info!(path = %path.display(), "saved config");
        Ok(())
    }
}
