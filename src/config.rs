//! User configuration loaded from `~/.melodizer/config.yaml`.
//!
//! Every section is optional. A missing file means defaults; patches pass
//! through [`Patch::validated`] before they reach the synth.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::generator::{GenerationSettings, GeneratorTuning};
use crate::midi::MidiOutputConfig;
use crate::synth::{Patch, PatchBank, PatchError, PatchType};
use crate::theory::{TablesError, TheoryTables};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{patch} patch: {source}")]
    Patch {
        patch: PatchType,
        #[source]
        source: PatchError,
    },
    #[error("theory tables: {0}")]
    Tables(#[from] TablesError),
    #[error("no home directory")]
    NoHome,
}

/// Stored patches. Absent entries use the built-in defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    pub melody: Option<Patch>,
    pub bass: Option<Patch>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for generation; command-line flags override them.
    pub settings: GenerationSettings,
    pub tuning: GeneratorTuning,
    pub patches: PatchConfig,
    pub midi: MidiOutputConfig,
    /// YAML file replacing the built-in theory tables.
    pub tables: Option<PathBuf>,
}

impl Config {
    /// `~/.melodizer/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::home_dir()?.join(".melodizer").join("config.yaml"))
    }

    /// Load from the standard path. Returns None if there is no file or it
    /// does not parse.
    pub fn load() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            debug!(path = %path.display(), "no config file");
            return None;
        }
        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring config file");
                None
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Write to the standard path, creating `~/.melodizer` if needed.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoHome)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Patches for the synth, clamped into range. Clamped fields are logged.
    pub fn patch_bank(&self) -> Result<PatchBank, ConfigError> {
        let mut bank = PatchBank::default();
        for (patch_type, stored) in [
            (PatchType::Melody, &self.patches.melody),
            (PatchType::Bass, &self.patches.bass),
        ] {
            let Some(patch) = stored.clone() else {
                continue;
            };
            let (patch, changed) = patch
                .validated()
                .map_err(|source| ConfigError::Patch { patch: patch_type, source })?;
            if !changed.is_empty() {
                warn!(patch = %patch_type, fields = ?changed, "clamped out-of-range patch values");
            }
            *bank.get_mut(patch_type) = patch;
        }
        Ok(bank)
    }

    /// The configured tables file, or the built-in tables.
    pub fn theory_tables(&self) -> Result<TheoryTables, ConfigError> {
        match &self.tables {
            Some(path) => Ok(TheoryTables::load(path)?),
            None => Ok(TheoryTables::default()),
        }
    }
}
