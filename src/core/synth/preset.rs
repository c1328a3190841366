use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::SynthConfig;

/// A named, user-saved synth configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthPreset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: u64,
    pub config: SynthConfig,
}

impl SynthPreset {
    pub fn new(name: impl Into<String>, config: SynthConfig) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            config,
        }
    }

    /// Save preset to `directory`, returning the file written.
    pub fn save_to_file(&self, directory: &Path) -> Result<PathBuf> {
        fs::create_dir_all(directory)
            .context("Failed to create preset directory")?;

        let file_path = directory.join(format!("{}.json", file_stem(&self.name)));
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize preset")?;
        fs::write(&file_path, json)
            .with_context(|| format!("Failed to write preset {}", file_path.display()))?;

        Ok(file_path)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preset {}", path.display()))?;
        let preset: Self = serde_json::from_str(&contents)
            .context("Failed to parse preset data")?;
        Ok(preset)
    }

    /// Loads every preset in `directory`, skipping files that fail to parse.
    pub fn load_all(directory: &Path) -> Result<Vec<Self>> {
        if !directory.exists() {
            return Ok(Vec::new());
        }

        let mut presets = Vec::new();
        for entry in fs::read_dir(directory)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(preset) => presets.push(preset),
                Err(err) => log::warn!("skipping preset {}: {:#}", path.display(), err),
            }
        }

        presets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(presets)
    }

    pub fn delete(name: &str, directory: &Path) -> Result<()> {
        let file_path = directory.join(format!("{}.json", file_stem(name)));
        if !file_path.exists() {
            anyhow::bail!("Preset '{}' does not exist", name);
        }
        fs::remove_file(file_path)?;
        Ok(())
    }
}

fn file_stem(name: &str) -> String {
    name.replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
