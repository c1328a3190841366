use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::core::input::KeyRepeat;
use crate::core::synth::SynthConfig;

const APP_DIR: &str = "virtual-piano";
const SETTINGS_FILE: &str = "settings.json";

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Name of the preset `synth` was last taken from.
    pub preset: String,
    pub synth: SynthConfig,
    pub key_repeat: KeyRepeat,
    /// Grants the hardware MIDI permission.
    pub midi_enabled: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            preset: "classic".to_string(),
            synth: SynthConfig::classic(),
            key_repeat: KeyRepeat::PassThrough,
            midi_enabled: true,
        }
    }
}

impl AppSettings {
    /// Loads the settings file, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load() -> Self {
        let path = match settings_dir() {
            Ok(dir) => dir.join(SETTINGS_FILE),
            Err(err) => {
                log::warn!("{:#}, using default settings", err);
                return Self::default();
            }
        };

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("{:#}, using default settings", err);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let dir = settings_dir()?;
        self.save_to(&dir.join(SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(path)
            .with_context(|| format!("Failed to open settings {}", path.display()))?;
        let settings = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse settings {}", path.display()))?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to write settings {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

pub fn settings_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
    path.push(APP_DIR);
    Ok(path)
}

pub fn presets_dir() -> Result<PathBuf> {
    let mut path = settings_dir()?;
    path.push("presets");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "virtual-piano-settings-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir.join(SETTINGS_FILE)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = scratch_file("missing");
        assert_eq!(AppSettings::load_from(&path).unwrap(), AppSettings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let path = scratch_file("roundtrip");
        let settings = AppSettings {
            preset: "echo".into(),
            synth: SynthConfig::echo(),
            key_repeat: KeyRepeat::Suppress,
            midi_enabled: false,
        };

        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap(), settings);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let path = scratch_file("partial");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "key_repeat": "Suppress" }"#).unwrap();

        let settings = AppSettings::load_from(&path).unwrap();
        assert_eq!(settings.key_repeat, KeyRepeat::Suppress);
        assert_eq!(settings.synth, SynthConfig::classic());
        assert!(settings.midi_enabled);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_files_are_errors() {
        let path = scratch_file("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        assert!(AppSettings::load_from(&path).is_err());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn presets_live_under_the_settings_dir() {
        if let (Ok(settings), Ok(presets)) = (settings_dir(), presets_dir()) {
            assert!(settings.ends_with(APP_DIR));
            assert_eq!(presets.parent(), Some(settings.as_path()));
        }
    }
}
