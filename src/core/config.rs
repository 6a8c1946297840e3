use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Media presentation preference. The tagger defaults to audio-only so long
/// recordings can be annotated without rendering video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MediaMode {
    #[default]
    Audio,
    Video,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub media_mode: MediaMode,
    /// Whether the media-mode switch is shown. A plain preference, not an
    /// access control.
    #[serde(default)]
    pub media_mode_switch_enabled: bool,
    #[serde(default)]
    pub preset_labels_path: Option<PathBuf>,
    #[serde(default)]
    pub last_media_directory: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            media_mode: MediaMode::Audio,
            media_mode_switch_enabled: false,
            preset_labels_path: None,
            last_media_directory: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|e| {
                anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e)
            })?;

            // If the file is from an older version and misses fields, rewrite
            // it with defaults rather than failing startup.
            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config)
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), creating new one with defaults", e);
                    let new_config = Self::default();
                    new_config.save()?;
                    log::info!("Created new config file at {}", config_path.display());
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("media-tagger")
            .join("config.json")
    }

    /// Reads the preset label catalogue, one label per line.
    pub fn load_preset_labels(&self) -> Vec<String> {
        let Some(path) = &self.preset_labels_path else {
            return Vec::new();
        };
        match std::fs::read_to_string(path) {
            Ok(content) => parse_preset_labels(&content),
            Err(e) => {
                log::error!("Unable to load preset labels from {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

pub fn parse_preset_labels(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
