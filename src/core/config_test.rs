#[cfg(test)]
mod tests {

    use std::path::PathBuf;
    use crate::core::{parse_preset_labels, AppConfig, MediaMode};

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.media_mode, MediaMode::Audio);
        assert!(!config.media_mode_switch_enabled);
        assert!(config.preset_labels_path.is_none());
        assert!(config.last_media_directory.is_none());
    }

    #[test]
    fn test_app_config_serialization() {
        let mut config = AppConfig::default();
        config.media_mode = MediaMode::Video;
        config.media_mode_switch_enabled = true;
        config.preset_labels_path = Some(PathBuf::from("/test/path/preset_labels.txt"));

        let serialized = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: AppConfig = serde_json::from_str(&serialized).expect("Failed to deserialize config");

        assert_eq!(config.media_mode, deserialized.media_mode);
        assert_eq!(config.media_mode_switch_enabled, deserialized.media_mode_switch_enabled);
        assert_eq!(config.preset_labels_path, deserialized.preset_labels_path);
    }

    #[test]
    fn test_config_backward_compatibility() {
        // Old config files without the newer fields still load with defaults.
        let old_config_json = r#"{
            "media_mode": "Audio"
        }"#;

        let config: AppConfig = serde_json::from_str(old_config_json).expect("Failed to parse old config");
        assert!(!config.media_mode_switch_enabled);
        assert!(config.preset_labels_path.is_none());
    }

    #[test]
    fn test_parse_preset_labels() {
        let content = "Greeting\n\n  Song  \nFarewell\n";
        assert_eq!(parse_preset_labels(content), vec!["Greeting", "Song", "Farewell"]);
    }

    #[test]
    fn test_parse_preset_labels_empty() {
        assert!(parse_preset_labels("").is_empty());
        assert!(parse_preset_labels("\n\n").is_empty());
    }
}
