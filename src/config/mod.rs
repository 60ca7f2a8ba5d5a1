//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<MapsonicConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {:?}", path))?;
    let config: MapsonicConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config file: {:?}", path))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_minimal_config() {
        let yaml = r#"
timing:
  hover_interval_ms: 250

audio:
  fallback_volume: 0.6

toggles:
  identify_clusters: true
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.timing.hover_interval_ms, 250);
        assert_eq!(config.audio.fallback_volume, 0.6);
        assert!(config.toggles.identify_clusters);
        assert!(config.toggles.sound);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"audio:\n  fallback_volume: 1.5\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/mapsonic.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: MapsonicConfig =
            serde_yaml::from_str(include_str!("../../mapsonic.example.yaml")).unwrap();
        assert!(config.validate().is_ok());
    }
}
