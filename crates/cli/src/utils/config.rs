//! Settings file reading utilities

use clidi::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Greeting settings read from a YAML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub greeting: String,
    pub punctuation: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            greeting: "Hello".to_string(),
            punctuation: "!".to_string(),
        }
    }
}

/// Read settings from `config_path`. Missing keys keep their defaults.
pub fn read_settings(config_path: &Path) -> CliResult<Settings> {
    if !config_path.exists() {
        return Err(CliError::Message(format!(
            "Settings file not found: {}",
            config_path.display()
        )));
    }

    let config_content = fs::read_to_string(config_path)
        .map_err(|e| CliError::Message(format!("Failed to read config file: {e}")))?;

    if config_content.trim().is_empty() {
        return Ok(Settings::default());
    }

    serde_yaml::from_str(&config_content)
        .map_err(|e| CliError::Message(format!("Failed to parse config file: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_settings_full() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "greeting: Howdy\npunctuation: \"?\"\n").unwrap();

        let settings = read_settings(&path).unwrap();
        assert_eq!(settings.greeting, "Howdy");
        assert_eq!(settings.punctuation, "?");
    }

    #[test]
    fn test_read_settings_partial_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "greeting: Hi\n").unwrap();

        let settings = read_settings(&path).unwrap();
        assert_eq!(settings.greeting, "Hi");
        assert_eq!(settings.punctuation, "!");
    }

    #[test]
    fn test_read_settings_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "").unwrap();

        assert_eq!(read_settings(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_read_settings_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = read_settings(&temp_dir.path().join("missing.yaml"));

        match result {
            Err(CliError::Message(msg)) => assert!(msg.contains("Settings file not found")),
            other => panic!("Expected CliError::Message, got {other:?}"),
        }
    }

    #[test]
    fn test_read_settings_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "greeting: [unclosed").unwrap();

        match read_settings(&path) {
            Err(CliError::Message(msg)) => assert!(msg.contains("Failed to parse config file")),
            other => panic!("Expected CliError::Message, got {other:?}"),
        }
    }
}
