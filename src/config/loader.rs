//! Settings file loading.

use std::path::Path;

use super::{
    ConfigError,
    LinguistSettings,
};

/// Name of the settings file looked up at the workspace root.
pub const CONFIG_FILE_NAME: &str = ".linguist-ls.json";

/// Loads settings from the workspace root.
///
/// # Returns
/// - `Ok(Some(settings))`: the file exists and parsed
/// - `Ok(None)`: no settings file
/// - `Err(ConfigError)`: read or parse failure
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<LinguistSettings>, ConfigError> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = ?config_path, "Configuration file not found");
        return Ok(None);
    }

    load_from_file(&config_path).map(Some)
}

/// Loads settings from an explicit file, e.g. `check --config`.
pub fn load_from_file(config_path: &Path) -> Result<LinguistSettings, ConfigError> {
    tracing::debug!(path = ?config_path, "Loading configuration");

    let content = std::fs::read_to_string(config_path)?;
    let settings: LinguistSettings = serde_json::from_str(&content)?;

    Ok(settings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    fn load_from_workspace_with_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"{"primaryLanguages": ["fi"]}"#;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), config_content).unwrap();

        let result = load_from_workspace(temp_dir.path());

        let settings = result.unwrap().unwrap();
        assert_eq!(settings.primary_languages, Some(vec!["fi".to_string()]));
    }

    #[rstest]
    fn load_from_workspace_no_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(result.unwrap().is_none());
    }

    #[rstest]
    fn load_from_workspace_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "invalid json").unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[rstest]
    fn load_from_missing_file() {
        let result = load_from_file(Path::new("/nonexistent/.linguist-ls.json"));

        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
