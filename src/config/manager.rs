//! Settings management.

use std::path::PathBuf;

use super::{
    ConfigError,
    LinguistSettings,
    loader,
};

/// Holds the validated settings of the workspace.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// Current settings
    current_settings: LinguistSettings,

    /// Workspace root path
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: LinguistSettings::default(), workspace_root: None }
    }

    /// Loads `.linguist-ls.json` from `workspace_root`, or defaults.
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Validation error
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!(?workspace_root, "Loading settings");

        let settings = if let Some(root) = &workspace_root {
            loader::load_from_workspace(root)?.map_or_else(LinguistSettings::default, |ws| {
                tracing::debug!(settings = ?ws, "Loaded workspace settings");
                ws
            })
        } else {
            LinguistSettings::default()
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.workspace_root = workspace_root;
        tracing::debug!(settings = ?self.current_settings, "Settings loaded");

        Ok(())
    }

    /// Replaces the settings, e.g. from `workspace/didChangeConfiguration`.
    pub fn update_settings(&mut self, new_settings: LinguistSettings) -> Result<(), ConfigError> {
        tracing::debug!("Updating settings");

        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = new_settings;
        tracing::debug!("Settings updated");

        Ok(())
    }

    /// Parses a `didChangeConfiguration` payload and applies it.
    ///
    /// Accepts the bare settings object or one wrapped as `{ "linguist": ... }`.
    /// A `null` payload reloads the workspace file.
    pub fn apply_client_settings(&mut self, value: serde_json::Value) -> Result<(), ConfigError> {
        if value.is_null() {
            let root = self.workspace_root.clone();
            return self.load_settings(root);
        }

        let value = match value {
            serde_json::Value::Object(mut object) if object.contains_key("linguist") => {
                object.remove("linguist").unwrap_or_default()
            }
            other => other,
        };
        let settings: LinguistSettings = serde_json::from_value(value)?;
        self.update_settings(settings)
    }

    #[must_use]
    pub const fn get_settings(&self) -> &LinguistSettings {
        &self.current_settings
    }

    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::config::CatalogFilesConfig;

    #[rstest]
    fn new_creates_default_settings() {
        let manager = ConfigManager::new();

        assert_eq!(manager.get_settings(), &LinguistSettings::default());
        assert!(manager.workspace_root().is_none());
    }

    #[rstest]
    fn load_settings_without_workspace() {
        let mut manager = ConfigManager::new();

        let result = manager.load_settings(None);

        assert!(result.is_ok());
        assert!(manager.workspace_root().is_none());
    }

    #[rstest]
    fn load_settings_with_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"{"lookup": {"includeUnfinished": false}}"#;
        fs::write(temp_dir.path().join(".linguist-ls.json"), config_content).unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert!(result.is_ok());
        assert!(!manager.get_settings().lookup.include_unfinished);
        assert!(manager.workspace_root().is_some());
    }

    #[rstest]
    fn load_settings_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(".linguist-ls.json"),
            r#"{"catalogFiles": {"includePatterns": []}}"#,
        )
        .unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert!(matches!(result, Err(ConfigError::ValidationErrors(_))));
        assert_eq!(manager.get_settings(), &LinguistSettings::default());
    }

    #[rstest]
    fn update_settings_invalid() {
        let mut manager = ConfigManager::new();
        let new_settings = LinguistSettings {
            catalog_files: CatalogFilesConfig { include_patterns: vec![], exclude_patterns: vec![] },
            ..LinguistSettings::default()
        };

        let result = manager.update_settings(new_settings);

        assert!(result.is_err());
    }

    #[rstest]
    #[case::bare(json!({ "primaryLanguages": ["ar"] }))]
    #[case::wrapped(json!({ "linguist": { "primaryLanguages": ["ar"] } }))]
    fn apply_client_settings_shapes(#[case] payload: serde_json::Value) {
        let mut manager = ConfigManager::new();

        manager.apply_client_settings(payload).unwrap();

        assert_eq!(manager.get_settings().primary_languages, Some(vec!["ar".to_string()]));
    }

    #[rstest]
    fn apply_null_reloads_workspace_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".linguist-ls.json"), r#"{"primaryLanguages": ["fi"]}"#)
            .unwrap();
        let mut manager = ConfigManager::new();
        manager.load_settings(Some(temp_dir.path().to_path_buf())).unwrap();
        manager.apply_client_settings(json!({ "primaryLanguages": ["ar"] })).unwrap();

        manager.apply_client_settings(serde_json::Value::Null).unwrap();

        assert_eq!(manager.get_settings().primary_languages, Some(vec!["fi".to_string()]));
    }
}
