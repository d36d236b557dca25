use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::catalog::{
    IssueKind,
    IssueSeverity,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "catalogFiles.includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Numbered list, one error per line.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Settings wrapped in a `linguist` section, as sent by editor clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    pub linguist: LinguistSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinguistSettings {
    pub catalog_files: CatalogFilesConfig,

    /// Applies to every file of the workspace.
    pub exclude_patterns: Vec<String>,

    pub indexing: IndexingConfig,
    pub diagnostics: DiagnosticsConfig,
    pub lookup: LookupConfig,

    /// Languages listed first in hover, in this order.
    pub primary_languages: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFilesConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for CatalogFilesConfig {
    fn default() -> Self {
        Self { include_patterns: vec!["**/translations/*.ts".to_string()], exclude_patterns: vec![] }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Parallel thread count for indexing.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

/// Severity override for one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
    /// Suppress the check
    Off,
}

impl Severity {
    #[must_use]
    pub const fn to_issue_severity(self) -> Option<IssueSeverity> {
        match self {
            Self::Error => Some(IssueSeverity::Error),
            Self::Warning => Some(IssueSeverity::Warning),
            Self::Information => Some(IssueSeverity::Information),
            Self::Hint => Some(IssueSeverity::Hint),
            Self::Off => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsConfig {
    /// Compare rich-text tags between source and translation.
    pub check_markup: bool,

    /// Per-check overrides keyed by code, e.g. `"unfinished": "off"`.
    #[serde(flatten)]
    pub severities: BTreeMap<String, Severity>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { check_markup: true, severities: BTreeMap::new() }
    }
}

impl DiagnosticsConfig {
    /// Effective severity for `kind`; `None` if the check is turned off.
    #[must_use]
    pub fn severity_for(&self, kind: IssueKind) -> Option<IssueSeverity> {
        self.severities
            .get(kind.code())
            .map_or(Some(kind.default_severity()), |severity| severity.to_issue_severity())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LookupConfig {
    /// Serve translations still marked `unfinished`.
    pub include_unfinished: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self { include_unfinished: true }
    }
}

impl LinguistSettings {
    /// # Errors
    /// - No catalog include pattern
    /// - Invalid glob pattern
    /// - Unknown diagnostic code
    /// - Zero indexing threads
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.catalog_files.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "catalogFiles.includePatterns",
                "At least one pattern is required. Example: [\"**/translations/*.ts\"]",
            ));
        }

        let pattern_lists = [
            ("catalogFiles.includePatterns", &self.catalog_files.include_patterns),
            ("catalogFiles.excludePatterns", &self.catalog_files.exclude_patterns),
            ("excludePatterns", &self.exclude_patterns),
        ];
        for (field, patterns) in pattern_lists {
            for (index, pattern) in patterns.iter().enumerate() {
                if let Err(e) = globset::Glob::new(pattern) {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        format!("Invalid glob pattern '{pattern}': {e}"),
                    ));
                }
            }
        }

        if self.indexing.num_threads == Some(0) {
            errors.push(ValidationError::new(
                "indexing.numThreads",
                "Must be at least 1, or removed to use the default",
            ));
        }

        for code in self.diagnostics.severities.keys() {
            if IssueKind::from_code(code).is_none() {
                let known: Vec<&str> = IssueKind::ALL.iter().map(|kind| kind.code()).collect();
                errors.push(ValidationError::new(
                    format!("diagnostics.{code}"),
                    format!("Unknown check '{code}'. Known checks: {}", known.join(", ")),
                ));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for LinguistSettings {
    fn default() -> Self {
        Self {
            catalog_files: CatalogFilesConfig::default(),
            exclude_patterns: vec!["**/build/**".to_string(), "**/node_modules/**".to_string()],
            indexing: IndexingConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            lookup: LookupConfig::default(),
            primary_languages: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn validate_valid_settings() {
        let settings = LinguistSettings::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let settings: LinguistSettings = serde_json::from_str("{}").unwrap();

        assert_that!(settings.catalog_files.include_patterns, elements_are![eq("**/translations/*.ts")]);
        assert_that!(settings.diagnostics.check_markup, eq(true));
        assert_that!(settings.lookup.include_unfinished, eq(true));
        assert_that!(settings.primary_languages, none());
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{
            "catalogFiles": { "includePatterns": ["i18n/*.ts"] },
            "diagnostics": { "checkMarkup": false, "unfinished": "off", "vanished": "information" },
            "lookup": { "includeUnfinished": false },
            "primaryLanguages": ["fi", "gl_ES"]
        }"#;

        let settings: LinguistSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.catalog_files.include_patterns, elements_are![eq("i18n/*.ts")]);
        assert_that!(settings.exclude_patterns, len(eq(2)));
        assert_that!(settings.diagnostics.check_markup, eq(false));
        assert_that!(settings.lookup.include_unfinished, eq(false));
        assert_eq!(settings.diagnostics.severity_for(IssueKind::Unfinished), None);
        assert_eq!(
            settings.diagnostics.severity_for(IssueKind::Vanished),
            Some(IssueSeverity::Information)
        );
        assert_eq!(
            settings.diagnostics.severity_for(IssueKind::PlaceholderMismatch),
            Some(IssueSeverity::Warning)
        );
        assert_that!(settings.primary_languages, some(elements_are![eq("fi"), eq("gl_ES")]));
    }

    #[rstest]
    fn deserialize_wrapped_settings() {
        let json = r#"{ "linguist": { "indexing": { "numThreads": 2 } } }"#;

        let settings: ServerSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.linguist.indexing.num_threads, Some(2));
    }

    #[rstest]
    fn rejects_unknown_severity() {
        let json = r#"{ "diagnostics": { "unfinished": "loud" } }"#;

        assert!(serde_json::from_str::<LinguistSettings>(json).is_err());
    }

    #[rstest]
    fn validate_empty_include_patterns() {
        let settings = LinguistSettings {
            catalog_files: CatalogFilesConfig { include_patterns: vec![], exclude_patterns: vec![] },
            ..LinguistSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq("catalogFiles.includePatterns")),
                field!(ValidationError.message, contains_substring("At least one pattern"))
            ]])
        );
    }

    #[rstest]
    #[case::include("catalogFiles.includePatterns[0]")]
    #[case::exclude("excludePatterns[2]")]
    fn validate_invalid_glob(#[case] expected_path: &str) {
        let mut settings = LinguistSettings::default();
        if expected_path.starts_with("catalogFiles") {
            settings.catalog_files.include_patterns = vec!["**/*.{ts".to_string()];
        } else {
            settings.exclude_patterns.push("invalid[pattern".to_string());
        }

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq(expected_path)),
                field!(ValidationError.message, contains_substring("Invalid glob pattern"))
            ]])
        );
    }

    #[rstest]
    fn validate_unknown_diagnostic_code() {
        let mut settings = LinguistSettings::default();
        settings.diagnostics.severities.insert("unused-key".to_string(), Severity::Off);

        assert_that!(
            settings.validate(),
            err(elements_are![field!(ValidationError.field_path, eq("diagnostics.unused-key"))])
        );
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let settings = LinguistSettings {
            catalog_files: CatalogFilesConfig { include_patterns: vec![], exclude_patterns: vec![] },
            indexing: IndexingConfig { num_threads: Some(0) },
            ..LinguistSettings::default()
        };

        let errors = settings.validate().unwrap_err();
        let error_message = format!("{}", ConfigError::ValidationErrors(errors));

        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. catalogFiles.includePatterns"));
        assert_that!(error_message, contains_substring("2. indexing.numThreads"));
    }
}
