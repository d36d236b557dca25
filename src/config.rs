//! Workspace settings.
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Catalog file pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use loader::{
    CONFIG_FILE_NAME,
    load_from_file,
};
pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    CatalogFilesConfig,
    ConfigError,
    DiagnosticsConfig,
    IndexingConfig,
    LinguistSettings,
    LookupConfig,
    ServerSettings,
    Severity,
    ValidationError,
};
