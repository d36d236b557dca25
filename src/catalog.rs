//! Qt Linguist `.ts` catalogs: model, reader, lookup and checks.

/// Findings and their severities
mod issue;
/// Catalog language detection
mod language;
/// Key lookup with source fallback
mod lookup;
/// Catalog data model
mod model;
/// Plural form rules
mod numerus;
/// XML reader
mod parser;
/// Argument markers and markup
mod placeholder;
/// Integrity checks
mod validate;

use std::path::{
    Path,
    PathBuf,
};

pub use issue::{
    CatalogIssue,
    IssueKind,
    IssueSeverity,
    RelatedRange,
};
pub use language::{
    UNKNOWN_LANGUAGE,
    catalog_language,
    language_from_path,
};
pub use lookup::{
    CatalogIndex,
    LookupPolicy,
};
pub use model::{
    Catalog,
    CatalogHeader,
    ContextInfo,
    Location,
    Message,
    MessageKey,
    Translation,
    TranslationState,
};
pub use numerus::NumerusRule;
pub use parser::{
    ParsedCatalog,
    parse_catalog,
};
pub use placeholder::{
    Placeholder,
    PlaceholderDiff,
    fill_count,
    fill_placeholders,
    markup_tags,
    placeholders,
};
pub use validate::{
    CatalogStatistics,
    CheckOptions,
    validate,
};

#[derive(Debug, thiserror::Error)]
/// Errors of the strict catalog API.
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML at line {line}, column {column}: {message}")]
    Xml { line: u32, column: u32, message: String },

    #[error("Not a Qt Linguist catalog: missing <TS> root element")]
    MissingRoot,
}

impl Catalog {
    /// Parses `text`, failing on XML errors or a missing `<TS>` root.
    ///
    /// Recoverable findings (duplicates, missing names...) do not fail; use
    /// [`parse_catalog`] and [`validate`] to see them.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let parsed = parse_catalog(text);

        if let Some(issue) = parsed.issues.iter().find(|issue| issue.kind == IssueKind::MalformedXml)
        {
            return Err(CatalogError::Xml {
                line: issue.range.start.line + 1,
                column: issue.range.start.character + 1,
                message: issue.message.clone(),
            });
        }
        if parsed.issues.iter().any(|issue| issue.kind == IssueKind::MissingRoot) {
            return Err(CatalogError::MissingRoot);
        }

        Ok(parsed.catalog)
    }

    /// Reads and strictly parses the catalog at `path`.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&text)
    }
}
