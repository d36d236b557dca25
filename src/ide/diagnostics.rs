//! Catalog findings as LSP diagnostics.

use tower_lsp::lsp_types::{
    Diagnostic,
    DiagnosticRelatedInformation,
    DiagnosticSeverity,
    DiagnosticTag,
    Location,
    NumberOrString,
    Url,
};

use crate::catalog::{
    CatalogIssue,
    CheckOptions,
    IssueKind,
    IssueSeverity,
    UNKNOWN_LANGUAGE,
    validate,
};
use crate::config::LinguistSettings;
use crate::db::CatalogDatabase;
use crate::input::catalog::{
    CatalogFile,
    catalog_file_language,
    parsed_catalog,
};

/// `source` of every diagnostic this server publishes.
pub const DIAGNOSTIC_SOURCE: &str = "linguist";

/// Runs every check on `file` and keeps the findings whose check is not turned off.
///
/// Each finding is paired with its effective severity.
#[must_use]
pub fn catalog_issues(
    db: &dyn CatalogDatabase,
    file: CatalogFile,
    settings: &LinguistSettings,
) -> Vec<(CatalogIssue, IssueSeverity)> {
    let language = catalog_file_language(db, file);
    let options = CheckOptions {
        check_markup: settings.diagnostics.check_markup,
        language: (language != UNKNOWN_LANGUAGE).then(|| language.clone()),
    };

    validate(parsed_catalog(db, file), &options)
        .into_iter()
        .filter_map(|issue| {
            let severity = settings.diagnostics.severity_for(issue.kind)?;
            Some((issue, severity))
        })
        .collect()
}

/// Generates the diagnostics of a catalog.
pub fn generate_diagnostics(
    db: &dyn CatalogDatabase,
    file: CatalogFile,
    uri: &Url,
    settings: &LinguistSettings,
) -> Vec<Diagnostic> {
    tracing::debug!(path = %file.path(db), "Generating diagnostics");

    catalog_issues(db, file, settings)
        .into_iter()
        .map(|(issue, severity)| to_diagnostic(issue, severity, uri))
        .collect()
}

/// Converts one finding.
fn to_diagnostic(issue: CatalogIssue, severity: IssueSeverity, uri: &Url) -> Diagnostic {
    let related_information = (!issue.related.is_empty()).then(|| {
        issue
            .related
            .into_iter()
            .map(|related| DiagnosticRelatedInformation {
                location: Location { uri: uri.clone(), range: related.range.into() },
                message: related.message,
            })
            .collect()
    });

    let tags = (issue.kind == IssueKind::Vanished).then(|| vec![DiagnosticTag::UNNECESSARY]);

    Diagnostic {
        range: issue.range.into(),
        severity: Some(to_lsp_severity(severity)),
        code: Some(NumberOrString::String(issue.kind.code().to_string())),
        code_description: None,
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: issue.message,
        related_information,
        tags,
        data: None,
    }
}

#[must_use]
pub const fn to_lsp_severity(severity: IssueSeverity) -> DiagnosticSeverity {
    match severity {
        IssueSeverity::Error => DiagnosticSeverity::ERROR,
        IssueSeverity::Warning => DiagnosticSeverity::WARNING,
        IssueSeverity::Information => DiagnosticSeverity::INFORMATION,
        IssueSeverity::Hint => DiagnosticSeverity::HINT,
    }
}
