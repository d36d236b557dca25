//! Findings reported while reading and checking a catalog.

use serde::Serialize;

use crate::types::SourceRange;

/// Kind of a catalog finding. The string code is stable and shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    MalformedXml,
    MissingRoot,
    MissingSource,
    DuplicateSource,
    DuplicateTranslation,
    MissingContextName,
    DuplicateMessage,
    EmptyTranslation,
    PlaceholderMismatch,
    MarkupMismatch,
    NumerusForms,
    Unfinished,
    Vanished,
}

impl IssueKind {
    pub const ALL: [Self; 13] = [
        Self::MalformedXml,
        Self::MissingRoot,
        Self::MissingSource,
        Self::DuplicateSource,
        Self::DuplicateTranslation,
        Self::MissingContextName,
        Self::DuplicateMessage,
        Self::EmptyTranslation,
        Self::PlaceholderMismatch,
        Self::MarkupMismatch,
        Self::NumerusForms,
        Self::Unfinished,
        Self::Vanished,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MalformedXml => "malformed-xml",
            Self::MissingRoot => "missing-root",
            Self::MissingSource => "missing-source",
            Self::DuplicateSource => "duplicate-source",
            Self::DuplicateTranslation => "duplicate-translation",
            Self::MissingContextName => "missing-context-name",
            Self::DuplicateMessage => "duplicate-message",
            Self::EmptyTranslation => "empty-translation",
            Self::PlaceholderMismatch => "placeholder-mismatch",
            Self::MarkupMismatch => "markup-mismatch",
            Self::NumerusForms => "numerus-forms",
            Self::Unfinished => "unfinished",
            Self::Vanished => "vanished",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Structural findings come from the parser; the rest from validation.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        matches!(
            self,
            Self::MalformedXml
                | Self::MissingRoot
                | Self::MissingSource
                | Self::DuplicateSource
                | Self::DuplicateTranslation
                | Self::MissingContextName
        )
    }

    #[must_use]
    pub const fn default_severity(self) -> IssueSeverity {
        match self {
            Self::MalformedXml
            | Self::MissingRoot
            | Self::MissingSource
            | Self::DuplicateSource
            | Self::DuplicateTranslation
            | Self::MissingContextName
            | Self::DuplicateMessage => IssueSeverity::Error,
            Self::EmptyTranslation
            | Self::PlaceholderMismatch
            | Self::MarkupMismatch
            | Self::NumerusForms => IssueSeverity::Warning,
            Self::Unfinished => IssueSeverity::Information,
            Self::Vanished => IssueSeverity::Hint,
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    Information,
    Hint,
}

impl IssueSeverity {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "info",
            Self::Hint => "hint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub kind: IssueKind,
    pub range: SourceRange,
    pub message: String,
    /// Other places involved, e.g. the first occurrence of a duplicate
    pub related: Vec<RelatedRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedRange {
    pub range: SourceRange,
    pub message: String,
}

impl CatalogIssue {
    #[must_use]
    pub fn new(kind: IssueKind, range: SourceRange, message: impl Into<String>) -> Self {
        Self { kind, range, message: message.into(), related: Vec::new() }
    }

    #[must_use]
    pub fn with_related(mut self, range: SourceRange, message: impl Into<String>) -> Self {
        self.related.push(RelatedRange { range, message: message.into() });
        self
    }
}
