//! Typed model of a Qt Linguist catalog.

use serde::Serialize;

use crate::types::SourceRange;

/// Attributes of the `<TS>` root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogHeader {
    /// Target locale, e.g. `fi` or `km_KH`
    pub language: Option<String>,
    /// Locale of the source strings (usually absent, meaning English)
    pub source_language: Option<String>,
    /// Format version, e.g. `2.1`
    pub version: Option<String>,
}

/// Lookup key of a message.
///
/// An absent `<comment>` is stored as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MessageKey {
    pub context: String,
    pub source: String,
    pub comment: String,
}

impl MessageKey {
    #[must_use]
    pub fn new(
        context: impl Into<String>,
        source: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self { context: context.into(), source: source.into(), comment: comment.into() }
    }

    #[must_use]
    pub const fn has_comment(&self) -> bool {
        !self.comment.is_empty()
    }
}

/// Provenance of a message in the application sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path relative to the catalog's directory
    pub filename: String,
    /// 1-based line, if known
    pub line: Option<u32>,
    pub range: SourceRange,
}

/// Value of the `type` attribute of `<translation>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TranslationState {
    #[default]
    Finished,
    Unfinished,
    /// The message disappeared from the sources (`lupdate` keeps it for reuse)
    Vanished,
    /// Pre-5.x spelling of `vanished`
    Obsolete,
}

impl TranslationState {
    #[must_use]
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "unfinished" => Some(Self::Unfinished),
            "vanished" => Some(Self::Vanished),
            "obsolete" => Some(Self::Obsolete),
            _ => None,
        }
    }

    /// Vanished and obsolete messages are kept only for translator reuse.
    #[must_use]
    pub const fn is_retired(self) -> bool {
        matches!(self, Self::Vanished | Self::Obsolete)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Unfinished => "unfinished",
            Self::Vanished => "vanished",
            Self::Obsolete => "obsolete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub state: TranslationState,
    /// One entry for plain messages, one per `<numerusform>` for numerus messages
    pub forms: Vec<String>,
    /// Whole `<translation>` element
    pub range: SourceRange,
    /// Opening tag only, used to rewrite the `type` attribute
    pub open_tag_range: SourceRange,
}

impl Translation {
    /// The first (or only) form.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.forms.first().map(String::as_str)
    }

    /// True when no form carries any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forms.iter().all(String::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub key: MessageKey,
    /// `id` attribute for id-based translation
    pub id: Option<String>,
    /// `numerus="yes"`
    pub numerus: bool,
    /// Developer note from `<extracomment>`
    pub extra_comment: Option<String>,
    /// Translator note from `<translatorcomment>`
    pub translator_comment: Option<String>,
    pub locations: Vec<Location>,
    pub translation: Option<Translation>,
    /// Whole `<message>` element
    pub range: SourceRange,
    /// `<source>` element, when present
    pub source_range: Option<SourceRange>,
}

impl Message {
    /// State of the translation; a message with no `<translation>` counts as unfinished.
    #[must_use]
    pub fn state(&self) -> TranslationState {
        self.translation.as_ref().map_or(TranslationState::Unfinished, |t| t.state)
    }

    /// Range used to anchor findings about the translation.
    #[must_use]
    pub fn translation_range(&self) -> SourceRange {
        self.translation.as_ref().map_or_else(|| self.key_range(), |t| t.range)
    }

    /// Range used to anchor findings about the message itself.
    #[must_use]
    pub fn key_range(&self) -> SourceRange {
        self.source_range.unwrap_or(self.range)
    }
}

/// A `<context>` element and the range of its `<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub name: String,
    pub range: SourceRange,
}

/// A fully read catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub header: CatalogHeader,
    pub contexts: Vec<ContextInfo>,
    /// Messages in document order
    pub messages: Vec<Message>,
}

impl Catalog {
    /// Finds the innermost message whose element contains `position`.
    #[must_use]
    pub fn message_at(&self, position: crate::types::SourcePosition) -> Option<&Message> {
        self.messages.iter().find(|message| message.range.contains(position))
    }

    /// First message with `key`, preferring live messages over retired ones.
    #[must_use]
    pub fn find_message(&self, key: &MessageKey) -> Option<&Message> {
        let mut matching = self.messages.iter().filter(|message| &message.key == key);
        let first = matching.next()?;
        if !first.state().is_retired() {
            return Some(first);
        }
        Some(matching.find(|message| !message.state().is_retired()).unwrap_or(first))
    }

    /// Messages that are still part of the application (not vanished or obsolete).
    pub fn live_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|message| !message.state().is_retired())
    }
}
