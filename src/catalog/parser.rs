//! Lenient `.ts` reader built on `quick-xml` events.
//!
//! The reader never gives up on a document: structural problems are recorded as
//! [`CatalogIssue`]s and everything read before a fatal XML error is kept, so the
//! language server can still offer hover and navigation on a half-edited file.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{
    BytesStart,
    Event,
};

use super::issue::{
    CatalogIssue,
    IssueKind,
};
use super::model::{
    Catalog,
    ContextInfo,
    Location,
    Message,
    MessageKey,
    Translation,
    TranslationState,
};
use crate::types::{
    LineIndex,
    SourceRange,
};

/// Result of reading a catalog: the model plus structural findings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCatalog {
    pub catalog: Catalog,
    pub issues: Vec<CatalogIssue>,
}

impl ParsedCatalog {
    /// True when the XML could not be read to the end.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.issues.iter().any(|issue| issue.kind == IssueKind::MalformedXml)
    }
}

/// Reads a catalog from its XML text.
#[must_use]
pub fn parse_catalog(text: &str) -> ParsedCatalog {
    CatalogReader::new(text).read()
}

/// Elements of the `.ts` format the reader cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Ts,
    Context,
    Name,
    Message,
    Location,
    Source,
    Comment,
    ExtraComment,
    TranslatorComment,
    Translation,
    NumerusForm,
    LengthVariant,
    Byte,
    /// `oldsource`, `userdata`, `extra-*` and anything unknown
    Other,
}

impl Element {
    /// Maps a local tag name to an element.
    fn classify(name: &[u8]) -> Self {
        match name {
            b"TS" => Self::Ts,
            b"context" => Self::Context,
            b"name" => Self::Name,
            b"message" => Self::Message,
            b"location" => Self::Location,
            b"source" => Self::Source,
            b"comment" => Self::Comment,
            b"extracomment" => Self::ExtraComment,
            b"translatorcomment" => Self::TranslatorComment,
            b"translation" => Self::Translation,
            b"numerusform" => Self::NumerusForm,
            b"lengthvariant" => Self::LengthVariant,
            b"byte" => Self::Byte,
            _ => Self::Other,
        }
    }

    /// Elements whose character data is kept.
    const fn captures_text(self) -> bool {
        matches!(
            self,
            Self::Name
                | Self::Source
                | Self::Comment
                | Self::ExtraComment
                | Self::TranslatorComment
                | Self::Translation
                | Self::NumerusForm
                | Self::LengthVariant
        )
    }
}

/// An open element.
#[derive(Debug)]
struct Frame {
    /// Kind of element
    element: Element,
    /// Byte offset of `<`
    start: usize,
    /// Collected character data
    text: String,
    /// A `<lengthvariant>` child already supplied the text
    has_variant: bool,
}

#[derive(Debug)]
/// A `<context>` being read.
struct PendingContext {
    /// Text of `<name>`, once read
    name: Option<String>,
    /// Index of the first message read inside this context
    first_message: usize,
}

#[derive(Debug)]
/// A `<translation>` being read.
struct PendingTranslation {
    /// Parsed `type` attribute
    state: TranslationState,
    /// Opening tag
    open_tag_range: SourceRange,
    /// Collected `<numerusform>` texts
    numerus_forms: Vec<String>,
}

#[derive(Debug, Default)]
/// A `<message>` being read.
struct PendingMessage {
    /// `id` attribute
    id: Option<String>,
    /// `numerus="yes"`
    numerus: bool,
    /// Text of the first `<source>`
    source: Option<String>,
    /// Range of the first `<source>`
    source_range: Option<SourceRange>,
    /// Disambiguation `<comment>`
    comment: Option<String>,
    /// `<extracomment>`
    extra_comment: Option<String>,
    /// `<translatorcomment>`
    translator_comment: Option<String>,
    /// Resolved `<location>`s
    locations: Vec<Location>,
    /// Open `<translation>`
    translation: Option<PendingTranslation>,
    /// First closed `<translation>`
    finished_translation: Option<Translation>,
    /// Number of `<translation>` children seen
    translation_count: u32,
}

/// Streaming reader state.
struct CatalogReader<'a> {
    /// Document text
    text: &'a str,
    /// Offset to position conversion
    lines: LineIndex<'a>,
    /// Model being built
    catalog: Catalog,
    /// Structural findings
    issues: Vec<CatalogIssue>,
    /// Open elements
    stack: Vec<Frame>,
    /// A `<TS>` root was opened
    root_seen: bool,
    /// Context being read
    context: Option<PendingContext>,
    /// Message being read
    message: Option<PendingMessage>,
    /// File of the previous `<location>`, for the relative form
    last_location_file: Option<String>,
    /// Last line seen per file, for `line="+N"`
    last_location_lines: HashMap<String, i64>,
}

impl<'a> CatalogReader<'a> {
    /// Creates a reader over `text`.
    fn new(text: &'a str) -> Self {
        Self {
            text,
            lines: LineIndex::new(text),
            catalog: Catalog::default(),
            issues: Vec::new(),
            stack: Vec::new(),
            root_seen: false,
            context: None,
            message: None,
            last_location_file: None,
            last_location_lines: HashMap::new(),
        }
    }

    /// Consumes every event.
    fn read(mut self) -> ParsedCatalog {
        let mut reader = Reader::from_str(self.text);

        loop {
            let start = offset(reader.buffer_position());
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(error) => {
                    let at = offset(reader.error_position());
                    tracing::debug!(%error, offset = at, "Stopping at malformed XML");
                    self.issues.push(CatalogIssue::new(
                        IssueKind::MalformedXml,
                        self.lines.range(at, at),
                        format!("Malformed XML: {error}"),
                    ));
                    break;
                }
            };
            let end = offset(reader.buffer_position());

            match event {
                Event::Start(element) => {
                    let kind = Element::classify(element.local_name().as_ref());
                    self.open(kind, &element, start, end);
                    self.stack.push(Frame {
                        element: kind,
                        start,
                        text: String::new(),
                        has_variant: false,
                    });
                }
                Event::Empty(element) => {
                    let kind = Element::classify(element.local_name().as_ref());
                    self.open(kind, &element, start, end);
                    self.close(
                        Frame { element: kind, start, text: String::new(), has_variant: false },
                        end,
                    );
                }
                Event::End(_) => {
                    if let Some(frame) = self.stack.pop() {
                        self.close(frame, end);
                    }
                }
                Event::Text(text) => {
                    let decoded = match text.unescape() {
                        Ok(decoded) => decoded.into_owned(),
                        Err(error) => {
                            tracing::debug!(%error, offset = start, "Stopping at malformed XML");
                            self.issues.push(CatalogIssue::new(
                                IssueKind::MalformedXml,
                                self.lines.range(start, end),
                                format!("Malformed XML: {error}"),
                            ));
                            break;
                        }
                    };
                    self.append_text(&decoded);
                }
                Event::CData(data) => {
                    self.append_text(&String::from_utf8_lossy(&data));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !self.root_seen && !self.is_malformed() {
            self.issues.push(CatalogIssue::new(
                IssueKind::MissingRoot,
                SourceRange::default(),
                "Document has no <TS> root element",
            ));
        }

        ParsedCatalog { catalog: self.catalog, issues: self.issues }
    }

    /// True once an XML error was recorded.
    fn is_malformed(&self) -> bool {
        self.issues.iter().any(|issue| issue.kind == IssueKind::MalformedXml)
    }

    /// Appends character data to the innermost capturing frame.
    fn append_text(&mut self, text: &str) {
        if let Some(frame) = self.stack.last_mut()
            && frame.element.captures_text()
            && !frame.has_variant
        {
            frame.text.push_str(text);
        }
    }

    /// Handles an opening (or empty) tag.
    fn open(&mut self, element: Element, start_tag: &BytesStart<'_>, start: usize, end: usize) {
        if self.stack.is_empty() {
            if element == Element::Ts {
                self.root_seen = true;
                let header = &mut self.catalog.header;
                header.language = attribute(start_tag, "language");
                header.source_language = attribute(start_tag, "sourcelanguage");
                header.version = attribute(start_tag, "version");
            } else {
                self.issues.push(CatalogIssue::new(
                    IssueKind::MissingRoot,
                    self.lines.range(start, end),
                    "Root element must be <TS>",
                ));
                self.root_seen = true;
            }
            return;
        }

        match element {
            Element::Context => {
                self.context =
                    Some(PendingContext { name: None, first_message: self.catalog.messages.len() });
            }
            Element::Message => {
                self.message = Some(PendingMessage {
                    id: attribute(start_tag, "id"),
                    numerus: attribute(start_tag, "numerus").is_some_and(|value| value == "yes"),
                    ..PendingMessage::default()
                });
            }
            Element::Location => {
                let location = self.resolve_location(start_tag, start, end);
                if let Some(message) = self.message.as_mut() {
                    message.locations.push(location);
                }
            }
            Element::Translation => {
                let open_tag_range = self.lines.range(start, end);
                let Some(message) = self.message.as_mut() else {
                    return;
                };
                message.translation_count += 1;
                if message.translation_count > 1 {
                    self.issues.push(CatalogIssue::new(
                        IssueKind::DuplicateTranslation,
                        open_tag_range,
                        "Message has more than one <translation>",
                    ));
                    return;
                }
                let state = attribute(start_tag, "type")
                    .and_then(|value| TranslationState::from_attribute(&value))
                    .unwrap_or_default();
                message.translation =
                    Some(PendingTranslation { state, open_tag_range, numerus_forms: Vec::new() });
            }
            Element::Byte => {
                if let Some(ch) = attribute(start_tag, "value").as_deref().and_then(decode_byte) {
                    self.append_text(ch.encode_utf8(&mut [0; 4]));
                }
            }
            _ => {}
        }
    }

    #[allow(clippy::too_many_lines)]
    /// Handles the end of `frame`.
    fn close(&mut self, frame: Frame, end: usize) {
        let range = self.lines.range(frame.start, end);
        let parent = self.stack.last().map(|parent| parent.element);

        match frame.element {
            Element::Name if parent == Some(Element::Context) => {
                if let Some(context) = self.context.as_mut() {
                    context.name = Some(frame.text.clone());
                    self.catalog.contexts.push(ContextInfo { name: frame.text, range });
                }
            }
            Element::Source => {
                let Some(message) = self.message.as_mut() else {
                    return;
                };
                if message.source.is_some() {
                    self.issues.push(CatalogIssue::new(
                        IssueKind::DuplicateSource,
                        range,
                        "Message has more than one <source>",
                    ));
                } else {
                    message.source = Some(frame.text);
                    message.source_range = Some(range);
                }
            }
            Element::Comment => {
                if let Some(message) = self.message.as_mut() {
                    message.comment = Some(frame.text);
                }
            }
            Element::ExtraComment => {
                if let Some(message) = self.message.as_mut() {
                    message.extra_comment = Some(frame.text);
                }
            }
            Element::TranslatorComment => {
                if let Some(message) = self.message.as_mut() {
                    message.translator_comment = Some(frame.text);
                }
            }
            Element::NumerusForm => {
                if let Some(translation) =
                    self.message.as_mut().and_then(|message| message.translation.as_mut())
                {
                    translation.numerus_forms.push(frame.text);
                }
            }
            Element::LengthVariant => {
                // The first (longest) variant stands for the whole form.
                if let Some(parent) = self.stack.last_mut()
                    && !parent.has_variant
                {
                    parent.text = frame.text;
                    parent.has_variant = true;
                }
            }
            Element::Translation => {
                let Some(message) = self.message.as_mut() else {
                    return;
                };
                let Some(pending) = message.translation.take() else {
                    return;
                };
                let forms = if pending.numerus_forms.is_empty() {
                    vec![frame.text]
                } else {
                    pending.numerus_forms
                };
                message.finished_translation = Some(Translation {
                    state: pending.state,
                    forms,
                    range,
                    open_tag_range: pending.open_tag_range,
                });
            }
            Element::Message => self.finish_message(frame.start, range),
            Element::Context => self.finish_context(frame.start, end),
            _ => {}
        }
    }

    /// Turns the pending message into a [`Message`].
    fn finish_message(&mut self, start: usize, range: SourceRange) {
        let Some(pending) = self.message.take() else {
            return;
        };

        let Some(source) = pending.source else {
            let open_tag_end = self.text.get(start..).and_then(|rest| rest.find('>'));
            let anchor =
                open_tag_end.map_or(range, |len| self.lines.range(start, start + len + 1));
            self.issues.push(CatalogIssue::new(
                IssueKind::MissingSource,
                anchor,
                "Message has no <source>",
            ));
            return;
        };

        let context = self.context.as_ref().and_then(|c| c.name.clone()).unwrap_or_default();
        self.catalog.messages.push(Message {
            key: MessageKey { context, source, comment: pending.comment.unwrap_or_default() },
            id: pending.id,
            numerus: pending.numerus,
            extra_comment: pending.extra_comment,
            translator_comment: pending.translator_comment,
            locations: pending.locations,
            translation: pending.finished_translation,
            range,
            source_range: pending.source_range,
        });
    }

    /// Records the context and names its messages.
    fn finish_context(&mut self, start: usize, end: usize) {
        let Some(context) = self.context.take() else {
            return;
        };

        match context.name {
            Some(name) => {
                // Messages read before a late <name> get the context retroactively.
                for message in self.catalog.messages.iter_mut().skip(context.first_message) {
                    if message.key.context.is_empty() {
                        message.key.context.clone_from(&name);
                    }
                }
            }
            None => {
                let open_tag_end = start + "<context>".len();
                self.issues.push(CatalogIssue::new(
                    IssueKind::MissingContextName,
                    self.lines.range(start, open_tag_end.min(end)),
                    "Context has no <name>",
                ));
            }
        }
    }

    /// Resolves absolute and relative (`line="+N"`, omitted `filename`) locations.
    fn resolve_location(&mut self, start_tag: &BytesStart<'_>, start: usize, end: usize) -> Location {
        let filename = attribute(start_tag, "filename")
            .or_else(|| self.last_location_file.clone())
            .unwrap_or_default();

        let line = attribute(start_tag, "line").and_then(|raw| {
            let base = self.last_location_lines.get(&filename).copied().unwrap_or(0);
            let line = if let Some(delta) = raw.strip_prefix('+') {
                base + delta.parse::<i64>().ok()?
            } else if raw.starts_with('-') {
                base + raw.parse::<i64>().ok()?
            } else {
                raw.parse::<i64>().ok()?
            };
            self.last_location_lines.insert(filename.clone(), line);
            u32::try_from(line).ok()
        });

        self.last_location_file = Some(filename.clone());
        Location { filename, line, range: self.lines.range(start, end) }
    }
}

/// Converts a reader offset into a byte index.
fn offset<T>(position: T) -> usize
where
    usize: TryFrom<T>,
{
    usize::try_from(position).unwrap_or(usize::MAX)
}

/// Reads and unescapes an attribute value.
fn attribute(start_tag: &BytesStart<'_>, name: &str) -> Option<String> {
    start_tag
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok().map(std::borrow::Cow::into_owned))
}

/// Decodes `<byte value="x9"/>` (hex) or `<byte value="9"/>` (decimal).
fn decode_byte(value: &str) -> Option<char> {
    let code = match value.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => value.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}
