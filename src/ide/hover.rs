//! Hover implementation

use std::cmp::Ordering;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::catalog::{
    Message,
    MessageKey,
    TranslationState,
};
use crate::db::CatalogDatabase;
use crate::input::catalog::{
    CatalogFile,
    catalog_file_language,
    parsed_catalog,
};

/// Translations longer than this are cut in hover.
const MAX_VALUE_LENGTH: usize = 120;

/// One catalog's translation of the hovered key.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry<'a> {
    /// Catalog language
    language: &'a str,
    /// True for the catalog under the cursor
    current: bool,
    /// Rendered translation line
    value: String,
}

/// Generates hover content for `key` across `catalogs`.
///
/// # Ordering
/// 1. the catalog under the cursor (`current`)
/// 2. `primary_languages`, in configured order
/// 3. everything else, alphabetically
pub fn generate_hover_content(
    db: &dyn CatalogDatabase,
    key: &MessageKey,
    current: CatalogFile,
    catalogs: &[(PathBuf, CatalogFile)],
    primary_languages: Option<&[String]>,
) -> Option<String> {
    let mut entries: Vec<Entry<'_>> = catalogs
        .iter()
        .filter_map(|(_, file)| {
            let message = parsed_catalog(db, *file).catalog.find_message(key)?;
            Some(Entry {
                language: catalog_file_language(db, *file),
                current: *file == current,
                value: format_translation(message),
            })
        })
        .collect();

    if entries.is_empty() {
        return None;
    }

    sort_entries_by_priority(&mut entries, primary_languages);

    let mut content = format!("**Context:** `{}`\n\n**Source:** {}\n", key.context, key.source);
    if key.has_comment() {
        let _ = writeln!(content, "\n*Disambiguation:* {}", key.comment);
    }
    if let Some(note) = parsed_catalog(db, current)
        .catalog
        .find_message(key)
        .and_then(|message| message.extra_comment.as_deref())
    {
        let _ = writeln!(content, "\n*Developer note:* {note}");
    }
    content.push('\n');

    for entry in entries {
        let _ = writeln!(content, "**{}**{}", entry.language, entry.value);
    }

    Some(content)
}

/// `: text`, with a state mark, numerus forms and the translator comment.
fn format_translation(message: &Message) -> String {
    let mark = match message.state() {
        TranslationState::Finished => String::new(),
        state => format!(" ({})", state.label()),
    };

    let mut value = match &message.translation {
        Some(translation) if !translation.is_empty() => {
            if message.numerus && translation.forms.len() > 1 {
                let forms: Vec<String> = translation
                    .forms
                    .iter()
                    .enumerate()
                    .map(|(index, form)| format!("  `[{}]` {}", index + 1, truncate_string(form)))
                    .collect();
                format!("{mark}:\n{}", forms.join("\n"))
            } else {
                format!("{mark}: {}", truncate_string(translation.text().unwrap_or_default()))
            }
        }
        _ => format!("{mark}: *(empty)*"),
    };

    if let Some(comment) = &message.translator_comment {
        let _ = write!(value, " _({comment})_");
    }
    value
}

/// Cuts `s` to [`MAX_VALUE_LENGTH`] characters.
fn truncate_string(s: &str) -> String {
    let single_line = s.replace('\n', " ");
    if single_line.chars().count() <= MAX_VALUE_LENGTH {
        single_line
    } else {
        let truncated: String = single_line.chars().take(MAX_VALUE_LENGTH - 3).collect();
        format!("{truncated}...")
    }
}

/// Sorts entries: current, then primary languages, then the rest alphabetically.
fn sort_entries_by_priority(entries: &mut [Entry<'_>], primary_languages: Option<&[String]>) {
    entries.sort_by(|a, b| {
        let priority_a = get_language_priority(a, primary_languages);
        let priority_b = get_language_priority(b, primary_languages);

        match (priority_a, priority_b) {
            (LanguagePriority::Current, LanguagePriority::Current) => Ordering::Equal,
            (LanguagePriority::Current, _) => Ordering::Less,
            (_, LanguagePriority::Current) => Ordering::Greater,
            (LanguagePriority::Primary(a_idx), LanguagePriority::Primary(b_idx)) => {
                a_idx.cmp(&b_idx)
            }
            (LanguagePriority::Primary(_), _) => Ordering::Less,
            (_, LanguagePriority::Primary(_)) => Ordering::Greater,
            (LanguagePriority::Other(a_lang), LanguagePriority::Other(b_lang)) => {
                a_lang.cmp(b_lang)
            }
        }
    });
}

/// Language priority for sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LanguagePriority<'a> {
    /// Catalog under the cursor
    Current,
    /// Primary language with its position index
    Primary(usize),
    /// Other language (sorted alphabetically)
    Other(&'a str),
}

/// Priority of one entry.
fn get_language_priority<'a>(
    entry: &Entry<'a>,
    primary_languages: Option<&[String]>,
) -> LanguagePriority<'a> {
    if entry.current {
        return LanguagePriority::Current;
    }

    if let Some(primaries) = primary_languages
        && let Some(pos) = primaries.iter().position(|p| p == entry.language)
    {
        return LanguagePriority::Primary(pos);
    }

    LanguagePriority::Other(entry.language)
}
