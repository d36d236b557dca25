//! Quick fixes on catalog messages.

use std::collections::HashMap;

use tower_lsp::lsp_types::{
    CodeAction,
    CodeActionKind,
    CodeActionOrCommand,
    Diagnostic,
    NumberOrString,
    Range,
    TextEdit,
    Url,
    WorkspaceEdit,
};

use crate::catalog::{
    IssueKind,
    Message,
    TranslationState,
};
use crate::db::CatalogDatabase;
use crate::input::catalog::{
    CatalogFile,
    parsed_catalog,
};
use crate::types::{
    LineIndex,
    SourceRange,
};

/// Title of the quick fix that drops `type="unfinished"`.
pub const MARK_FINISHED_TITLE: &str = "Mark translation as finished";

/// Offers "Mark translation as finished" for every non-empty unfinished
/// translation whose message intersects `range`.
pub fn generate_code_actions(
    db: &dyn CatalogDatabase,
    file: CatalogFile,
    uri: &Url,
    range: SourceRange,
    diagnostics: &[Diagnostic],
) -> Vec<CodeActionOrCommand> {
    let text = file.text(db);
    let lines = LineIndex::new(text);

    parsed_catalog(db, file)
        .catalog
        .messages
        .iter()
        .filter(|message| intersects(message.range, range))
        .filter_map(|message| {
            let edit = mark_finished_edit(text, &lines, message)?;
            let fixed = unfinished_diagnostics(diagnostics, message.translation_range());

            Some(CodeActionOrCommand::CodeAction(CodeAction {
                title: MARK_FINISHED_TITLE.to_string(),
                kind: Some(CodeActionKind::QUICKFIX),
                diagnostics: (!fixed.is_empty()).then_some(fixed),
                edit: Some(WorkspaceEdit {
                    changes: Some(HashMap::from([(uri.clone(), vec![edit])])),
                    document_changes: None,
                    change_annotations: None,
                }),
                command: None,
                is_preferred: Some(true),
                disabled: None,
                data: None,
            }))
        })
        .collect()
}

/// Rewrites the opening `<translation>` tag of `message` without its `type` attribute.
fn mark_finished_edit(text: &str, lines: &LineIndex<'_>, message: &Message) -> Option<TextEdit> {
    let translation = message.translation.as_ref()?;
    if translation.state != TranslationState::Unfinished || translation.is_empty() {
        return None;
    }

    let start = lines.offset(translation.open_tag_range.start);
    let end = lines.offset(translation.open_tag_range.end);
    let tag = text.get(start..end)?;

    Some(TextEdit { range: translation.open_tag_range.into(), new_text: remove_type_attribute(tag)? })
}

/// Drops ` type="unfinished"` (either quote style) from an opening tag.
fn remove_type_attribute(tag: &str) -> Option<String> {
    let (start, len) = ["type=\"unfinished\"", "type='unfinished'"]
        .iter()
        .find_map(|attribute| tag.find(attribute).map(|index| (index, attribute.len())))?;

    let before = tag.get(..start)?.trim_end();
    let after = tag.get(start + len..)?;
    let separator = if after.starts_with(['>', '/']) || before.ends_with('<') { "" } else { " " };
    Some(format!("{before}{separator}{}", after.trim_start()))
}

/// Client diagnostics about the unfinished state on `range`.
fn unfinished_diagnostics(diagnostics: &[Diagnostic], range: SourceRange) -> Vec<Diagnostic> {
    let range = Range::from(range);
    diagnostics
        .iter()
        .filter(|d| {
            d.range == range
                && matches!(&d.code, Some(NumberOrString::String(code)) if code == IssueKind::Unfinished.code())
        })
        .cloned()
        .collect()
}

/// True when the two ranges share at least one position.
const fn intersects(a: SourceRange, b: SourceRange) -> bool {
    a.contains(b.start) || a.contains(b.end) || b.contains(a.start)
}
