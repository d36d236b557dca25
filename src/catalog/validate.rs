//! Integrity checks over a parsed catalog.

use std::collections::{
    BTreeSet,
    HashMap,
};

use serde::Serialize;

use super::issue::{
    CatalogIssue,
    IssueKind,
};
use super::model::{
    Catalog,
    Message,
    MessageKey,
    Translation,
    TranslationState,
};
use super::numerus::NumerusRule;
use super::parser::ParsedCatalog;
use super::placeholder::{
    Placeholder,
    PlaceholderDiff,
    markup_tags,
    placeholders,
};

/// Knobs for [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// Compare rich-text tags between source and translation
    pub check_markup: bool,
    /// Language used for the numerus form count when the header has none
    pub language: Option<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self { check_markup: true, language: None }
    }
}

/// Structural findings of the parser followed by content checks, in document order.
#[must_use]
pub fn validate(parsed: &ParsedCatalog, options: &CheckOptions) -> Vec<CatalogIssue> {
    let mut issues = parsed.issues.clone();
    let catalog = &parsed.catalog;

    let language = catalog
        .header
        .language
        .as_deref()
        .filter(|language| !language.trim().is_empty())
        .or(options.language.as_deref());
    let rule = language.and_then(NumerusRule::for_language);

    let mut first_seen: HashMap<&MessageKey, &Message> = HashMap::new();
    for message in &catalog.messages {
        if let Some(first) = first_seen.get(&message.key) {
            issues.push(
                CatalogIssue::new(
                    IssueKind::DuplicateMessage,
                    message.key_range(),
                    format!("Duplicate message {}", describe_key(&message.key)),
                )
                .with_related(first.key_range(), "First defined here"),
            );
        } else {
            first_seen.insert(&message.key, message);
        }

        check_message(message, rule, options, &mut issues);
    }

    issues.sort_by_key(|issue| issue.range.start);
    issues
}

/// Per-message checks.
fn check_message(
    message: &Message,
    rule: Option<NumerusRule>,
    options: &CheckOptions,
    issues: &mut Vec<CatalogIssue>,
) {
    let state = message.state();
    match state {
        TranslationState::Vanished | TranslationState::Obsolete => {
            issues.push(CatalogIssue::new(
                IssueKind::Vanished,
                message.translation_range(),
                format!("Translation is {}: the source string is no longer used", state.label()),
            ));
        }
        TranslationState::Unfinished => {
            issues.push(CatalogIssue::new(
                IssueKind::Unfinished,
                message.translation_range(),
                "Translation is unfinished",
            ));
        }
        TranslationState::Finished => {}
    }

    let Some(translation) = &message.translation else {
        return;
    };

    if state != TranslationState::Unfinished {
        check_empty(message, translation, issues);
    }
    if state.is_retired() {
        return;
    }

    if message.numerus
        && let Some(rule) = rule
        && !translation.is_empty()
        && translation.forms.len() != rule.form_count()
    {
        issues.push(CatalogIssue::new(
            IssueKind::NumerusForms,
            translation.range,
            format!(
                "Expected {} numerus forms, found {}",
                rule.form_count(),
                translation.forms.len()
            ),
        ));
    }

    if !translation.is_empty() {
        check_placeholders(message, translation, issues);
        if options.check_markup {
            check_markup(message, translation, issues);
        }
    }
}

/// Empty translation or empty numerus forms.
fn check_empty(message: &Message, translation: &Translation, issues: &mut Vec<CatalogIssue>) {
    if translation.is_empty() {
        issues.push(CatalogIssue::new(
            IssueKind::EmptyTranslation,
            translation.range,
            format!(
                "Translation of {} is empty but not marked unfinished",
                describe_key(&message.key)
            ),
        ));
        return;
    }
    for (index, form) in translation.forms.iter().enumerate() {
        if form.is_empty() {
            issues.push(CatalogIssue::new(
                IssueKind::EmptyTranslation,
                translation.range,
                format!("Numerus form {} is empty", index + 1),
            ));
        }
    }
}

/// Numbered arguments per form, then `%n` across forms.
fn check_placeholders(message: &Message, translation: &Translation, issues: &mut Vec<CatalogIssue>) {
    let source = placeholders(&message.key.source);
    let numbered_source: BTreeSet<Placeholder> =
        source.iter().copied().filter(|p| *p != Placeholder::Count).collect();

    let mut count_used = false;
    for (index, form) in translation.forms.iter().enumerate().filter(|(_, f)| !f.is_empty()) {
        let found = placeholders(form);
        count_used |= found.contains(&Placeholder::Count);

        let mut numbered: BTreeSet<Placeholder> = found;
        let has_count = numbered.remove(&Placeholder::Count);
        let mut diff = PlaceholderDiff::between(&numbered_source, &numbered);
        if has_count && !source.contains(&Placeholder::Count) {
            diff.unexpected.insert(Placeholder::Count);
        }
        if !diff.is_empty() {
            let label = if translation.forms.len() > 1 {
                format!("Numerus form {}", index + 1)
            } else {
                "Translation".to_string()
            };
            issues.push(CatalogIssue::new(
                IssueKind::PlaceholderMismatch,
                translation.range,
                format!("{label} {}", describe_diff(&diff)),
            ));
        }
    }

    if source.contains(&Placeholder::Count) && !count_used {
        issues.push(CatalogIssue::new(
            IssueKind::PlaceholderMismatch,
            translation.range,
            "No numerus form uses %n",
        ));
    }
}

/// Rich-text tag multiset per form.
fn check_markup(message: &Message, translation: &Translation, issues: &mut Vec<CatalogIssue>) {
    let source = markup_tags(&message.key.source);
    for form in translation.forms.iter().filter(|f| !f.is_empty()) {
        let tags = markup_tags(form);
        if tags != source {
            let expected: Vec<String> = source.keys().map(|tag| format!("<{tag}>")).collect();
            let found: Vec<String> = tags.keys().map(|tag| format!("<{tag}>")).collect();
            issues.push(CatalogIssue::new(
                IssueKind::MarkupMismatch,
                translation.range,
                format!(
                    "Rich-text tags differ from the source (expected [{}], found [{}])",
                    expected.join(", "),
                    found.join(", ")
                ),
            ));
            return;
        }
    }
}

/// Human-readable message key.
fn describe_key(key: &MessageKey) -> String {
    if key.has_comment() {
        format!("\"{}\" ({}) in context \"{}\"", key.source, key.comment, key.context)
    } else {
        format!("\"{}\" in context \"{}\"", key.source, key.context)
    }
}

/// Human-readable placeholder difference.
fn describe_diff(diff: &PlaceholderDiff) -> String {
    let join = |set: &BTreeSet<Placeholder>| {
        set.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    };
    match (diff.missing.is_empty(), diff.unexpected.is_empty()) {
        (false, true) => format!("is missing {}", join(&diff.missing)),
        (true, false) => format!("has unexpected {}", join(&diff.unexpected)),
        _ => format!(
            "is missing {} and has unexpected {}",
            join(&diff.missing),
            join(&diff.unexpected)
        ),
    }
}

/// Per-state message counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatistics {
    pub total: usize,
    pub finished: usize,
    pub unfinished: usize,
    /// Vanished and obsolete
    pub vanished: usize,
    /// Live messages without any translated text
    pub empty: usize,
    /// Finished share of live messages, in thousandths
    pub completion_per_mille: u32,
}

impl CatalogStatistics {
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut stats = Self { total: catalog.messages.len(), ..Self::default() };

        for message in &catalog.messages {
            match message.state() {
                TranslationState::Finished => stats.finished += 1,
                TranslationState::Unfinished => stats.unfinished += 1,
                TranslationState::Vanished | TranslationState::Obsolete => {
                    stats.vanished += 1;
                    continue;
                }
            }
            if message.translation.as_ref().is_none_or(Translation::is_empty) {
                stats.empty += 1;
            }
        }

        let live = stats.finished + stats.unfinished;
        stats.completion_per_mille = if live == 0 {
            0
        } else {
            u32::try_from(stats.finished * 1000 / live).unwrap_or(1000)
        };
        stats
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::catalog::parse_catalog;

    fn wrap(language: &str, messages: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<TS version=\"2.1\" language=\"{language}\">\n<context>\n<name>DFMVaultView</name>\n{messages}\n</context>\n</TS>\n"
        )
    }

    fn kinds(text: &str) -> Vec<IssueKind> {
        validate(&parse_catalog(text), &CheckOptions::default())
            .into_iter()
            .map(|issue| issue.kind)
            .collect()
    }

    #[rstest]
    fn clean_catalog_has_no_findings() {
        let text = wrap(
            "fi",
            r#"<message><source>Unlock %1</source><translation>Avaa %1</translation></message>
<message numerus="yes"><source>%n item(s)</source><translation><numerusform>%n kohde</numerusform><numerusform>%n kohdetta</numerusform></translation></message>"#,
        );

        assert_eq!(kinds(&text), Vec::<IssueKind>::new());
    }

    #[rstest]
    #[case::empty_finished(
        r#"<message><source>Vault</source><translation></translation></message>"#,
        vec![IssueKind::EmptyTranslation]
    )]
    #[case::empty_unfinished(
        r#"<message><source>Vault</source><translation type="unfinished"></translation></message>"#,
        vec![IssueKind::Unfinished]
    )]
    #[case::missing_argument(
        r#"<message><source>Copy %1 to %2</source><translation>Kopioi %1</translation></message>"#,
        vec![IssueKind::PlaceholderMismatch]
    )]
    #[case::localized_argument_is_same(
        r#"<message><source>%1 GB</source><translation>%L1 Gt</translation></message>"#,
        vec![]
    )]
    #[case::unfinished_is_checked(
        r#"<message><source>%1 left</source><translation type="unfinished">%2 jäljellä</translation></message>"#,
        vec![IssueKind::PlaceholderMismatch, IssueKind::Unfinished]
    )]
    #[case::vanished_is_not_checked(
        r#"<message><source>%1 left</source><translation type="vanished">jäljellä</translation></message>"#,
        vec![IssueKind::Vanished]
    )]
    #[case::markup(
        r#"<message><source>&lt;b&gt;Vault&lt;/b&gt;</source><translation>Holvi</translation></message>"#,
        vec![IssueKind::MarkupMismatch]
    )]
    #[case::wrong_form_count(
        r#"<message numerus="yes"><source>%n item(s)</source><translation><numerusform>%n kohdetta</numerusform></translation></message>"#,
        vec![IssueKind::NumerusForms]
    )]
    fn reports_content_problems(#[case] messages: &str, #[case] expected: Vec<IssueKind>) {
        let mut found = kinds(&wrap("fi", messages));
        found.sort();
        let mut expected = expected;
        expected.sort();

        assert_eq!(found, expected);
    }

    #[rstest]
    fn count_marker_needs_only_one_form() {
        let text = wrap(
            "ru",
            r#"<message numerus="yes"><source>%n file(s) in %1</source><translation><numerusform>один файл в %1</numerusform><numerusform>%n файла в %1</numerusform><numerusform>%n файлов в %1</numerusform></translation></message>"#,
        );

        assert_eq!(kinds(&text), Vec::<IssueKind>::new());
    }

    #[rstest]
    fn count_marker_missing_everywhere() {
        let text = wrap(
            "fi",
            r#"<message numerus="yes"><source>%n item(s)</source><translation><numerusform>yksi</numerusform><numerusform>monta</numerusform></translation></message>"#,
        );

        assert_eq!(kinds(&text), vec![IssueKind::PlaceholderMismatch]);
    }

    #[rstest]
    fn numbered_argument_checked_per_form() {
        let text = wrap(
            "fi",
            r#"<message numerus="yes"><source>%n file(s) in %1</source><translation><numerusform>%n tiedosto kohteessa %1</numerusform><numerusform>%n tiedostoa</numerusform></translation></message>"#,
        );

        let issues = validate(&parse_catalog(&text), &CheckOptions::default());

        assert_that!(
            issues,
            contains(field!(CatalogIssue.message, contains_substring("Numerus form 2 is missing %1")))
        );
    }

    #[googletest::test]
    fn duplicate_points_at_first_occurrence() {
        let text = wrap(
            "fi",
            "<message><source>Vault</source><translation>Holvi</translation></message>\n<message><source>Vault</source><translation>Kassakaappi</translation></message>",
        );

        let issues = validate(&parse_catalog(&text), &CheckOptions::default());

        expect_that!(issues, len(eq(1)));
        let duplicate = &issues[0];
        assert_eq!(duplicate.kind, IssueKind::DuplicateMessage);
        expect_that!(duplicate.related, len(eq(1)));
        expect_that!(duplicate.range.start.line, eq(5));
        expect_that!(duplicate.related[0].range.start.line, eq(4));
    }

    #[rstest]
    fn same_source_with_different_comment_is_not_duplicate() {
        let text = wrap(
            "fi",
            "<message><source>copy</source><translation>kopioi</translation></message>\n<message><source>copy</source><comment>noun</comment><translation>kopio</translation></message>",
        );

        assert_eq!(kinds(&text), Vec::<IssueKind>::new());
    }

    #[rstest]
    fn markup_check_can_be_disabled() {
        let text = wrap(
            "fi",
            r#"<message><source>&lt;b&gt;Vault&lt;/b&gt;</source><translation>Holvi</translation></message>"#,
        );
        let options = CheckOptions { check_markup: false, ..CheckOptions::default() };

        assert!(validate(&parse_catalog(&text), &options).is_empty());
    }

    #[rstest]
    #[case::turkish("tr", "%n dosya")]
    #[case::hungarian("hu", "%n fájl")]
    #[case::persian("fa", "%n فایل")]
    fn single_form_languages_take_one_numerus_form(#[case] language: &str, #[case] form: &str) {
        let text = wrap(
            language,
            &format!(
                r#"<message numerus="yes"><source>%n file(s)</source><translation><numerusform>{form}</numerusform></translation></message>"#
            ),
        );

        assert_eq!(kinds(&text), Vec::<IssueKind>::new());
    }

    #[rstest]
    fn language_option_used_without_header() {
        let text = wrap(
            "",
            r#"<message numerus="yes"><source>%n item(s)</source><translation><numerusform>%n</numerusform></translation></message>"#,
        );
        let options = CheckOptions { language: Some("ja".to_string()), ..CheckOptions::default() };

        assert!(validate(&parse_catalog(&text), &options).is_empty());
    }

    #[googletest::test]
    fn counts_statistics() {
        let text = wrap(
            "fi",
            r#"<message><source>a</source><translation>A</translation></message>
<message><source>b</source><translation>B</translation></message>
<message><source>c</source><translation>C</translation></message>
<message><source>d</source><translation type="unfinished"></translation></message>
<message><source>e</source><translation type="vanished">E</translation></message>"#,
        );

        let stats = CatalogStatistics::from_catalog(&parse_catalog(&text).catalog);

        expect_that!(stats.total, eq(5));
        expect_that!(stats.finished, eq(3));
        expect_that!(stats.unfinished, eq(1));
        expect_that!(stats.vanished, eq(1));
        expect_that!(stats.empty, eq(1));
        expect_that!(stats.completion_per_mille, eq(750));
    }
}
