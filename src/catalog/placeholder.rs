//! `%1`-style argument markers and rich-text tags inside message text.

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::fmt;

/// A substitution marker. `%L1` and `%1` are the same argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Placeholder {
    /// `%1` .. `%99`
    Argument(u8),
    /// `%n`, the count of a numerus message
    Count,
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument(number) => write!(f, "%{number}"),
            Self::Count => f.write_str("%n"),
        }
    }
}

/// A marker found in a text, with the byte span it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker {
    /// What was found
    placeholder: Placeholder,
    /// Byte offset of `%`
    start: usize,
    /// Byte offset past the marker
    end: usize,
}

/// Scans `text` for markers. At most two digits are read, like `QString::arg`.
fn scan(text: &str) -> Vec<Marker> {
    let bytes = text.as_bytes();
    let mut markers = Vec::new();
    let mut index = 0;

    while let Some(relative) = bytes.get(index..).and_then(|rest| rest.iter().position(|&b| b == b'%'))
    {
        let start = index + relative;
        let mut cursor = start + 1;
        if bytes.get(cursor) == Some(&b'L') {
            cursor += 1;
        }

        match bytes.get(cursor) {
            Some(b'n') => {
                markers.push(Marker { placeholder: Placeholder::Count, start, end: cursor + 1 });
                index = cursor + 1;
            }
            Some(digit) if digit.is_ascii_digit() && *digit != b'0' => {
                let mut number = digit - b'0';
                cursor += 1;
                if let Some(second) = bytes.get(cursor).filter(|b| b.is_ascii_digit()) {
                    number = number * 10 + (second - b'0');
                    cursor += 1;
                }
                markers.push(Marker { placeholder: Placeholder::Argument(number), start, end: cursor });
                index = cursor;
            }
            _ => index = start + 1,
        }
    }

    markers
}

/// Distinct placeholders used by `text`.
#[must_use]
pub fn placeholders(text: &str) -> BTreeSet<Placeholder> {
    scan(text).into_iter().map(|marker| marker.placeholder).collect()
}

/// Replaces `%1`, `%2`... with `args[0]`, `args[1]`...
///
/// Markers without a matching argument, and `%n`, are left untouched.
#[must_use]
pub fn fill_placeholders(text: &str, args: &[&str]) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for marker in scan(text) {
        let Placeholder::Argument(number) = marker.placeholder else {
            continue;
        };
        let Some(arg) = args.get(usize::from(number) - 1) else {
            continue;
        };
        result.push_str(text.get(last..marker.start).unwrap_or_default());
        result.push_str(arg);
        last = marker.end;
    }

    result.push_str(text.get(last..).unwrap_or_default());
    result
}

/// Replaces every `%n` / `%Ln` with `count`.
#[must_use]
pub fn fill_count(text: &str, count: i64) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for marker in scan(text).into_iter().filter(|m| m.placeholder == Placeholder::Count) {
        result.push_str(text.get(last..marker.start).unwrap_or_default());
        result.push_str(&count.to_string());
        last = marker.end;
    }

    result.push_str(text.get(last..).unwrap_or_default());
    result
}

/// Differences between the placeholders of a source and a translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderDiff {
    /// In the source, absent from the translation
    pub missing: BTreeSet<Placeholder>,
    /// In the translation, absent from the source
    pub unexpected: BTreeSet<Placeholder>,
}

impl PlaceholderDiff {
    #[must_use]
    pub fn between(source: &BTreeSet<Placeholder>, translation: &BTreeSet<Placeholder>) -> Self {
        Self {
            missing: source.difference(translation).copied().collect(),
            unexpected: translation.difference(source).copied().collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Rich-text tag names (`b`, `/b`, `br`, `a`...) with their counts.
#[must_use]
pub fn markup_tags(text: &str) -> BTreeMap<String, usize> {
    let mut tags = BTreeMap::new();
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        let after = rest.get(open + 1..).unwrap_or_default();
        let Some(close) = after.find('>') else {
            break;
        };
        let inner = after.get(..close).unwrap_or_default();
        let (slash, body) =
            inner.strip_prefix('/').map_or(("", inner), |stripped| ("/", stripped));
        let name: String = body
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if !name.is_empty() && body.starts_with(|c: char| c.is_ascii_alphabetic()) {
            *tags.entry(format!("{slash}{name}")).or_insert(0) += 1;
        }
        rest = after.get(close + 1..).unwrap_or_default();
    }

    tags
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::none("Icon size", &[])]
    #[case::numbered("Failed to open %1, %2 left", &[Placeholder::Argument(1), Placeholder::Argument(2)])]
    #[case::localized("%L1 files", &[Placeholder::Argument(1)])]
    #[case::two_digits("%12 and %3", &[Placeholder::Argument(3), Placeholder::Argument(12)])]
    #[case::count("%n item(s)", &[Placeholder::Count])]
    #[case::localized_count("%Ln item(s)", &[Placeholder::Count])]
    #[case::glued("Mount partition%1 to be read only", &[Placeholder::Argument(1)])]
    #[case::not_markers("100% done, %0 and %x", &[])]
    fn finds_placeholders(#[case] text: &str, #[case] expected: &[Placeholder]) {
        let found: Vec<_> = placeholders(text).into_iter().collect();

        assert_eq!(found, expected);
    }

    #[rstest]
    #[case::in_order("Copy %1 to %2", &["a", "b"], "Copy a to b")]
    #[case::reordered("%2 ← %1", &["a", "b"], "b ← a")]
    #[case::repeated("%1/%1", &["x"], "x/x")]
    #[case::missing_argument("%1 of %2", &["one"], "one of %2")]
    #[case::localized("%L1 GB", &["4"], "4 GB")]
    fn fills_arguments(#[case] text: &str, #[case] args: &[&str], #[case] expected: &str) {
        assert_that!(fill_placeholders(text, args), eq(expected));
    }

    #[rstest]
    fn fills_count_markers() {
        assert_that!(fill_count("%n tiedostoa (%Ln)", 3), eq("3 tiedostoa (3)"));
    }

    #[rstest]
    fn diff_reports_missing_and_unexpected() {
        let source = placeholders("%1 of %2");
        let translation = placeholders("%1 / %3");

        let diff = PlaceholderDiff::between(&source, &translation);

        assert_eq!(diff.missing.into_iter().collect::<Vec<_>>(), vec![Placeholder::Argument(2)]);
        assert_eq!(diff.unexpected.into_iter().collect::<Vec<_>>(), vec![Placeholder::Argument(3)]);
    }

    #[rstest]
    fn diff_ignores_order() {
        let diff = PlaceholderDiff::between(&placeholders("%1 → %2"), &placeholders("%2 ← %1"));

        assert!(diff.is_empty());
    }

    #[googletest::test]
    fn collects_markup_tags() {
        let tags = markup_tags("<b>Bold</b> text<br/> and <A href=\"x\">link</a>, 1 < 2");

        expect_that!(tags.get("b"), some(eq(&1)));
        expect_that!(tags.get("/b"), some(eq(&1)));
        expect_that!(tags.get("br"), some(eq(&1)));
        expect_that!(tags.get("a"), some(eq(&1)));
        expect_that!(tags.get("/a"), some(eq(&1)));
        expect_that!(tags.len(), eq(5));
    }
}
