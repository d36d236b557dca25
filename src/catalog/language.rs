//! Target language of a catalog.

use std::path::Path;

use super::model::Catalog;

/// Label used when neither the header nor the file name names a language.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Language of `catalog`: the `language` attribute, else the file name suffix.
#[must_use]
pub fn catalog_language(catalog: &Catalog, path: &Path) -> String {
    catalog
        .header
        .language
        .as_deref()
        .map(str::trim)
        .filter(|language| !language.is_empty())
        .map(ToString::to_string)
        .or_else(|| language_from_path(path))
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
}

/// Infers a locale from names such as `dde-desktop_gl_ES.ts` or `app_ar.ts`.
#[must_use]
pub fn language_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let parts: Vec<&str> = stem.split('_').collect();

    match parts.as_slice() {
        [.., project, language, territory]
            if !project.is_empty() && is_language(language) && is_territory(territory) =>
        {
            Some(format!("{language}_{territory}"))
        }
        [.., project, language] if !project.is_empty() && is_language(language) => {
            Some((*language).to_string())
        }
        [language] if is_language(language) => Some((*language).to_string()),
        _ => None,
    }
}

/// Two or three lowercase letters.
fn is_language(part: &str) -> bool {
    (2..=3).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_lowercase())
}

/// `ES`, `BR`, or a script/region such as `Hant` or `419`.
fn is_territory(part: &str) -> bool {
    let uppercase = part.len() == 2 && part.bytes().all(|b| b.is_ascii_uppercase());
    let numeric = part.len() == 3 && part.bytes().all(|b| b.is_ascii_digit());
    let script = part.len() == 4
        && part.starts_with(|c: char| c.is_ascii_uppercase())
        && part.bytes().skip(1).all(|b| b.is_ascii_lowercase());
    uppercase || numeric || script
}
