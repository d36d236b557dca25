//! Catalog file input and its derived queries.

use std::borrow::Cow;
use std::path::Path;

use crate::catalog::{
    CatalogIndex,
    LookupPolicy,
    ParsedCatalog,
    UNKNOWN_LANGUAGE,
    catalog_language,
    parse_catalog,
};
use crate::db::CatalogDatabase;

/// Salsa input representing one `.ts` file.
#[salsa::input]
pub struct CatalogFile {
    /// Absolute file path
    #[returns(ref)]
    pub path: String,

    /// File contents
    #[returns(ref)]
    pub text: String,
}

/// Parses the catalog. Re-runs only when the file's text changes.
#[salsa::tracked(returns(ref))]
pub fn parsed_catalog(db: &dyn CatalogDatabase, file: CatalogFile) -> ParsedCatalog {
    let text = file.text(db);
    let parsed = parse_catalog(text);
    tracing::debug!(
        path = %file.path(db),
        messages = parsed.catalog.messages.len(),
        issues = parsed.issues.len(),
        "Parsed catalog"
    );
    parsed
}

/// Lookup index with unfinished translations included.
#[salsa::tracked(returns(ref))]
pub fn catalog_index(db: &dyn CatalogDatabase, file: CatalogFile) -> CatalogIndex {
    build_index(db, file, LookupPolicy::default())
}

/// Language of the catalog, from its header or file name.
#[salsa::tracked(returns(ref))]
pub fn catalog_file_language(db: &dyn CatalogDatabase, file: CatalogFile) -> String {
    catalog_language(&parsed_catalog(db, file).catalog, Path::new(file.path(db)))
}

/// Index honoring `policy`. The default policy borrows the cached [`catalog_index`].
#[must_use]
pub fn catalog_index_with_policy(
    db: &dyn CatalogDatabase,
    file: CatalogFile,
    policy: LookupPolicy,
) -> Cow<'_, CatalogIndex> {
    if policy == LookupPolicy::default() {
        return Cow::Borrowed(catalog_index(db, file));
    }
    Cow::Owned(build_index(db, file, policy))
}

/// Indexes the parsed catalog under its resolved language.
fn build_index(db: &dyn CatalogDatabase, file: CatalogFile, policy: LookupPolicy) -> CatalogIndex {
    let index = CatalogIndex::with_policy(&parsed_catalog(db, file).catalog, policy);
    let language = catalog_file_language(db, file);
    if language == UNKNOWN_LANGUAGE { index } else { index.with_language(language.as_str()) }
}

/// Loads a catalog file from disk into the database.
pub fn load_catalog_file(
    db: &dyn CatalogDatabase,
    file_path: &Path,
) -> Result<CatalogFile, std::io::Error> {
    let text = std::fs::read_to_string(file_path)?;
    Ok(CatalogFile::new(db, file_path.to_string_lossy().to_string(), text))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use salsa::Setter;

    use super::*;
    use crate::db::CatalogDatabaseImpl;

    const KHMER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<TS version="2.1" language="km_KH">
<context>
    <name>DesktopItemDelegate</name>
    <message>
        <source>Rename</source>
        <translation>ប្តូរឈ្មោះ</translation>
    </message>
</context>
</TS>
"#;

    #[googletest::test]
    fn parses_and_indexes_input() {
        let db = CatalogDatabaseImpl::default();
        let file = CatalogFile::new(&db, "/ws/translations/dde-desktop_km_KH.ts".to_string(), KHMER.to_string());

        expect_that!(parsed_catalog(&db, file).catalog.messages, len(eq(1)));
        assert_eq!(catalog_index(&db, file).translate("DesktopItemDelegate", "Rename", ""), Some("ប្តូរឈ្មោះ"));
        expect_that!(catalog_file_language(&db, file), eq("km_KH"));
    }

    #[googletest::test]
    fn reparses_after_text_change() {
        let mut db = CatalogDatabaseImpl::default();
        let file = CatalogFile::new(&db, "/ws/translations/app_km.ts".to_string(), KHMER.to_string());
        expect_that!(parsed_catalog(&db, file).issues, is_empty());

        file.set_text(&mut db).to(KHMER.replace("</context>", ""));

        expect_that!(parsed_catalog(&db, file).issues, not(is_empty()));
    }

    #[rstest]
    fn strict_policy_skips_unfinished() {
        let db = CatalogDatabaseImpl::default();
        let text = KHMER.replace("<translation>", "<translation type=\"unfinished\">");
        let file = CatalogFile::new(&db, "/ws/app_km.ts".to_string(), text);

        let strict =
            catalog_index_with_policy(&db, file, LookupPolicy { include_unfinished: false });

        assert_eq!(strict.translate("DesktopItemDelegate", "Rename", ""), None);
        assert!(catalog_index(&db, file).translate("DesktopItemDelegate", "Rename", "").is_some());
    }

    #[rstest]
    fn default_policy_borrows_the_cached_index() {
        let db = CatalogDatabaseImpl::default();
        let file = CatalogFile::new(&db, "/ws/app_km.ts".to_string(), KHMER.to_string());

        let index = catalog_index_with_policy(&db, file, LookupPolicy::default());

        let Cow::Borrowed(borrowed) = index else {
            panic!("Expected the cached index");
        };
        assert!(std::ptr::eq(borrowed, catalog_index(&db, file)));
    }

    #[rstest]
    fn index_uses_language_from_file_name() {
        let db = CatalogDatabaseImpl::default();
        let text = r#"<TS version="2.1" language="">
<context>
    <name>DFMVaultView</name>
    <message numerus="yes">
        <source>%n file(s)</source>
        <translation><numerusform>لا ملفات</numerusform><numerusform>ملف واحد</numerusform><numerusform>ملفان</numerusform><numerusform>%n ملفات</numerusform><numerusform>%n ملفًا</numerusform><numerusform>%n ملف</numerusform></translation>
    </message>
</context>
</TS>"#;
        let file = CatalogFile::new(
            &db,
            "/ws/translations/dde-file-manager_ar.ts".to_string(),
            text.to_string(),
        );

        let index = catalog_index(&db, file);
        let strict = catalog_index_with_policy(&db, file, LookupPolicy { include_unfinished: false });

        assert_eq!(index.language(), Some("ar"));
        assert_that!(index.translate_plural("DFMVaultView", "%n file(s)", "", 2), eq("ملفان"));
        assert_that!(strict.translate_plural("DFMVaultView", "%n file(s)", "", 2), eq("ملفان"));
    }

    #[rstest]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dde-desktop_km_KH.ts");
        std::fs::write(&path, KHMER).unwrap();
        let db = CatalogDatabaseImpl::default();

        let file = load_catalog_file(&db, &path).unwrap();

        assert_eq!(file.text(&db), KHMER);
    }
}
