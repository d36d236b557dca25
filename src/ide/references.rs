//! References implementation

use std::path::PathBuf;

use tower_lsp::lsp_types::Location;

use crate::catalog::MessageKey;
use crate::db::CatalogDatabase;
use crate::ide::goto_definition::message_location;
use crate::input::catalog::{
    CatalogFile,
    parsed_catalog,
};

/// Every occurrence of `key` across `catalogs`, duplicates included.
///
/// With `exclude` set, the message at that catalog's first occurrence is left out,
/// for clients that ask for references without the declaration.
pub fn find_references(
    db: &dyn CatalogDatabase,
    key: &MessageKey,
    catalogs: &[(PathBuf, CatalogFile)],
    exclude: Option<CatalogFile>,
) -> Vec<Location> {
    let mut locations = Vec::new();

    for (path, file) in catalogs {
        let catalog = &parsed_catalog(db, *file).catalog;
        let mut matching = catalog.messages.iter().filter(|message| &message.key == key);
        if exclude == Some(*file) {
            matching.next();
        }
        locations.extend(matching.filter_map(|message| message_location(path, message)));
    }

    locations
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::db::CatalogDatabaseImpl;

    const FINNISH: &str = r#"<TS version="2.1" language="fi">
<context>
    <name>DFMOpenWithDialog</name>
    <message>
        <source>Open with</source>
        <translation>Avaa sovelluksella</translation>
    </message>
    <message>
        <source>Cancel</source>
        <translation>Peru</translation>
    </message>
</context>
</TS>
"#;

    /// Finnish, Arabic (with a duplicate of the key) and an unrelated catalog.
    fn catalogs(db: &CatalogDatabaseImpl) -> Vec<(PathBuf, CatalogFile)> {
        let arabic = FINNISH
            .replace("\"fi\"", "\"ar\"")
            .replace("<source>Cancel</source>", "<source>Open with</source>");
        let other = FINNISH.replace("DFMOpenWithDialog", "DFMTagWidget");
        [("app_fi.ts", FINNISH.to_string()), ("app_ar.ts", arabic), ("app_km.ts", other)]
            .into_iter()
            .map(|(name, text)| {
                let path = PathBuf::from("/ws/translations").join(name);
                (path.clone(), CatalogFile::new(db, path.display().to_string(), text))
            })
            .collect()
    }

    fn key() -> MessageKey {
        MessageKey::new("DFMOpenWithDialog", "Open with", "")
    }

    #[rstest]
    fn finds_every_catalog_with_the_key() {
        let db = CatalogDatabaseImpl::default();
        let catalogs = catalogs(&db);

        let locations = find_references(&db, &key(), &catalogs, None);

        let files: Vec<_> = locations.iter().map(|l| l.uri.path().to_string()).collect();
        assert_eq!(
            files,
            ["/ws/translations/app_fi.ts", "/ws/translations/app_ar.ts", "/ws/translations/app_ar.ts"]
        );
        assert_that!(locations[1].range.start.line, eq(4));
        assert_that!(locations[2].range.start.line, eq(8));
    }

    #[rstest]
    fn can_exclude_the_declaration() {
        let db = CatalogDatabaseImpl::default();
        let catalogs = catalogs(&db);

        let locations = find_references(&db, &key(), &catalogs, Some(catalogs[0].1));

        assert_that!(locations, len(eq(2)));
        assert!(locations.iter().all(|l| l.uri.path().ends_with("app_ar.ts")));
    }
}
