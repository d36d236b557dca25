//! Go to Definition implementation

use std::path::{
    Path,
    PathBuf,
};

use tower_lsp::lsp_types::{
    Location,
    Position,
    Range,
    Url,
};

use crate::catalog::Message;
use crate::db::CatalogDatabase;
use crate::input::catalog::{
    CatalogFile,
    parsed_catalog,
};
use crate::types::SourcePosition;

/// Finds definition targets for the cursor in `file`.
///
/// On a `<location>` element the target is the referenced line of the application
/// source. Anywhere else in a message, the targets are the same message in the other
/// catalogs.
pub fn find_definitions(
    db: &dyn CatalogDatabase,
    file: CatalogFile,
    position: SourcePosition,
    catalogs: &[(PathBuf, CatalogFile)],
) -> Vec<Location> {
    let Some(message) = parsed_catalog(db, file).catalog.message_at(position) else {
        return Vec::new();
    };

    if let Some(location) = message.locations.iter().find(|l| l.range.contains(position)) {
        let catalog_path = Path::new(file.path(db));
        let target = catalog_path.parent().unwrap_or_else(|| Path::new("")).join(&location.filename);
        let line = location.line.map_or(0, |line| line.saturating_sub(1));

        return source_location(&target, line).into_iter().collect();
    }

    catalogs
        .iter()
        .filter(|(_, other)| *other != file)
        .filter_map(|(path, other)| {
            let found = parsed_catalog(db, *other).catalog.find_message(&message.key)?;
            message_location(path, found)
        })
        .collect()
}

/// Start of `line` in an application source file.
fn source_location(path: &Path, line: u32) -> Option<Location> {
    let Ok(uri) = Url::from_file_path(normalize(path)) else {
        tracing::warn!("Failed to create URI from file path: {}", path.display());
        return None;
    };
    let position = Position { line, character: 0 };
    Some(Location { uri, range: Range { start: position, end: position } })
}

/// The `<source>` of `message` in the catalog at `path`.
pub(crate) fn message_location(path: &Path, message: &Message) -> Option<Location> {
    let Ok(uri) = Url::from_file_path(path) else {
        tracing::warn!("Failed to create URI from file path: {}", path.display());
        return None;
    };
    Some(Location { uri, range: message.key_range().into() })
}

/// Resolves `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
