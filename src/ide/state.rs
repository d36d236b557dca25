//! Shared state of the language server.

use std::collections::{
    HashMap,
    HashSet,
};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{
    Mutex,
    MutexGuard,
};
use tower_lsp::lsp_types::Url;

use crate::db::CatalogDatabaseImpl;
use crate::input::catalog::CatalogFile;

/// State shared between handlers.
///
/// # Lock order
///
/// When several locks are held at once, take them in this order:
/// 1. `db`
/// 2. `catalogs`
/// 3. `opened_files`
/// 4. `pending_updates`
#[derive(Clone)]
pub struct ServerState {
    /// Salsa database
    pub db: Arc<Mutex<CatalogDatabaseImpl>>,
    /// Indexed catalogs by absolute path
    pub catalogs: Arc<Mutex<HashMap<PathBuf, CatalogFile>>>,
    /// Documents currently open in the client
    pub opened_files: Arc<Mutex<HashSet<Url>>>,
    /// Latest text of documents edited while indexing
    pub pending_updates: Arc<Mutex<HashMap<Url, String>>>,
}

impl ServerState {
    #[must_use]
    pub fn new(db: CatalogDatabaseImpl) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            catalogs: Arc::new(Mutex::new(HashMap::new())),
            opened_files: Arc::new(Mutex::new(HashSet::new())),
            pending_updates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Takes `db` then `catalogs`.
    pub async fn lock_db_and_catalogs(
        &self,
    ) -> (MutexGuard<'_, CatalogDatabaseImpl>, MutexGuard<'_, HashMap<PathBuf, CatalogFile>>) {
        let db = self.db.lock().await;
        let catalogs = self.catalogs.lock().await;
        (db, catalogs)
    }

    /// Snapshot of every indexed catalog, sorted by path.
    pub async fn catalog_list(&self) -> Vec<(PathBuf, CatalogFile)> {
        let catalogs = self.catalogs.lock().await;
        let mut list: Vec<_> = catalogs.iter().map(|(path, file)| (path.clone(), *file)).collect();
        list.sort_by(|(a, _), (b, _)| a.cmp(b));
        list
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("db", &"<CatalogDatabaseImpl>")
            .field("catalogs", &"<HashMap<PathBuf, CatalogFile>>")
            .field("opened_files", &"<HashSet<Url>>")
            .field("pending_updates", &"<HashMap<Url, String>>")
            .finish()
    }
}
