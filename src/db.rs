//! Salsa database definitions.

/// Database trait for catalog queries.
#[salsa::db]
pub trait CatalogDatabase: salsa::Database {}

/// Database implementation used by the server and the checker.
#[salsa::db]
#[derive(Clone, Default)]
pub struct CatalogDatabaseImpl {
    /// Salsa storage
    storage: salsa::Storage<Self>,
}

impl std::fmt::Debug for CatalogDatabaseImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogDatabaseImpl").finish_non_exhaustive()
    }
}

#[salsa::db]
impl salsa::Database for CatalogDatabaseImpl {}

#[salsa::db]
impl CatalogDatabase for CatalogDatabaseImpl {}
