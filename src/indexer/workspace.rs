//! Discovers and loads the catalogs of a workspace.

use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    AtomicU32,
    Ordering,
};
use std::time::Duration;

use ignore::WalkBuilder;
use tokio::sync::{
    Mutex,
    Notify,
    Semaphore,
};

use crate::config::{
    ConfigManager,
    FileMatcher,
};
use crate::db::CatalogDatabaseImpl;
use crate::indexer::types::IndexerError;
use crate::input::catalog::{
    CatalogFile,
    parsed_catalog,
};

/// Loads catalog files into the database and tracks indexing completion.
#[derive(Debug, Default)]
pub struct WorkspaceIndexer {
    /// Set once the last `index_workspace` finished
    indexing_completed: AtomicBool,
    /// Wakes requests waiting for indexing
    indexing_notify: Notify,
}

impl WorkspaceIndexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every catalog file under `workspace_path`.
    ///
    /// Files are read concurrently (bounded by `indexing.numThreads`), registered
    /// as [`CatalogFile`] inputs in `catalogs`, then parsed on blocking threads so
    /// that the first request finds warm queries.
    pub async fn index_workspace<F>(
        &self,
        db: CatalogDatabaseImpl,
        workspace_path: &Path,
        config_manager: &ConfigManager,
        catalogs: Arc<Mutex<HashMap<PathBuf, CatalogFile>>>,
        progress_callback: Option<F>,
    ) -> Result<(), IndexerError>
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        tracing::debug!(workspace_path = %workspace_path.display(), "Indexing workspace");
        self.indexing_completed.store(false, Ordering::Release);

        let result =
            Self::load_catalogs(db, workspace_path, config_manager, catalogs, progress_callback)
                .await;
        self.mark_completed();
        result
    }

    /// Body of [`Self::index_workspace`].
    ///
    /// Takes the database by value; `&CatalogDatabaseImpl` is not `Send`.
    async fn load_catalogs<F>(
        db: CatalogDatabaseImpl,
        workspace_path: &Path,
        config_manager: &ConfigManager,
        catalogs: Arc<Mutex<HashMap<PathBuf, CatalogFile>>>,
        progress_callback: Option<F>,
    ) -> Result<(), IndexerError>
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        if !workspace_path.is_dir() {
            return Err(IndexerError::InvalidPath(workspace_path.display().to_string()));
        }

        let settings = config_manager.get_settings();
        let matcher = FileMatcher::new(workspace_path.to_path_buf(), settings)?;
        let num_threads = settings.indexing.num_threads.unwrap_or_else(default_num_threads);

        let root = workspace_path.to_path_buf();
        let files =
            tokio::task::spawn_blocking(move || Self::find_catalog_files(&root, &matcher)).await?;
        let total = u32::try_from(files.len()).unwrap_or(u32::MAX);
        tracing::info!(files = files.len(), num_threads, "Found catalog files");

        let loaded = Self::read_files(files, num_threads, total, progress_callback).await;

        let new_files: Vec<CatalogFile> = {
            let mut catalogs = catalogs.lock().await;
            loaded
                .into_iter()
                .map(|(path, text)| {
                    let file = CatalogFile::new(&db, path.to_string_lossy().to_string(), text);
                    catalogs.insert(path, file);
                    file
                })
                .collect()
        };

        Self::prewarm(db, &new_files, num_threads).await;

        tracing::info!(catalogs = new_files.len(), "Workspace indexing complete");
        Ok(())
    }

    /// Reads the files concurrently, keeping those that look like XML.
    async fn read_files<F>(
        files: Vec<PathBuf>,
        num_threads: usize,
        total: u32,
        progress_callback: Option<F>,
    ) -> Vec<(PathBuf, String)>
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(num_threads.max(1)));
        let processed = Arc::new(AtomicU32::new(0));
        let progress_callback = progress_callback.map(Arc::new);

        let tasks = files.into_iter().map(|path| {
            let semaphore = Arc::clone(&semaphore);
            let processed = Arc::clone(&processed);
            let progress_callback = progress_callback.clone();
            async move {
                let _permit = semaphore.acquire().await.ok()?;
                let result = tokio::fs::read_to_string(&path).await;

                let current = processed.fetch_add(1, Ordering::AcqRel) + 1;
                if let Some(callback) = &progress_callback {
                    callback(current, total);
                }

                match result {
                    Ok(text) if looks_like_catalog(&text) => Some((path, text)),
                    Ok(_) => {
                        tracing::debug!(path = %path.display(), "Skipping file that is not XML");
                        None
                    }
                    Err(error) => {
                        tracing::warn!(path = %path.display(), %error, "Failed to read file");
                        None
                    }
                }
            }
        });

        futures::future::join_all(tasks).await.into_iter().flatten().collect()
    }

    /// Parses the new catalogs on blocking threads.
    ///
    /// A parse cancelled by a concurrent edit is only logged; the query re-runs on demand.
    async fn prewarm(db: CatalogDatabaseImpl, files: &[CatalogFile], num_threads: usize) {
        for chunk in files.chunks(num_threads.max(1)) {
            let handles: Vec<_> = chunk
                .iter()
                .map(|&file| {
                    let db = db.clone();
                    tokio::task::spawn_blocking(move || {
                        let _ = parsed_catalog(&db, file);
                    })
                })
                .collect();
            for handle in handles {
                if let Err(error) = handle.await {
                    tracing::warn!(%error, "Pre-parsing a catalog was interrupted");
                }
            }
        }
    }

    /// Walks the workspace honoring `.gitignore`, keeping matching catalogs.
    fn find_catalog_files(workspace_path: &Path, matcher: &FileMatcher) -> Vec<PathBuf> {
        let mut found_files = Vec::new();

        for result in WalkBuilder::new(workspace_path)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            if matcher.is_catalog_file(entry.path()) {
                found_files.push(entry.path().to_path_buf());
            }
        }

        found_files.sort();
        found_files
    }

    #[must_use]
    pub fn is_indexing_completed(&self) -> bool {
        self.indexing_completed.load(Ordering::Acquire)
    }

    /// Marks indexing as done and wakes waiting requests.
    ///
    /// Called after every indexing run, failed or not, and directly when there is
    /// no workspace to index.
    pub fn mark_completed(&self) {
        self.indexing_completed.store(true, Ordering::Release);
        self.indexing_notify.notify_waiters();
    }

    /// Waits until indexing completes. Returns `false` on timeout.
    pub async fn wait_for_completion(&self, timeout: Duration) -> bool {
        let notified = self.indexing_notify.notified();
        tokio::pin!(notified);
        // Enabled before the flag check so a completion in between still wakes it.
        notified.as_mut().enable();
        if self.is_indexing_completed() {
            return true;
        }
        tokio::time::timeout(timeout, notified).await.is_ok() || self.is_indexing_completed()
    }
}

/// 80% of the CPU cores, at least one.
#[must_use]
pub fn default_num_threads() -> usize {
    (num_cpus::get() * 4 / 5).max(1)
}

/// A `.ts` catalog starts with `<` (after an optional BOM); TypeScript sources do not.
#[must_use]
pub fn looks_like_catalog(text: &str) -> bool {
    text.trim_start_matches('\u{feff}').trim_start().starts_with('<')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::input::catalog::catalog_index;

    const FINNISH: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="fi">
<context>
    <name>DFMAddressBar</name>
    <message>
        <source>Search or enter address</source>
        <translation>Hae tai anna osoite</translation>
    </message>
</context>
</TS>
"#;

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let translations = dir.path().join("translations");
        fs::create_dir_all(&translations).unwrap();
        fs::write(translations.join("dde-file-manager_fi.ts"), FINNISH).unwrap();
        fs::write(translations.join("dde-file-manager_ar.ts"), FINNISH.replace("\"fi\"", "\"ar\""))
            .unwrap();
        fs::write(translations.join("helpers.ts"), "export const x = 1;\n").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.ts"), "<not a catalog>").unwrap();
        dir
    }

    #[rstest]
    #[case::xml("<?xml version=\"1.0\"?><TS/>", true)]
    #[case::bom_and_space("\u{feff}\n  <TS/>", true)]
    #[case::typescript("import { x } from './x';", false)]
    #[case::empty("", false)]
    fn sniffs_catalog_content(#[case] text: &str, #[case] expected: bool) {
        assert_that!(looks_like_catalog(text), eq(expected));
    }

    #[googletest::test]
    fn default_num_threads_is_positive() {
        expect_that!(default_num_threads(), ge(1));
    }

    #[tokio::test]
    async fn indexes_matching_catalogs() {
        let dir = workspace();
        let db = CatalogDatabaseImpl::default();
        let indexer = WorkspaceIndexer::new();
        let catalogs = Arc::new(Mutex::new(HashMap::new()));
        let mut config_manager = ConfigManager::new();
        config_manager.load_settings(Some(dir.path().to_path_buf())).unwrap();

        let progress = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&progress);
        indexer
            .index_workspace(
                db.clone(),
                dir.path(),
                &config_manager,
                Arc::clone(&catalogs),
                Some(move |current: u32, _total: u32| {
                    seen.fetch_max(current, Ordering::AcqRel);
                }),
            )
            .await
            .unwrap();

        let catalogs = catalogs.lock().await;
        assert_eq!(catalogs.len(), 2);
        assert!(indexer.is_indexing_completed());
        assert_eq!(progress.load(Ordering::Acquire), 3);

        let fi = catalogs.get(&dir.path().join("translations/dde-file-manager_fi.ts")).unwrap();
        assert_eq!(
            catalog_index(&db, *fi).translate("DFMAddressBar", "Search or enter address", ""),
            Some("Hae tai anna osoite")
        );
    }

    #[tokio::test]
    async fn respects_thread_setting_and_excludes() {
        let dir = workspace();
        fs::write(
            dir.path().join(".linguist-ls.json"),
            r#"{"indexing": {"numThreads": 1}, "catalogFiles": {"excludePatterns": ["**/*_ar.ts"]}}"#,
        )
        .unwrap();
        let indexer = WorkspaceIndexer::new();
        let catalogs = Arc::new(Mutex::new(HashMap::new()));
        let mut config_manager = ConfigManager::new();
        config_manager.load_settings(Some(dir.path().to_path_buf())).unwrap();

        indexer
            .index_workspace(
                CatalogDatabaseImpl::default(),
                dir.path(),
                &config_manager,
                Arc::clone(&catalogs),
                None::<fn(u32, u32)>,
            )
            .await
            .unwrap();

        assert_eq!(catalogs.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn rejects_missing_workspace() {
        let indexer = WorkspaceIndexer::new();

        let result = indexer
            .index_workspace(
                CatalogDatabaseImpl::default(),
                Path::new("/nonexistent/workspace"),
                &ConfigManager::new(),
                Arc::new(Mutex::new(HashMap::new())),
                None::<fn(u32, u32)>,
            )
            .await;

        assert!(matches!(result, Err(IndexerError::InvalidPath(_))));
        assert!(indexer.is_indexing_completed());
    }

    #[tokio::test]
    async fn wait_times_out_before_indexing() {
        let indexer = WorkspaceIndexer::new();

        assert!(!indexer.wait_for_completion(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn wait_wakes_on_completion() {
        let indexer = Arc::new(WorkspaceIndexer::new());
        let waiter = {
            let indexer = Arc::clone(&indexer);
            tokio::spawn(async move { indexer.wait_for_completion(Duration::from_secs(5)).await })
        };
        tokio::task::yield_now().await;

        indexer.mark_completed();

        assert!(waiter.await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn waiters_never_miss_a_completion() {
        for _ in 0..50 {
            let indexer = Arc::new(WorkspaceIndexer::new());
            let waiter = {
                let indexer = Arc::clone(&indexer);
                tokio::spawn(async move { indexer.wait_for_completion(Duration::from_secs(2)).await })
            };

            indexer.mark_completed();

            let woke = tokio::time::timeout(Duration::from_millis(500), waiter).await;
            assert!(woke.unwrap().unwrap());
        }
    }

    #[tokio::test]
    async fn indexing_runs_on_a_spawned_task() {
        let dir = workspace();
        let root = dir.path().to_path_buf();
        let indexer = Arc::new(WorkspaceIndexer::new());
        let catalogs = Arc::new(Mutex::new(HashMap::new()));
        let mut config_manager = ConfigManager::new();
        config_manager.load_settings(Some(root.clone())).unwrap();

        let task = {
            let indexer = Arc::clone(&indexer);
            let catalogs = Arc::clone(&catalogs);
            tokio::spawn(async move {
                indexer
                    .index_workspace(
                        CatalogDatabaseImpl::default(),
                        &root,
                        &config_manager,
                        catalogs,
                        None::<fn(u32, u32)>,
                    )
                    .await
            })
        };

        task.await.unwrap().unwrap();
        assert_eq!(catalogs.lock().await.len(), 2);
    }
}
