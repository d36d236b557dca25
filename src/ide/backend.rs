//! LSP backend.

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::time::Duration;

use salsa::Setter;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionParams,
    CodeActionResponse,
    DidChangeConfigurationParams,
    DidChangeTextDocumentParams,
    DidChangeWatchedFilesParams,
    DidChangeWatchedFilesRegistrationOptions,
    DidChangeWorkspaceFoldersParams,
    DidCloseTextDocumentParams,
    DidOpenTextDocumentParams,
    DidSaveTextDocumentParams,
    ExecuteCommandParams,
    FileSystemWatcher,
    GlobPattern,
    GotoDefinitionParams,
    GotoDefinitionResponse,
    Hover,
    HoverParams,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    Location,
    MessageType,
    ReferenceParams,
    Registration,
    Url,
    WorkspaceFolder,
};
use tower_lsp::{
    Client,
    LanguageServer,
};

use super::handlers;
use super::state::ServerState;
use crate::config::{
    CONFIG_FILE_NAME,
    ConfigManager,
    FileMatcher,
};
use crate::db::CatalogDatabaseImpl;
use crate::ide::diagnostics::generate_diagnostics;
use crate::indexer::workspace::{
    WorkspaceIndexer,
    looks_like_catalog,
};
use crate::input::catalog::CatalogFile;

/// How long requests wait for the initial indexing.
const INDEX_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// LSP Backend
#[derive(Clone)]
pub struct Backend {
    /// LSP client
    pub client: Client,
    /// Settings
    pub config_manager: Arc<Mutex<ConfigManager>>,
    /// Workspace indexer
    pub workspace_indexer: Arc<WorkspaceIndexer>,
    /// Shared state
    pub state: ServerState,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("config_manager", &"<ConfigManager>")
            .field("workspace_indexer", &"<WorkspaceIndexer>")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Backend {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config_manager: Arc::new(Mutex::new(ConfigManager::new())),
            workspace_indexer: Arc::new(WorkspaceIndexer::new()),
            state: ServerState::new(CatalogDatabaseImpl::default()),
        }
    }

    /// Workspace folders of the client; empty when none are open.
    pub(crate) async fn get_workspace_folders(&self) -> Result<Vec<WorkspaceFolder>> {
        self.client.workspace_folders().await.map(Option::unwrap_or_default)
    }

    /// Local path of a `file:` URI.
    pub(crate) fn uri_to_path(uri: &Url) -> Option<PathBuf> {
        uri.to_file_path().map_or_else(
            |()| {
                tracing::warn!("Failed to convert URI to file path: {}", uri);
                None
            },
            Some,
        )
    }

    /// True for `.linguist-ls.json`.
    pub(crate) fn is_config_file(path: &Path) -> bool {
        path.file_name().is_some_and(|name| name == CONFIG_FILE_NAME)
    }

    /// Waits for the initial indexing. Returns `false` on timeout.
    pub(crate) async fn wait_for_index(&self) -> bool {
        self.workspace_indexer.wait_for_completion(INDEX_WAIT_TIMEOUT).await
    }

    /// True when `path` is selected by the catalog patterns of the workspace.
    pub(crate) async fn is_catalog_file(&self, path: &Path) -> bool {
        let config_manager = self.config_manager.lock().await;
        let Some(root) = config_manager.workspace_root() else {
            return false;
        };
        FileMatcher::new(root.clone(), config_manager.get_settings())
            .is_ok_and(|matcher| matcher.is_catalog_file(path))
    }

    /// The indexed catalog at `path`.
    pub(crate) async fn catalog_at(&self, path: &Path) -> Option<CatalogFile> {
        self.state.catalogs.lock().await.get(path).copied()
    }

    /// Applies an edited document and publishes its diagnostics.
    ///
    /// Edits arriving while the workspace is indexed are queued and applied by
    /// [`Self::process_pending_updates`].
    pub(crate) async fn update_and_diagnose(&self, uri: Url, text: String, is_open: bool) {
        let Some(file_path) = Self::uri_to_path(&uri) else {
            return;
        };

        if !self.workspace_indexer.is_indexing_completed() {
            tracing::debug!(uri = %uri, "Indexing in progress, queueing update");
            self.state.pending_updates.lock().await.insert(uri, text);
            return;
        }

        let known = self.catalog_at(&file_path).await.is_some();
        if !known {
            let is_catalog = self.is_catalog_file(&file_path).await
                || (is_open
                    && file_path.extension().is_some_and(|ext| ext == "ts")
                    && looks_like_catalog(&text));
            if !is_catalog {
                tracing::debug!(uri = %uri, "Not a catalog, ignoring");
                return;
            }
        }

        let file = {
            let (mut db, mut catalogs) = self.state.lock_db_and_catalogs().await;
            if let Some(existing) = catalogs.get(&file_path).copied() {
                drop(catalogs);
                if existing.text(&*db) != &text {
                    existing.set_text(&mut *db).to(text);
                }
                existing
            } else {
                let file = CatalogFile::new(&*db, file_path.to_string_lossy().to_string(), text);
                catalogs.insert(file_path, file);
                file
            }
        };

        self.publish_catalog_diagnostics(uri, file).await;
    }

    /// Applies the edits queued during indexing.
    pub(crate) async fn process_pending_updates(&self) {
        let pending: Vec<(Url, String)> =
            self.state.pending_updates.lock().await.drain().collect();
        let opened = self.state.opened_files.lock().await.clone();

        for (uri, text) in pending {
            let is_open = opened.contains(&uri);
            self.update_and_diagnose(uri, text, is_open).await;
        }
    }

    /// Publishes diagnostics of one catalog.
    pub(crate) async fn publish_catalog_diagnostics(&self, uri: Url, file: CatalogFile) {
        let settings = self.config_manager.lock().await.get_settings().clone();
        let diagnostics = {
            let db = self.state.db.lock().await;
            generate_diagnostics(&*db, file, &uri, &settings)
        };

        tracing::debug!(uri = %uri, count = diagnostics.len(), "Publishing diagnostics");
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    /// Publishes diagnostics of every open catalog.
    pub(crate) async fn send_diagnostics_to_opened_files(&self) {
        let opened: Vec<Url> = self.state.opened_files.lock().await.iter().cloned().collect();

        for uri in opened {
            let Some(path) = Self::uri_to_path(&uri) else {
                continue;
            };
            if let Some(file) = self.catalog_at(&path).await {
                self.publish_catalog_diagnostics(uri, file).await;
            }
        }
    }

    /// Drops the cached database and indexes every workspace folder again.
    pub(crate) async fn reindex_workspace(&self) {
        self.client.log_message(MessageType::INFO, "Reindexing workspace...").await;

        *self.state.db.lock().await = CatalogDatabaseImpl::default();
        self.state.catalogs.lock().await.clear();

        let mut roots: Vec<PathBuf> = self
            .get_workspace_folders()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|folder| Self::uri_to_path(&folder.uri))
            .collect();
        if roots.is_empty()
            && let Some(root) = self.config_manager.lock().await.workspace_root().cloned()
        {
            roots.push(root);
        }
        for root in &roots {
            handlers::lifecycle::index_with_progress(self, root).await;
        }

        self.process_pending_updates().await;
        self.reload_opened_documents().await;
        self.send_diagnostics_to_opened_files().await;
    }

    /// Re-reads open catalogs that the fresh index does not know, from disk.
    async fn reload_opened_documents(&self) {
        let opened: Vec<Url> = self.state.opened_files.lock().await.iter().cloned().collect();
        for uri in opened {
            if let Some(path) = Self::uri_to_path(&uri)
                && self.catalog_at(&path).await.is_none()
                && let Ok(text) = tokio::fs::read_to_string(&path).await
            {
                self.update_and_diagnose(uri, text, true).await;
            }
        }
    }

    /// Asks the client to watch catalog files and the settings file.
    pub(crate) async fn register_file_watchers(&self) {
        let patterns = {
            let config_manager = self.config_manager.lock().await;
            config_manager.get_settings().catalog_files.include_patterns.clone()
        };

        let watchers = patterns
            .into_iter()
            .chain(std::iter::once(format!("**/{CONFIG_FILE_NAME}")))
            .map(|pattern| FileSystemWatcher { glob_pattern: GlobPattern::String(pattern), kind: None })
            .collect();

        let registration = Registration {
            id: "linguist-file-watcher".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(DidChangeWatchedFilesRegistrationOptions {
                watchers,
            })
            .ok(),
        };

        if let Err(error) = self.client.register_capability(vec![registration]).await {
            tracing::warn!(%error, "Failed to register file watchers");
        }
    }

    /// Re-reads a catalog from disk after an external change.
    ///
    /// Open documents are left alone: the editor buffer is the source of truth.
    pub(crate) async fn reload_catalog_file(&self, path: &Path) {
        if let Ok(uri) = Url::from_file_path(path)
            && self.state.opened_files.lock().await.contains(&uri)
        {
            tracing::debug!(path = %path.display(), "Catalog is open, skipping reload");
            return;
        }

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Failed to read catalog");
                return;
            }
        };
        if !looks_like_catalog(&text) {
            return;
        }

        let (mut db, mut catalogs) = self.state.lock_db_and_catalogs().await;
        if let Some(existing) = catalogs.get(path).copied() {
            drop(catalogs);
            existing.set_text(&mut *db).to(text);
        } else {
            let file = CatalogFile::new(&*db, path.to_string_lossy().to_string(), text);
            catalogs.insert(path.to_path_buf(), file);
        }
        tracing::debug!(path = %path.display(), "Catalog reloaded");
    }

    /// Forgets a deleted catalog and clears its diagnostics.
    pub(crate) async fn remove_catalog_file(&self, path: &Path) {
        let removed = self.state.catalogs.lock().await.remove(path);
        if removed.is_some()
            && let Ok(uri) = Url::from_file_path(path)
        {
            self.client.publish_diagnostics(uri, Vec::new(), None).await;
        }
        tracing::debug!(path = %path.display(), "Catalog removed");
    }

    /// Reloads `.linguist-ls.json` and reindexes.
    pub(crate) async fn handle_config_file_change(&self, path: &Path) {
        tracing::info!(path = %path.display(), "Settings file changed");

        let result = {
            let mut config_manager = self.config_manager.lock().await;
            let root = config_manager.workspace_root().cloned();
            config_manager.load_settings(root)
        };

        match result {
            Ok(()) => self.reindex_workspace().await,
            Err(error) => {
                self.client
                    .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
                    .await;
            }
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handlers::lifecycle::handle_initialize(self, params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        handlers::lifecycle::handle_initialized(self, params).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handlers::lifecycle::handle_shutdown().await
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        handlers::workspace::handle_did_change_workspace_folders(self, params).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        handlers::workspace::handle_did_change_configuration(self, params).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        handlers::workspace::handle_did_change_watched_files(self, params).await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        handlers::document_sync::handle_did_open(self, params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        handlers::document_sync::handle_did_change(self, params).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        handlers::document_sync::handle_did_save(self, params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        handlers::document_sync::handle_did_close(self, params).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        handlers::features::handle_hover(self, params).await
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        handlers::features::handle_goto_definition(self, params).await
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        handlers::features::handle_references(self, params).await
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        handlers::code_action::handle_code_action(self, params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        handlers::execute_command::handle_execute_command(self, params).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::root("/ws/.linguist-ls.json", true)]
    #[case::nested("/ws/sub/.linguist-ls.json", true)]
    #[case::catalog("/ws/translations/app_fi.ts", false)]
    fn detects_config_file(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(Backend::is_config_file(Path::new(path)), expected);
    }

    #[rstest]
    fn uri_to_path_rejects_non_file_uris() {
        let uri = Url::parse("untitled:Untitled-1").unwrap();

        assert!(Backend::uri_to_path(&uri).is_none());
    }
}
