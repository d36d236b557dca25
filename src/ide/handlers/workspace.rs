//! Workspace-related handlers.

use tower_lsp::lsp_types::{
    DidChangeConfigurationParams,
    DidChangeWatchedFilesParams,
    DidChangeWorkspaceFoldersParams,
    FileChangeType,
    MessageType,
};

use super::super::backend::Backend;

pub async fn handle_did_change_workspace_folders(
    backend: &Backend,
    params: DidChangeWorkspaceFoldersParams,
) {
    tracing::info!(
        added = params.event.added.len(),
        removed = params.event.removed.len(),
        "Workspace folders changed"
    );
    backend.reindex_workspace().await;
}

pub async fn handle_did_change_configuration(
    backend: &Backend,
    params: DidChangeConfigurationParams,
) {
    tracing::info!(settings = %params.settings, "didChangeConfiguration received");

    let result = backend.config_manager.lock().await.apply_client_settings(params.settings);

    match result {
        Ok(()) => {
            tracing::info!("configuration updated successfully");
            backend.reindex_workspace().await;
        }
        Err(error) => {
            tracing::error!(%error, "configuration error");
            backend
                .client
                .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
                .await;
        }
    }
}

pub async fn handle_did_change_watched_files(
    backend: &Backend,
    params: DidChangeWatchedFilesParams,
) {
    let mut catalogs_changed = false;

    for change in params.changes {
        let Some(file_path) = Backend::uri_to_path(&change.uri) else {
            continue;
        };

        if Backend::is_config_file(&file_path) {
            backend.handle_config_file_change(&file_path).await;
            continue;
        }

        let known = backend.catalog_at(&file_path).await.is_some();
        if !known && !backend.is_catalog_file(&file_path).await {
            continue;
        }

        tracing::debug!("Catalog changed: {:?}, type: {:?}", file_path, change.typ);
        match change.typ {
            FileChangeType::CREATED | FileChangeType::CHANGED => {
                backend.reload_catalog_file(&file_path).await;
                catalogs_changed = true;
            }
            FileChangeType::DELETED => {
                backend.remove_catalog_file(&file_path).await;
                catalogs_changed = true;
            }
            _ => {}
        }
    }

    if catalogs_changed {
        backend.send_diagnostics_to_opened_files().await;
    }
}
