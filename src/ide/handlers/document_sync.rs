//! Document synchronization handlers.

use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams,
    DidCloseTextDocumentParams,
    DidOpenTextDocumentParams,
    DidSaveTextDocumentParams,
};

use super::super::backend::Backend;

pub async fn handle_did_open(backend: &Backend, params: DidOpenTextDocumentParams) {
    let uri = params.text_document.uri;
    let text = params.text_document.text;
    tracing::debug!(uri = %uri, "Document opened");

    {
        let mut opened_files = backend.state.opened_files.lock().await;
        opened_files.insert(uri.clone());
    }

    backend.update_and_diagnose(uri, text, true).await;
}

pub async fn handle_did_change(backend: &Backend, params: DidChangeTextDocumentParams) {
    let uri = params.text_document.uri;

    let Some(change) = params.content_changes.into_iter().next_back() else {
        return;
    };

    backend.update_and_diagnose(uri, change.text, true).await;
}

pub async fn handle_did_save(backend: &Backend, params: DidSaveTextDocumentParams) {
    tracing::debug!(uri = %params.text_document.uri, "Document saved");
    if let Some(text) = params.text {
        backend.update_and_diagnose(params.text_document.uri, text, true).await;
    }
}

/// Forgets the buffer; the catalog on disk is re-read so the index matches it again.
pub async fn handle_did_close(backend: &Backend, params: DidCloseTextDocumentParams) {
    let uri = params.text_document.uri;
    tracing::debug!(uri = %uri, "Document closed");

    {
        let mut opened_files = backend.state.opened_files.lock().await;
        opened_files.remove(&uri);
    }

    if let Some(path) = Backend::uri_to_path(&uri) {
        if backend.catalog_at(&path).await.is_none() {
            return;
        }
        if path.exists() {
            backend.reload_catalog_file(&path).await;
        } else {
            backend.remove_catalog_file(&path).await;
        }
    }
}
