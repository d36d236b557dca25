//! `textDocument/codeAction` handler.

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionParams,
    CodeActionResponse,
};

use super::super::backend::Backend;
use crate::types::SourceRange;

/// Quick fixes for the messages in the requested range.
pub async fn handle_code_action(
    backend: &Backend,
    params: CodeActionParams,
) -> Result<Option<CodeActionResponse>> {
    let uri = &params.text_document.uri;
    let position = params.range.start;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Code Action request");

    if !backend.wait_for_index().await {
        tracing::debug!("Code Action request - catalogs not indexed yet");
        return Ok(Some(vec![]));
    }

    let Some(file_path) = Backend::uri_to_path(uri) else {
        return Ok(Some(vec![]));
    };
    let Some(file) = backend.catalog_at(&file_path).await else {
        return Ok(Some(vec![]));
    };

    let actions = {
        let db = backend.state.db.lock().await;
        crate::ide::code_actions::generate_code_actions(
            &*db,
            file,
            uri,
            SourceRange::from(params.range),
            &params.context.diagnostics,
        )
    };

    tracing::debug!(count = actions.len(), "Generated code actions");
    Ok(Some(actions))
}
