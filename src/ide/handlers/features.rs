//! `hover`, `goto_definition` and `references` handlers.

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    GotoDefinitionParams,
    GotoDefinitionResponse,
    Hover,
    HoverContents,
    HoverParams,
    Location,
    MarkupContent,
    MarkupKind,
    ReferenceParams,
};

use super::super::backend::Backend;
use crate::input::catalog::parsed_catalog;
use crate::types::SourcePosition;

/// `textDocument/hover`
pub async fn handle_hover(backend: &Backend, params: HoverParams) -> Result<Option<Hover>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Hover request");

    if !backend.wait_for_index().await {
        tracing::debug!("Hover request timeout - catalogs not indexed yet");
        return Ok(None);
    }

    let Some(file_path) = Backend::uri_to_path(&uri) else {
        return Ok(None);
    };
    let Some(file) = backend.catalog_at(&file_path).await else {
        tracing::debug!("Catalog not found: {}", file_path.display());
        return Ok(None);
    };

    let primary_languages =
        backend.config_manager.lock().await.get_settings().primary_languages.clone();
    let catalogs = backend.state.catalog_list().await;

    let db = backend.state.db.lock().await;
    let Some(message) = parsed_catalog(&*db, file).catalog.message_at(SourcePosition::from(position))
    else {
        tracing::debug!("No message at position");
        return Ok(None);
    };

    let Some(hover_text) = crate::ide::hover::generate_hover_content(
        &*db,
        &message.key,
        file,
        &catalogs,
        primary_languages.as_deref(),
    ) else {
        return Ok(None);
    };
    let range = message.range.into();
    drop(db);

    Ok(Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover_text,
        }),
        range: Some(range),
    }))
}

/// `textDocument/definition`
pub async fn handle_goto_definition(
    backend: &Backend,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Goto definition request");

    if !backend.wait_for_index().await {
        return Ok(None);
    }

    let Some(file_path) = Backend::uri_to_path(&uri) else {
        return Ok(None);
    };
    let Some(file) = backend.catalog_at(&file_path).await else {
        return Ok(None);
    };
    let catalogs = backend.state.catalog_list().await;

    let locations = {
        let db = backend.state.db.lock().await;
        crate::ide::goto_definition::find_definitions(
            &*db,
            file,
            SourcePosition::from(position),
            &catalogs,
        )
    };

    tracing::debug!(count = locations.len(), "Found definitions");

    match locations.len() {
        0 => Ok(None),
        1 => Ok(locations.into_iter().next().map(GotoDefinitionResponse::Scalar)),
        _ => Ok(Some(GotoDefinitionResponse::Array(locations))),
    }
}

/// `textDocument/references`
pub async fn handle_references(
    backend: &Backend,
    params: ReferenceParams,
) -> Result<Option<Vec<Location>>> {
    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "References request");

    if !backend.wait_for_index().await {
        return Ok(None);
    }

    let Some(file_path) = Backend::uri_to_path(&uri) else {
        return Ok(None);
    };
    let Some(file) = backend.catalog_at(&file_path).await else {
        return Ok(None);
    };
    let catalogs = backend.state.catalog_list().await;

    let locations = {
        let db = backend.state.db.lock().await;
        let Some(message) =
            parsed_catalog(&*db, file).catalog.message_at(SourcePosition::from(position))
        else {
            return Ok(None);
        };
        let exclude = (!params.context.include_declaration).then_some(file);
        crate::ide::references::find_references(&*db, &message.key, &catalogs, exclude)
    };

    tracing::debug!(count = locations.len(), "Found references");

    if locations.is_empty() { Ok(None) } else { Ok(Some(locations)) }
}
