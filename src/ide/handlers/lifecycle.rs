//! LSP lifecycle handlers: `initialize`, `initialized`, `shutdown`.

use std::path::Path;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionKind,
    CodeActionOptions,
    CodeActionProviderCapability,
    ExecuteCommandOptions,
    HoverProviderCapability,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    MessageType,
    NumberOrString,
    OneOf,
    ProgressParams,
    ProgressParamsValue,
    ServerCapabilities,
    ServerInfo,
    TextDocumentSyncCapability,
    TextDocumentSyncKind,
    WorkDoneProgress,
    WorkDoneProgressBegin,
    WorkDoneProgressEnd,
    WorkDoneProgressOptions,
    WorkDoneProgressReport,
    WorkspaceFoldersServerCapabilities,
    WorkspaceServerCapabilities,
    notification::Progress,
};

use super::super::backend::Backend;
use super::execute_command::{
    CATALOG_STATISTICS_COMMAND,
    TRANSLATE_COMMAND,
};

/// Progress token of workspace indexing.
const INDEXING_TOKEN: &str = "workspace-indexing";

pub async fn handle_initialize(
    backend: &Backend,
    params: InitializeParams,
) -> Result<InitializeResult> {
    #[allow(deprecated)]
    let workspace_root = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .and_then(|folder| folder.uri.to_file_path().ok())
        .or_else(|| params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok()));

    let mut config_manager = backend.config_manager.lock().await;
    if let Err(error) = config_manager.load_settings(workspace_root) {
        backend
            .client
            .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
            .await;
        tracing::error!("Configuration error during initialize: {}", error);
    }
    drop(config_manager);

    Ok(InitializeResult {
        server_info: Some(ServerInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
        capabilities: ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            definition_provider: Some(OneOf::Left(true)),
            references_provider: Some(OneOf::Left(true)),
            code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
                code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                work_done_progress_options: WorkDoneProgressOptions::default(),
                resolve_provider: Some(false),
            })),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: vec![
                    CATALOG_STATISTICS_COMMAND.to_string(),
                    TRANSLATE_COMMAND.to_string(),
                ],
                work_done_progress_options: WorkDoneProgressOptions::default(),
            }),
            workspace: Some(WorkspaceServerCapabilities {
                workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                    supported: Some(true),
                    change_notifications: Some(OneOf::Left(true)),
                }),
                file_operations: None,
            }),
            ..ServerCapabilities::default()
        },
    })
}

pub async fn handle_initialized(backend: &Backend, _: InitializedParams) {
    backend.client.log_message(MessageType::INFO, "initialized!").await;

    let workspace_folders = backend.get_workspace_folders().await.unwrap_or_default();
    let workspace_root = backend.config_manager.lock().await.workspace_root().cloned();

    let mut indexed = false;
    for folder in &workspace_folders {
        if let Some(workspace_path) = Backend::uri_to_path(&folder.uri) {
            index_with_progress(backend, &workspace_path).await;
            indexed = true;
        }
    }
    // Clients without workspace folder support only send a root URI.
    if !indexed && let Some(root) = workspace_root {
        index_with_progress(backend, &root).await;
        indexed = true;
    }
    if !indexed {
        tracing::info!("No workspace to index");
        backend.workspace_indexer.mark_completed();
    }

    backend.process_pending_updates().await;
    backend.send_diagnostics_to_opened_files().await;
    backend.register_file_watchers().await;
}

/// Indexes one folder, reporting `$/progress` to the client.
pub async fn index_with_progress(backend: &Backend, workspace_path: &Path) {
    let token = NumberOrString::String(INDEXING_TOKEN.to_string());

    send_progress(
        backend,
        &token,
        WorkDoneProgress::Begin(WorkDoneProgressBegin {
            title: "Indexing Catalogs".to_string(),
            cancellable: Some(false),
            message: Some("Starting...".to_string()),
            percentage: Some(0),
        }),
    )
    .await;

    // Snapshot; the settings lock is not held while indexing.
    let config_manager = backend.config_manager.lock().await.clone();
    let db = backend.state.db.lock().await.clone();
    let catalogs = backend.state.catalogs.clone();
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<(u32, u32)>(100);

    let progress_task = {
        let client = backend.client.clone();
        let token = token.clone();
        tokio::spawn(async move {
            while let Some((current, total)) = progress_rx.recv().await {
                let percentage = (current * 100).checked_div(total).unwrap_or(0);
                client
                    .send_notification::<Progress>(ProgressParams {
                        token: token.clone(),
                        value: ProgressParamsValue::WorkDone(WorkDoneProgress::Report(
                            WorkDoneProgressReport {
                                cancellable: Some(false),
                                message: Some(format!("Reading catalogs: {current}/{total}")),
                                percentage: Some(percentage),
                            },
                        )),
                    })
                    .await;
            }
        })
    };

    let progress_callback = move |current: u32, total: u32| {
        let _ = progress_tx.try_send((current, total));
    };

    let index_result = backend
        .workspace_indexer
        .index_workspace(db, workspace_path, &config_manager, catalogs, Some(progress_callback))
        .await;

    let _ = progress_task.await;

    let message = match &index_result {
        Ok(()) => {
            let count = backend.state.catalogs.lock().await.len();
            format!("Indexed {count} catalogs")
        }
        Err(error) => format!("Indexing failed: {error}"),
    };
    send_progress(backend, &token, WorkDoneProgress::End(WorkDoneProgressEnd { message: Some(message) }))
        .await;

    if let Err(error) = index_result {
        tracing::error!(%error, workspace_path = %workspace_path.display(), "Indexing failed");
        backend
            .client
            .log_message(MessageType::ERROR, format!("error indexing workspace: {error}"))
            .await;
    }
}

/// Sends one `$/progress` notification.
async fn send_progress(backend: &Backend, token: &NumberOrString, value: WorkDoneProgress) {
    backend
        .client
        .send_notification::<Progress>(ProgressParams {
            token: token.clone(),
            value: ProgressParamsValue::WorkDone(value),
        })
        .await;
}

#[allow(clippy::unused_async)]
pub async fn handle_shutdown() -> Result<()> {
    Ok(())
}
