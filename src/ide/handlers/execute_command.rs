//! `workspace/executeCommand` handler.
//!
//! * `linguist.catalogStatistics` `[uri?]` returns per-catalog message counts.
//! * `linguist.translate` `[language, context, source, comment?, count?]` resolves a
//!   message the way an application would, falling back to the source text.

use std::path::{
    Path,
    PathBuf,
};

use serde::Serialize;
use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    ExecuteCommandParams,
    Url,
};

use super::super::backend::Backend;
use crate::catalog::{
    CatalogStatistics,
    LookupPolicy,
};
use crate::db::CatalogDatabase;
use crate::input::catalog::{
    CatalogFile,
    catalog_file_language,
    catalog_index_with_policy,
    parsed_catalog,
};

pub const CATALOG_STATISTICS_COMMAND: &str = "linguist.catalogStatistics";
pub const TRANSLATE_COMMAND: &str = "linguist.translate";

/// Counts of one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReport {
    pub uri: String,
    pub language: String,
    #[serde(flatten)]
    pub statistics: CatalogStatistics,
}

/// Arguments of `linguist.translate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    pub language: String,
    pub context: String,
    pub source: String,
    pub comment: String,
    /// Selects a numerus form and fills `%n`
    pub count: Option<u64>,
}

impl TranslateRequest {
    /// Reads the positional command arguments.
    fn from_arguments(arguments: &[Value]) -> Option<Self> {
        let text = |index: usize| arguments.get(index).and_then(Value::as_str);
        Some(Self {
            language: text(0)?.to_string(),
            context: text(1)?.to_string(),
            source: text(2)?.to_string(),
            comment: text(3).unwrap_or_default().to_string(),
            count: arguments.get(4).and_then(Value::as_u64),
        })
    }
}

/// Result of `linguist.translate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslateResult {
    pub text: String,
    /// True when no translation was found and `text` is the source
    pub fallback: bool,
}

pub async fn handle_execute_command(
    backend: &Backend,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    tracing::debug!(command = %params.command, "Execute Command request");

    if !backend.wait_for_index().await {
        tracing::debug!("Execute Command request - catalogs not indexed yet");
        return Ok(None);
    }

    match params.command.as_str() {
        CATALOG_STATISTICS_COMMAND => {
            handle_catalog_statistics(backend, &params.arguments).await
        }
        TRANSLATE_COMMAND => handle_translate(backend, &params.arguments).await,
        _ => {
            tracing::warn!("Unknown command: {}", params.command);
            Ok(None)
        }
    }
}

/// `linguist.catalogStatistics`
async fn handle_catalog_statistics(
    backend: &Backend,
    arguments: &[Value],
) -> Result<Option<Value>> {
    let only = arguments
        .first()
        .and_then(Value::as_str)
        .and_then(|uri| Url::parse(uri).ok())
        .and_then(|uri| Backend::uri_to_path(&uri));

    let catalogs = backend.state.catalog_list().await;
    let reports = {
        let db = backend.state.db.lock().await;
        catalog_statistics(&*db, &catalogs, only.as_deref())
    };

    Ok(serde_json::to_value(reports).ok())
}

/// `linguist.translate`
async fn handle_translate(backend: &Backend, arguments: &[Value]) -> Result<Option<Value>> {
    let Some(request) = TranslateRequest::from_arguments(arguments) else {
        tracing::warn!("Invalid arguments for {}", TRANSLATE_COMMAND);
        return Ok(None);
    };

    let policy = LookupPolicy {
        include_unfinished: backend
            .config_manager
            .lock()
            .await
            .get_settings()
            .lookup
            .include_unfinished,
    };
    let catalogs = backend.state.catalog_list().await;
    let result = {
        let db = backend.state.db.lock().await;
        translate(&*db, &catalogs, &request, policy)
    };

    tracing::debug!(language = %request.language, fallback = result.fallback, "Translated");
    Ok(serde_json::to_value(result).ok())
}

/// Statistics of every catalog, or only of `only`.
pub fn catalog_statistics(
    db: &dyn CatalogDatabase,
    catalogs: &[(PathBuf, CatalogFile)],
    only: Option<&Path>,
) -> Vec<CatalogReport> {
    catalogs
        .iter()
        .filter(|(path, _)| only.is_none_or(|only| only == path))
        .filter_map(|(path, file)| {
            let uri = Url::from_file_path(path).ok()?;
            Some(CatalogReport {
                uri: uri.to_string(),
                language: catalog_file_language(db, *file).clone(),
                statistics: CatalogStatistics::from_catalog(&parsed_catalog(db, *file).catalog),
            })
        })
        .collect()
}

/// Resolves `request` in the first catalog of its language.
pub fn translate(
    db: &dyn CatalogDatabase,
    catalogs: &[(PathBuf, CatalogFile)],
    request: &TranslateRequest,
    policy: LookupPolicy,
) -> TranslateResult {
    let wanted = request.language.replace('-', "_");
    let file = catalogs
        .iter()
        .map(|(_, file)| *file)
        .find(|file| catalog_file_language(db, *file).replace('-', "_") == wanted);

    let Some(file) = file else {
        return TranslateResult { text: request.source.clone(), fallback: true };
    };

    let index = catalog_index_with_policy(db, file, policy);
    let found = index.translate(&request.context, &request.source, &request.comment).is_some();
    let text = match request.count {
        Some(count) => {
            index.translate_plural(&request.context, &request.source, &request.comment, count)
        }
        None => index
            .translate_or_source(&request.context, &request.source, &request.comment)
            .to_string(),
    };

    TranslateResult { text, fallback: !found }
}
