//! Batch checking of catalogs for the `check` subcommand.

use std::collections::HashMap;
use std::io::Write;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::catalog::{
    CatalogIssue,
    IssueSeverity,
};
use crate::config::{
    ConfigError,
    ConfigManager,
    load_from_file,
};
use crate::db::CatalogDatabaseImpl;
use crate::ide::diagnostics::catalog_issues;
use crate::indexer::types::IndexerError;
use crate::indexer::workspace::WorkspaceIndexer;
use crate::input::catalog::CatalogFile;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Indexer(#[from] IndexerError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One issue found in a checked catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub path: PathBuf,
    pub issue: CatalogIssue,
    pub severity: IssueSeverity,
}

/// Everything found by [`check_paths`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Number of catalogs checked
    pub catalogs: usize,
    /// Findings sorted by path, then position
    pub findings: Vec<Finding>,
}

impl CheckReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|finding| finding.severity == IssueSeverity::Error)
    }

    /// Writes `path:line:col: severity[code]: message` lines with 1-based positions.
    pub fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        for finding in &self.findings {
            let start = finding.issue.range.start;
            writeln!(
                out,
                "{}:{}:{}: {}[{}]: {}",
                finding.path.display(),
                start.line + 1,
                start.character + 1,
                finding.severity.label(),
                finding.issue.kind.code(),
                finding.issue.message,
            )?;
        }
        Ok(())
    }
}

/// Checks catalog files and workspace directories.
///
/// A file is checked as given. A directory is indexed with its own
/// `.linguist-ls.json`, or with `config` when set.
pub async fn check_paths(
    paths: &[PathBuf],
    config: Option<&Path>,
) -> Result<CheckReport, CheckError> {
    let override_settings = config.map(load_from_file).transpose()?;
    let db = CatalogDatabaseImpl::default();
    let mut report = CheckReport::default();

    for path in paths {
        let mut config_manager = ConfigManager::new();
        let root = if path.is_dir() { Some(path.as_path()) } else { path.parent() };
        config_manager.load_settings(root.map(Path::to_path_buf))?;
        if let Some(settings) = &override_settings {
            config_manager.update_settings(settings.clone())?;
        }

        let files = if path.is_dir() {
            index_directory(&db, path, &config_manager).await?
        } else {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CheckError::Io { path: path.clone(), source })?;
            vec![(path.clone(), CatalogFile::new(&db, path.to_string_lossy().to_string(), text))]
        };

        let settings = config_manager.get_settings();
        for (path, file) in files {
            report.catalogs += 1;
            let mut findings: Vec<Finding> = catalog_issues(&db, file, settings)
                .into_iter()
                .map(|(issue, severity)| Finding { path: path.clone(), issue, severity })
                .collect();
            findings.sort_by_key(|finding| finding.issue.range.start);
            report.findings.extend(findings);
        }
    }

    tracing::info!(catalogs = report.catalogs, findings = report.findings.len(), "Check finished");
    Ok(report)
}

/// Indexes `dir` and returns its catalogs sorted by path.
async fn index_directory(
    db: &CatalogDatabaseImpl,
    dir: &Path,
    config_manager: &ConfigManager,
) -> Result<Vec<(PathBuf, CatalogFile)>, CheckError> {
    let catalogs = Arc::new(Mutex::new(HashMap::new()));
    WorkspaceIndexer::new()
        .index_workspace(
            db.clone(),
            dir,
            config_manager,
            Arc::clone(&catalogs),
            None::<fn(u32, u32)>,
        )
        .await?;

    let mut files: Vec<_> = catalogs.lock().await.drain().collect();
    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;

    use super::*;
    use crate::catalog::IssueKind;

    const GALICIAN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<TS version="2.1" language="gl_ES">
<context>
    <name>DFMOpticalMediaWidget</name>
    <message>
        <source>Burn</source>
        <translation type="unfinished">Gravar</translation>
    </message>
    <message>
        <source>Free Space %1</source>
        <translation>Espazo libre</translation>
    </message>
</context>
</TS>
"#;

    /// A workspace with the Galician catalog under `translations/`.
    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("translations")).unwrap();
        fs::write(dir.path().join("translations/dde-file-manager_gl_ES.ts"), GALICIAN).unwrap();
        dir
    }

    #[tokio::test]
    async fn reports_findings_of_a_workspace() {
        let dir = workspace();

        let report = check_paths(&[dir.path().to_path_buf()], None).await.unwrap();

        assert_that!(report.catalogs, eq(1));
        let kinds: Vec<IssueKind> = report.findings.iter().map(|f| f.issue.kind).collect();
        assert!(kinds.contains(&IssueKind::Unfinished));
        assert!(kinds.contains(&IssueKind::PlaceholderMismatch));
        assert!(!report.has_errors());
    }

    #[tokio::test]
    async fn duplicate_messages_are_errors() {
        let dir = workspace();
        let duplicated = GALICIAN.replace(
            "</context>",
            "    <message>\n        <source>Burn</source>\n        <translation>Queimar</translation>\n    </message>\n</context>",
        );
        fs::write(dir.path().join("translations/dde-file-manager_gl_ES.ts"), duplicated).unwrap();

        let report = check_paths(&[dir.path().to_path_buf()], None).await.unwrap();

        assert!(report.has_errors());
        let error = report.findings.iter().find(|f| f.severity == IssueSeverity::Error).unwrap();
        assert_that!(error.issue.kind, eq(IssueKind::DuplicateMessage));
    }

    #[tokio::test]
    async fn writes_one_based_positions() {
        let dir = workspace();
        let file = dir.path().join("translations/dde-file-manager_gl_ES.ts");

        let report = check_paths(std::slice::from_ref(&file), None).await.unwrap();
        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let unfinished = text.lines().find(|line| line.contains("[unfinished]")).unwrap();
        assert!(unfinished.starts_with(&format!("{}:7:", file.display())), "{unfinished}");
        assert!(unfinished.contains(": info[unfinished]: "), "{unfinished}");
    }

    #[tokio::test]
    async fn config_file_overrides_severities() {
        let dir = workspace();
        let config = dir.path().join("strict.json");
        fs::write(
            &config,
            r#"{"diagnostics": {"placeholder-mismatch": "off", "unfinished": "off"}}"#,
        )
        .unwrap();

        let report = check_paths(&[dir.path().to_path_buf()], Some(&config)).await.unwrap();

        assert_that!(report.findings, is_empty());
        assert!(!report.has_errors());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = check_paths(&[dir.path().join("missing_fi.ts")], None).await;

        assert!(matches!(result, Err(CheckError::Io { .. })));
    }
}
