//! Entry point: serves LSP on stdio, or checks catalogs with `check`.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use linguist_language_server::Backend;
use linguist_language_server::check::check_paths;
use tower_lsp::{
    LspService,
    Server,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Directory for the optional daily log file.
const LOG_DIR_ENV: &str = "LINGUIST_LS_LOG_DIR";

/// Filter used when `RUST_LOG` is unset or invalid. Salsa logs every query at info.
const DEFAULT_LOG_FILTER: &str = "info,salsa=warn";

/// What to run.
#[derive(Debug)]
enum Command {
    /// Language server on stdio
    Serve,
    /// Batch check
    Check {
        /// Settings file overriding each workspace's own
        config: Option<PathBuf>,
        /// Catalog files or workspace directories
        paths: Vec<PathBuf>,
    },
    /// Prints the version
    Version,
}

/// Reads the command line.
fn parse_args(mut args: pico_args::Arguments) -> Result<Command, pico_args::Error> {
    if args.contains(["-V", "--version"]) {
        return Ok(Command::Version);
    }

    match args.subcommand()?.as_deref() {
        Some("check") => {
            let config = args.opt_value_from_str("--config")?;
            let mut paths: Vec<PathBuf> = args.finish().into_iter().map(PathBuf::from).collect();
            if paths.is_empty() {
                paths.push(PathBuf::from("."));
            }
            Ok(Command::Check { config, paths })
        }
        Some(other) => Err(pico_args::Error::ArgumentParsingFailed {
            cause: format!("unknown subcommand '{other}'"),
        }),
        // Editors commonly pass `--stdio`.
        None => {
            let _ = args.contains("--stdio");
            let rest = args.finish();
            if !rest.is_empty() {
                tracing::warn!(?rest, "Ignoring unknown arguments");
            }
            Ok(Command::Serve)
        }
    }
}

/// Logs to stderr, plus a daily file under `LINGUIST_LS_LOG_DIR` when set.
///
/// The returned guard flushes the file writer and must outlive the program.
fn init_logging() -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_ansi(false);

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "linguist-language-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(env_filter).with(stderr_layer).with(file_layer).init();
    guard
}

/// Runs `check` and prints its findings.
async fn run_check(config: Option<PathBuf>, paths: &[PathBuf]) -> ExitCode {
    let report = match check_paths(paths, config.as_deref()).await {
        Ok(report) => report,
        Err(error) => {
            tracing::error!(%error, "Check failed");
            return ExitCode::from(2);
        }
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(error) = report.write_to(&mut stdout) {
        tracing::error!(%error, "Failed to write report");
        return ExitCode::from(2);
    }

    if report.has_errors() { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = init_logging();

    let command = match parse_args(pico_args::Arguments::from_env()) {
        Ok(command) => command,
        Err(error) => {
            tracing::error!(%error, "Invalid arguments");
            return ExitCode::from(2);
        }
    };

    match command {
        Command::Version => {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Command::Check { config, paths } => run_check(config, &paths).await,
        Command::Serve => {
            tracing::info!("Starting language server");
            let (stdin, stdout) = (tokio::io::stdin(), tokio::io::stdout());
            let (service, socket) = LspService::new(Backend::new);
            Server::new(stdin, stdout, socket).serve(service).await;
            ExitCode::SUCCESS
        }
    }
}
