//! Runs one pattern analysis pass against `PostgreSQL`.
//!
//! Usage:
//!
//! ```text
//! pattern_analyzer <config-path>
//! ```
//!
//! `config-path` names the orchestrator TOML file; only its `patterns`
//! table is consulted. The database is reached through `DATABASE_URL`.
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::env;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use scriptorium::audit::adapters::postgres::PostgresAuditStore;
use scriptorium::config::{ConfigError, OrchestratorConfig};
use scriptorium::pattern::{
    adapters::postgres::PostgresPatternStore,
    services::{AnalyzerError, PatternAnalyzer},
};
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while running the analyzer.
#[derive(Debug, Error)]
enum RunError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to open configuration directory: {0}")]
    ConfigDir(#[source] std::io::Error),
    #[error("{DATABASE_URL_ENV} is not set")]
    MissingDatabaseUrl,
    #[error("failed to build connection pool: {0}")]
    Pool(#[source] diesel::r2d2::PoolError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalyzerError),
}

fn main() -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    run(env::args().map(Utf8PathBuf::from)).map_err(Into::into)
}

fn run(args: impl Iterator<Item = Utf8PathBuf>) -> Result<(), RunError> {
    let config_path = parse_args(args)?;
    let config = load_config(&config_path)?;
    let database_url = env::var(DATABASE_URL_ENV).map_err(|_| RunError::MissingDatabaseUrl)?;
    let pool = Pool::builder()
        .build(ConnectionManager::<PgConnection>::new(database_url))
        .map_err(RunError::Pool)?;

    let analyzer = PatternAnalyzer::new(
        Arc::new(PostgresAuditStore::new(pool.clone())),
        Arc::new(PostgresPatternStore::new(pool)),
        Arc::new(DefaultClock),
        config.patterns().clone(),
    );
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(RunError::RuntimeInit)?;
    let report = runtime.block_on(analyzer.run())?;
    info!(
        entries_read = report.entries_read,
        requests_analyzed = report.requests_analyzed,
        patterns_written = report.patterns_written,
        patterns_purged = report.patterns_purged,
        "analysis pass finished"
    );
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = Utf8PathBuf>) -> Result<Utf8PathBuf, RunError> {
    let _program = args.next();
    let config_path = args
        .next()
        .ok_or_else(|| RunError::InvalidArgs("missing config path argument".into()))?;
    if let Some(extra) = args.next() {
        return Err(RunError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok(config_path)
}

fn load_config(path: &Utf8Path) -> Result<OrchestratorConfig, RunError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| RunError::InvalidArgs(format!("{path} does not name a file")))?;
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(RunError::ConfigDir)?;
    Ok(OrchestratorConfig::load(&dir, file_name)?)
}
