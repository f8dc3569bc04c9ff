//! Console and file logging
//!
//! Three sinks share one subscriber:
//! - the console, filtered by `RUST_LOG` (default `info`)
//! - `runtime.log`, every info-level event of every call, for `tail -f`
//! - `sessions.log`, only conversation events (target [`SESSIONS_TARGET`])
//!
//! Both files are append-only. Events inside the call span carry the
//! session id as `session{id=...}`.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter};

pub const RUNTIME_LOG: &str = "runtime.log";
pub const SESSIONS_LOG: &str = "sessions.log";

/// Target for conversation events that also go to `sessions.log`
pub const SESSIONS_TARGET: &str = "sessions";

/// Where the shared log files live
#[derive(Debug, Clone)]
pub struct LogFiles {
    pub runtime: PathBuf,
    pub sessions: PathBuf,
}

impl LogFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            runtime: dir.join(RUNTIME_LOG),
            sessions: dir.join(SESSIONS_LOG),
        }
    }
}

/// Install the global subscriber
pub fn init(logs_dir: &Path) -> Result<LogFiles> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory: {}", logs_dir.display()))?;

    let files = LogFiles::in_dir(logs_dir);
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(console_filter))
        .with(runtime_layer(open_log(&files.runtime)?))
        .with(sessions_layer(open_log(&files.sessions)?))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(files)
}

pub fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

pub fn runtime_layer<S>(file: File) -> impl tracing_subscriber::Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO)
}

pub fn sessions_layer<S>(file: File) -> impl tracing_subscriber::Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(false)
        // spans pass so the session id stays in each line's context
        .with_filter(filter_fn(|meta| meta.is_span() || meta.target() == SESSIONS_TARGET))
}
