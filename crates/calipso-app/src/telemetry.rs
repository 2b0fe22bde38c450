//! Tracing subscriber setup for the simulator binary.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

const DEFAULT_FILTER: &str = "info,calipso_runtime=debug";

/// Where log lines go
#[derive(Debug, Clone, Copy)]
pub struct LogOptions<'a> {
    pub file: Option<&'a Path>,
    pub json: bool,
    /// The terminal UI owns stdout/stderr, so only warnings reach stderr
    pub terminal_ui: bool,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub fn init_logging(options: LogOptions<'_>) -> Result<()> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
    };

    let layer: BoxedLayer = match options.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            let layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            if options.json {
                layer.json().with_filter(filter()).boxed()
            } else {
                layer.with_filter(filter()).boxed()
            }
        }
        None if options.terminal_ui => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::new("warn"))
            .boxed(),
        None => {
            let layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
            if options.json {
                layer.json().with_filter(filter()).boxed()
            } else {
                layer.with_filter(filter()).boxed()
            }
        }
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    info!("Logging initialized");
    Ok(())
}
