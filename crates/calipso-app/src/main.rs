//! Interactive cellular automaton and agent simulator.
//!
//! Usage: `calipso [forest-fire|traffic|predator-prey|epidemiology] [--config FILE] [--steps N] [--headless]`

mod models;
mod telemetry;
mod terminal;

use anyhow::{Context, Result};
use calipso_core::RunConfig;
use calipso_runtime::HeadlessPlatform;
use clap::Parser;
use models::ModelKind;
use std::path::PathBuf;
use tracing::{info, warn};

/// Step budget for headless runs that did not set one
const DEFAULT_HEADLESS_STEPS: u64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "calipso")]
#[command(about = "Run a cellular automaton or agent simulation in the terminal")]
struct Args {
    /// Simulation to run
    #[arg(value_enum, default_value_t = ModelKind::ForestFire)]
    model: ModelKind,

    /// JSON run configuration; replaces the model's defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long)]
    width: Option<usize>,

    /// Grid height in cells
    #[arg(long)]
    height: Option<usize>,

    /// Viewport width in pixels
    #[arg(long)]
    viewport_width: Option<usize>,

    /// Viewport height in pixels
    #[arg(long)]
    viewport_height: Option<usize>,

    /// Target rendered frames per second, 0 for unpaced
    #[arg(long)]
    fps: Option<u32>,

    /// Stop after this many steps
    #[arg(long)]
    steps: Option<u64>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Window title
    #[arg(long)]
    title: Option<String>,

    /// Log every tenth step
    #[arg(long, short)]
    verbose: bool,

    /// Run without a display
    #[arg(long)]
    headless: bool,

    /// Remove dead agents between steps
    #[arg(long)]
    compact: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Print the run summary as JSON when the run ends
    #[arg(long)]
    summary_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    telemetry::init_logging(telemetry::LogOptions {
        file: args.log_file.as_deref(),
        json: args.log_json,
        terminal_ui: !args.headless,
    })?;

    let config = build_config(&args)?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    info!(model = ?args.model, title = %config.title, headless = args.headless, "Starting simulator");

    let summary = if args.headless {
        args.model
            .run(config, HeadlessPlatform::new(), args.compact)
            .context("headless run failed")?
    } else {
        args.model
            .run(config, terminal::TerminalPlatform::new(), args.compact)
            .context("terminal run failed")?
    };

    if args.summary_json {
        println!("{}", serde_json::to_string(&summary)?);
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => args.model.default_config(),
    };

    if let Some(width) = args.width {
        config.grid_width = width;
    }
    if let Some(height) = args.height {
        config.grid_height = height;
    }
    if let Some(width) = args.viewport_width {
        config.viewport_width = width;
    }
    if let Some(height) = args.viewport_height {
        config.viewport_height = height;
    }
    if let Some(fps) = args.fps {
        config.target_fps = fps;
    }
    if let Some(steps) = args.steps {
        config.max_steps = Some(steps);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    config.verbose |= args.verbose;

    if args.headless && config.max_steps.is_none() {
        warn!(steps = DEFAULT_HEADLESS_STEPS, "Headless run without a step budget");
        config.max_steps = Some(DEFAULT_HEADLESS_STEPS);
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_model_defaults() {
        let args = Args::parse_from([
            "calipso",
            "traffic",
            "--width",
            "120",
            "--seed",
            "9",
            "--title",
            "rush hour",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.grid_width, 120);
        assert_eq!(config.grid_height, 1);
        assert_eq!(config.target_fps, 5);
        assert_eq!(config.seed, 9);
        assert_eq!(config.title, "rush hour");
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn test_headless_gets_a_step_budget() {
        let args = Args::parse_from(["calipso", "--headless"]);
        let config = build_config(&args).unwrap();
        assert_eq!(args.model, ModelKind::ForestFire);
        assert_eq!(config.max_steps, Some(DEFAULT_HEADLESS_STEPS));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = Args::parse_from(["calipso", "--height", "0"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_config_file_replaces_defaults() {
        let path = std::env::temp_dir().join(format!("calipso-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "grid_width": 12, "grid_height": 7, "title": "from file" }"#).unwrap();

        let args = Args::parse_from(["calipso", "--config", path.to_str().unwrap(), "--fps", "0"]);
        let config = build_config(&args).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((config.grid_width, config.grid_height), (12, 7));
        assert_eq!(config.title, "from file");
        assert_eq!(config.target_fps, 0);
    }
}
