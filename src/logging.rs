use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use log::{debug, info, LevelFilter};
use std::fs::File;
use std::path::Path;

use crate::config::Config;

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialise the global logger. `RUST_LOG` takes precedence over
/// `verbosity`; `log_file` redirects output from stderr to a file.
pub fn setup_logging(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
    let mut builder = Builder::new();
    builder.filter_level(level_for(verbosity));
    builder.parse_env(Env::default());
    builder.format_target(true);

    if let Some(log_file) = log_file {
        let file = File::create(log_file)
            .with_context(|| format!("Failed to create log file {}", log_file.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
        builder.write_style(env_logger::WriteStyle::Never);
    }

    builder
        .try_init()
        .context("Failed to initialise logging")?;

    debug!("Debug logging enabled");
    Ok(())
}

pub fn log_app_start(version: &str) {
    info!("Starting J-Link image visualizer v{}", version);
}

pub fn log_app_config(config: &Config) {
    info!("Application configured with:");
    info!("  Frame:");
    info!("    Camera resolution: {}", config.frame.camera_resolution);
    info!("    Target shape: {}", config.frame.target_shape);
    info!("  Output:");
    if config.output.save {
        info!("    Save folder: {}", config.output.out_dir.display());
    } else {
        info!("    Saving disabled");
    }
    info!("  Serial:");
    info!("    Port: {}", config.serial.port);
    info!("    Baud rate: {}", config.serial.baud);
    info!("    Start pattern: {}", config.serial.start_pattern);
    info!("    Fail patterns: {:?}", config.serial.fail_patterns);
    info!("  Stream:");
    match &config.stream.replay {
        Some(path) => info!("    Replay: {}", path.display()),
        None => info!("    Address: {}", config.stream.address),
    }
    info!("    Name: {}", config.stream.name);
    info!("    Read timeout: {} ms", config.stream.read_timeout_ms);
    info!("  Preview:");
    if config.preview.enabled {
        info!("    Program: {}", config.preview.program);
    } else {
        info!("    Disabled");
    }
}
