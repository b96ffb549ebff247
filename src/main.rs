use jlink_visu::{
    cli::CliArgs,
    config::Config,
    error::AppError,
    frame::FrameDumper,
    logging,
    preview::{FfplayPreview, NullPreview, PreviewSurface},
    serial::{
        resolve_port, MonitorOutcome, SerialLineReader, SerialMonitor, NO_PORT, SERIAL_BY_ID_DIR,
    },
    shutdown::ShutdownSignal,
    stream::{ReplayTransport, StreamTransport, TcpTransport},
    Acquisition, AcquisitionStats, FrameGeometry, VERSION,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::Path;
use std::thread::JoinHandle;
use std::time::Duration;

fn main() -> Result<()> {
    // Parse command-line arguments
    let cli_args = CliArgs::parse();

    // Setup logging
    logging::setup_logging(cli_args.verbose, cli_args.log_file.as_deref())?;
    logging::log_app_start(VERSION);

    // Load and validate configuration before touching any device
    let config = Config::load(&cli_args)?;
    logging::log_app_config(&config);

    let geometry = config.geometry()?;
    info!(
        "Target region {} at ({}, {})-({}, {}), preview {}",
        geometry.target,
        geometry.target_top_left.x,
        geometry.target_top_left.y,
        geometry.target_bottom_right.x,
        geometry.target_bottom_right.y,
        geometry.resize
    );

    let dumper = if config.output.save {
        Some(FrameDumper::prepare(&config.output.out_dir)?)
    } else {
        None
    };

    let shutdown = ShutdownSignal::new();
    shutdown
        .install_ctrlc_handler()
        .context("Failed to install Ctrl+C handler")?;

    // Open the console first so no startup line is missed
    let mut monitor = if config.serial.port == NO_PORT {
        warn!("Serial console monitoring disabled");
        None
    } else {
        let port = resolve_port(&config.serial.port, Path::new(SERIAL_BY_ID_DIR))?;
        let reader = SerialLineReader::open(port, config.serial.baud)?;
        let (poll_timeout, idle) = config.monitor_timing();
        Some(
            SerialMonitor::new(reader, config.monitor_patterns()?, shutdown.clone())
                .with_timing(poll_timeout, idle),
        )
    };

    info!("Opening device data stream ...");
    let worker = match &config.stream.replay {
        Some(path) => start_acquisition(
            ReplayTransport::new(&config.stream.name, path),
            &config,
            geometry,
            dumper,
            &shutdown,
        )?,
        None => start_acquisition(
            TcpTransport::new(config.connect_timeout())
                .with_endpoint(&config.stream.name, &config.stream.address),
            &config,
            geometry,
            dumper,
            &shutdown,
        )?,
    };

    let outcome = match monitor.as_mut() {
        Some(monitor) => match monitor.wait_until_ready() {
            MonitorOutcome::Ready => {
                info!("Device ready, press Ctrl+C to stop");
                monitor.watch()
            }
            other => other,
        },
        None => {
            while !shutdown.wait(Duration::from_millis(100)) {}
            MonitorOutcome::Interrupted
        }
    };

    // Ready/failed paths may return before anyone stopped the worker
    shutdown.trigger();
    let stats = worker
        .join()
        .map_err(|_| anyhow::anyhow!("Acquisition thread panicked"))?;
    log_stats(&stats);

    match outcome {
        MonitorOutcome::Failed(message) => Err(AppError::device(message).into()),
        MonitorOutcome::Ready | MonitorOutcome::Interrupted => {
            info!("Application shutting down");
            Ok(())
        }
    }
}

fn start_acquisition<T>(
    transport: T,
    config: &Config,
    geometry: FrameGeometry,
    dumper: Option<FrameDumper>,
    shutdown: &ShutdownSignal,
) -> Result<JoinHandle<AcquisitionStats>>
where
    T: StreamTransport + 'static,
{
    let preview: Box<dyn PreviewSurface> = if config.preview.enabled {
        Box::new(FfplayPreview::new(
            &config.preview.program,
            &config.preview.title,
            geometry.resize,
        ))
    } else {
        Box::new(NullPreview::new())
    };

    let mut acquisition =
        Acquisition::new(transport, preview, geometry, config.acquisition_options());
    if let Some(dumper) = dumper {
        acquisition = acquisition.with_dumper(dumper);
    }

    let handle = acquisition
        .spawn(shutdown.clone())
        .context("Failed to start acquisition thread")?;
    info!("Device data stream opened");
    Ok(handle)
}

fn log_stats(stats: &AcquisitionStats) {
    info!(
        "Frames: {} completed, {} saved; {} bytes over {} reads",
        stats.frames_completed, stats.frames_saved, stats.bytes_received, stats.read_attempts
    );
    if stats.open_failures > 0 || stats.stream_losses > 0 {
        info!(
            "Stream: {} of {} opens failed, {} connections lost",
            stats.open_failures, stats.open_attempts, stats.stream_losses
        );
    }
    if stats.preview_failures > 0 {
        warn!("Preview failed for {} frames", stats.preview_failures);
    }
}
