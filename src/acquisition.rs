//! Background loop that turns the board's image stream into preview frames.

use crate::frame::{Frame, FrameAssembler, FrameDumper, FrameGeometry, FrameProcessor};
use crate::preview::PreviewSurface;
use crate::shutdown::ShutdownSignal;
use crate::stream::{DataStream, StreamMode, StreamTransport};
use log::{debug, info, warn};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Log target for the acquisition worker.
pub const LOG_TARGET: &str = "jlink";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionOptions {
    /// Name of the stream the firmware pushes frames on.
    pub stream_name: String,
    /// Longest wait for data on a single read.
    pub read_timeout: Duration,
    /// How long each iteration waits on the shutdown signal.
    pub poll_interval: Duration,
}

impl Default for AcquisitionOptions {
    fn default() -> Self {
        Self {
            stream_name: "image".to_string(),
            read_timeout: Duration::from_millis(700),
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// Counters reported when the worker exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    pub open_attempts: u64,
    pub open_failures: u64,
    pub read_attempts: u64,
    pub bytes_received: u64,
    pub stream_losses: u64,
    pub frames_completed: u64,
    pub frames_saved: u64,
    pub preview_failures: u64,
}

pub struct Acquisition<T: StreamTransport, P: PreviewSurface> {
    transport: T,
    preview: P,
    geometry: FrameGeometry,
    dumper: Option<FrameDumper>,
    options: AcquisitionOptions,
    preview_failing: bool,
}

impl<T: StreamTransport, P: PreviewSurface> Acquisition<T, P> {
    pub fn new(
        transport: T,
        preview: P,
        geometry: FrameGeometry,
        options: AcquisitionOptions,
    ) -> Self {
        Self {
            transport,
            preview,
            geometry,
            dumper: None,
            options,
            preview_failing: false,
        }
    }

    /// Persist every completed frame with `dumper` before it is annotated.
    pub fn with_dumper(mut self, dumper: FrameDumper) -> Self {
        self.dumper = Some(dumper);
        self
    }

    /// Run the loop on a dedicated thread.
    pub fn spawn(self, shutdown: ShutdownSignal) -> io::Result<JoinHandle<AcquisitionStats>>
    where
        T: 'static,
        P: 'static,
    {
        thread::Builder::new()
            .name("jlink-acquisition".to_string())
            .spawn(move || self.run(&shutdown))
    }

    /// Read, assemble and display frames until `shutdown` is set.
    ///
    /// Open failures and read timeouts are retried indefinitely. The transport
    /// is disconnected exactly once, when the loop observes the shutdown.
    pub fn run(mut self, shutdown: &ShutdownSignal) -> AcquisitionStats {
        let name = self.options.stream_name.clone();
        let mut stats = AcquisitionStats::default();
        let mut assembler = FrameAssembler::new(self.geometry.sensor);
        let mut stream: Option<T::Stream> = None;

        info!(
            target: LOG_TARGET,
            "Waiting for {} frames ({} bytes) on stream {:?}",
            self.geometry.sensor,
            assembler.frame_size(),
            name
        );

        loop {
            if shutdown.wait(self.options.poll_interval) {
                self.transport.disconnect();
                break;
            }

            if stream.is_none() {
                stats.open_attempts += 1;
                match self.transport.open(&name, StreamMode::Read) {
                    Ok(opened) => {
                        debug!(target: LOG_TARGET, "Device {} stream ready", name);
                        stream = Some(opened);
                    }
                    Err(e) => {
                        stats.open_failures += 1;
                        debug!(
                            target: LOG_TARGET,
                            "Failed to open device {} stream, err: {}", name, e
                        );
                        continue;
                    }
                }
            }
            let Some(active) = stream.as_mut() else {
                continue;
            };

            stats.read_attempts += 1;
            let bytes = match active.read_up_to(assembler.remaining(), self.options.read_timeout) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(target: LOG_TARGET, "Lost device {} stream, err: {}", name, e);
                    stats.stream_losses += 1;
                    stream = None;
                    // The next bytes will not continue this frame
                    assembler.clear();
                    continue;
                }
            };
            stats.bytes_received += bytes.len() as u64;

            let mut pending = bytes.as_slice();
            while !pending.is_empty() {
                let (completed, rest) = assembler.push(pending);
                pending = rest;
                if let Some(image) = completed {
                    let frame = Frame::new(image, stats.frames_completed);
                    self.frame_ready(frame, &mut stats);
                }
            }
        }

        info!(
            target: LOG_TARGET,
            "Acquisition stopped after {} frames ({} saved)",
            stats.frames_completed,
            stats.frames_saved
        );
        stats
    }

    fn frame_ready(&mut self, frame: Frame, stats: &mut AcquisitionStats) {
        stats.frames_completed += 1;
        debug!(target: LOG_TARGET, "Frame {} complete", frame.nframe);

        if let Some(dumper) = self.dumper.as_mut() {
            match dumper.save(&frame.data) {
                Ok(_) => stats.frames_saved += 1,
                Err(e) => {
                    warn!(target: LOG_TARGET, "Failed to save frame {}: {:#}", frame.nframe, e)
                }
            }
        }

        let preview = FrameProcessor::prepare_preview(frame.data, &self.geometry);
        match self.preview.show(&preview) {
            Ok(()) => self.preview_failing = false,
            Err(e) => {
                stats.preview_failures += 1;
                if !self.preview_failing {
                    warn!(target: LOG_TARGET, "Preview unavailable: {}", e);
                }
                self.preview_failing = true;
            }
        }
    }
}
