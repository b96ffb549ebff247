//! Live visualization of the image stream a development board sends over its
//! debug probe.
//!
//! This library provides functionality for:
//! - Resolving the sensor frame and model target geometry
//! - Assembling raw stream bytes into grayscale frames
//! - Annotating, storing and previewing frames as they arrive
//! - Watching the board's serial console for start and failure messages

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod logging;
pub mod preview;
pub mod serial;
pub mod shutdown;
pub mod stream;

pub use acquisition::{Acquisition, AcquisitionOptions, AcquisitionStats};
pub use config::Config;
pub use error::{AppError, GeometryError, Result, StreamError};
pub use frame::{FrameAssembler, FrameDumper, FrameGeometry, FrameProcessor};
pub use preview::{FfplayPreview, NullPreview, PreviewSurface};
pub use serial::{
    LineSource, MonitorOutcome, MonitorPatterns, SerialLineReader, SerialMonitor,
};
pub use shutdown::ShutdownSignal;
pub use stream::{DataStream, ReplayTransport, StreamMode, StreamTransport, TcpTransport};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
