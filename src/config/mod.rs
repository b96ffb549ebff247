mod loader;

pub use loader::{
    Config, FrameConfig, OutputConfig, PreviewConfig, SerialConfig, StreamConfig, DEFAULT_PORT,
};
