use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("Preview error: {0}")]
    Preview(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Invalid camera/sensor resolution: {0:?}")]
    InvalidResolution(String),

    #[error("Invalid target shape: {0:?}")]
    InvalidTargetShape(String),
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Stream {0:?} is not available")]
    Unavailable(String),

    #[error("Stream {0:?} does not support {1} mode")]
    Unsupported(String, &'static str),

    #[error("Stream {name:?} connection failed: {source}")]
    Connect {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream {0:?} was closed by the remote end")]
    Closed(String),

    #[error("Stream read failed: {0}")]
    Read(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

// Helper functions for creating errors
impl AppError {
    pub fn serial(msg: impl Into<String>) -> Self {
        AppError::Serial(msg.into())
    }

    pub fn preview(msg: impl Into<String>) -> Self {
        AppError::Preview(msg.into())
    }

    pub fn device(msg: impl Into<String>) -> Self {
        AppError::Device(msg.into())
    }
}

impl StreamError {
    pub fn unavailable(name: impl Into<String>) -> Self {
        StreamError::Unavailable(name.into())
    }

    pub fn closed(name: impl Into<String>) -> Self {
        StreamError::Closed(name.into())
    }
}
