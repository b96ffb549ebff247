use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::acquisition::AcquisitionOptions;
use crate::cli::CliArgs;
use crate::frame::FrameGeometry;
use crate::preview::PREVIEW_TITLE;
use crate::serial::{MonitorPatterns, DEFAULT_BAUD_RATE, REGEX_PREFIX};
use crate::stream::DEFAULT_RTT_ADDRESS;

pub const DEFAULT_PORT: &str = "regex:SEGGER.*J-?Link";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub frame: FrameConfig,
    pub output: OutputConfig,
    pub serial: SerialConfig,
    pub stream: StreamConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub camera_resolution: String,
    pub target_shape: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            camera_resolution: "160x120".to_string(),
            target_shape: "84x84".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub save: bool,
    pub out_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save: false,
            out_dir: PathBuf::from("./dump_images"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud: u32,
    pub start_pattern: String,
    pub fail_patterns: Vec<String>,
    pub poll_timeout_ms: u64,
    pub idle_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud: DEFAULT_BAUD_RATE,
            start_pattern: crate::serial::DEFAULT_START_PATTERN.to_string(),
            fail_patterns: crate::serial::DEFAULT_FAIL_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            poll_timeout_ms: 10,
            idle_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub name: String,
    pub address: String,
    pub replay: Option<PathBuf>,
    pub read_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            name: "image".to_string(),
            address: DEFAULT_RTT_ADDRESS.to_string(),
            replay: None,
            read_timeout_ms: 700,
            poll_interval_ms: 10,
            connect_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub enabled: bool,
    pub program: String,
    pub title: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "ffplay".to_string(),
            title: PREVIEW_TITLE.to_string(),
        }
    }
}

impl Config {
    pub fn load(cli_args: &CliArgs) -> Result<Self> {
        let mut config = match cli_args.config.as_deref() {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        // Override config with CLI arguments
        config.override_with_cli_args(cli_args);

        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());

        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn override_with_cli_args(&mut self, args: &CliArgs) {
        if let Some(resolution) = &args.camera_resolution {
            self.frame.camera_resolution = resolution.clone();
        }
        if let Some(shape) = &args.target_shape {
            self.frame.target_shape = shape.clone();
        }

        if args.save {
            self.output.save = true;
        }
        if let Some(out_dir) = &args.out_dir {
            self.output.out_dir = out_dir.clone();
        }

        if let Some(port) = &args.port {
            self.serial.port = port.clone();
        }
        if let Some(baud) = args.baud {
            self.serial.baud = baud;
        }

        if let Some(address) = &args.stream_address {
            self.stream.address = address.clone();
        }
        if let Some(replay) = &args.replay {
            self.stream.replay = Some(replay.clone());
        }

        if args.no_preview {
            self.preview.enabled = false;
        }
    }

    /// Check everything that can be checked before a device is touched.
    pub fn validate(&self) -> Result<()> {
        self.geometry().context("Invalid frame configuration")?;
        self.monitor_patterns()
            .context("Invalid serial pattern configuration")?;

        if self.serial.port.trim().is_empty() || self.serial.port.trim() == REGEX_PREFIX {
            return Err(anyhow::anyhow!("Serial port cannot be empty"));
        }
        if self.stream.name.is_empty() {
            return Err(anyhow::anyhow!("Stream name cannot be empty"));
        }
        if self.stream.read_timeout_ms == 0 || self.stream.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("Stream timeouts must be positive"));
        }
        if self.stream.connect_timeout_ms == 0 {
            return Err(anyhow::anyhow!("Connect timeout must be positive"));
        }
        if self.serial.baud == 0 {
            return Err(anyhow::anyhow!("Serial baud rate must be positive"));
        }
        if self.serial.poll_timeout_ms == 0 {
            return Err(anyhow::anyhow!("Serial poll timeout must be positive"));
        }
        if self.output.save && self.output.out_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Output directory cannot be empty"));
        }
        if self.preview.enabled && self.preview.program.trim().is_empty() {
            return Err(anyhow::anyhow!("Preview program cannot be empty"));
        }

        Ok(())
    }

    pub fn geometry(&self) -> crate::Result<FrameGeometry> {
        Ok(FrameGeometry::resolve(
            &self.frame.camera_resolution,
            &self.frame.target_shape,
        )?)
    }

    pub fn monitor_patterns(&self) -> crate::Result<MonitorPatterns> {
        MonitorPatterns::new(&self.serial.start_pattern, self.serial.fail_patterns.as_slice())
    }

    pub fn acquisition_options(&self) -> AcquisitionOptions {
        AcquisitionOptions {
            stream_name: self.stream.name.clone(),
            read_timeout: Duration::from_millis(self.stream.read_timeout_ms),
            poll_interval: Duration::from_millis(self.stream.poll_interval_ms),
        }
    }

    pub fn monitor_timing(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.serial.poll_timeout_ms),
            Duration::from_millis(self.serial.idle_ms),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.stream.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["jlink_visu"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_defaults_match_the_board_tool() {
        let config = Config::load(&args(&[])).unwrap();
        assert_eq!(config.frame.camera_resolution, "160x120");
        assert_eq!(config.frame.target_shape, "84x84");
        assert!(!config.output.save);
        assert_eq!(config.output.out_dir, PathBuf::from("./dump_images"));
        assert_eq!(config.serial.port, DEFAULT_PORT);
        assert_eq!(config.serial.baud, 115_200);
        assert_eq!(config.serial.fail_patterns.len(), 3);

        let options = config.acquisition_options();
        assert_eq!(options.stream_name, "image");
        assert_eq!(options.read_timeout, Duration::from_millis(700));
        assert_eq!(options.poll_interval, Duration::from_millis(10));
        assert_eq!(
            config.monitor_timing(),
            (Duration::from_millis(10), Duration::from_millis(100))
        );
    }

    #[test]
    fn test_file_values_are_overridden_by_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"
[frame]
camera_resolution = "320x240"
target_shape = "96x96"

[serial]
port = "/dev/ttyACM0"
baud = 921600
fail_patterns = ["panic"]

[stream]
read_timeout_ms = 250
"#,
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = Config::load(&args(&[
            "--config",
            path.as_str(),
            "--target-shape",
            "48x48",
            "--save",
        ]))
        .unwrap();
        assert_eq!(config.frame.camera_resolution, "320x240");
        assert_eq!(config.frame.target_shape, "48x48");
        assert!(config.output.save);
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud, 921_600);
        assert_eq!(config.serial.fail_patterns, vec!["panic".to_string()]);
        assert_eq!(config.serial.start_pattern, crate::serial::DEFAULT_START_PATTERN);
        assert_eq!(config.stream.read_timeout_ms, 250);
        assert_eq!(config.stream.poll_interval_ms, 10);
    }

    #[test]
    fn test_malformed_geometry_fails_validation() {
        assert!(Config::load(&args(&["--camera-resolution", "160by120"])).is_err());
        assert!(Config::load(&args(&["--target-shape", "84"])).is_err());
    }

    #[test]
    fn test_bad_pattern_fails_validation() {
        let mut config = Config::default();
        config.serial.fail_patterns.push("[unterminated".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let mut config = Config::default();
        config.stream.read_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_baud_rate_override_and_validation() {
        let config = Config::load(&args(&["--baud", "230400"])).unwrap();
        assert_eq!(config.serial.baud, 230_400);
        assert!(Config::load(&args(&["--baud", "0"])).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Config::from_file(&path).is_err());
    }
}
