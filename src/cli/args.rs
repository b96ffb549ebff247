use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Live view of the image stream a development board pushes over its debug
/// probe, while watching the board's serial console for start and failure
/// messages.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Sensor resolution as WIDTHxHEIGHT [default: 160x120]
    #[arg(long)]
    pub camera_resolution: Option<String>,

    /// Model input size as WIDTHxHEIGHT, outlined on the preview [default: 84x84]
    #[arg(long)]
    pub target_shape: Option<String>,

    /// Store every frame to --out-dir
    #[arg(long)]
    pub save: bool,

    /// Directory for stored frames; emptied on start [default: ./dump_images]
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Serial port of the board, or regex:<pattern> to search /dev/serial/by-id
    #[arg(long)]
    pub port: Option<String>,

    /// Baud rate of the board's console [default: 115200]
    #[arg(long)]
    pub baud: Option<u32>,

    /// Address of the image stream socket [default: 127.0.0.1:19021]
    #[arg(long)]
    pub stream_address: Option<String>,

    /// Read frames from a raw capture file instead of the board
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Do not open a preview window
    #[arg(long)]
    pub no_preview: bool,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let args = CliArgs::parse_from([
            "jlink_visu",
            "--camera-resolution",
            "320x240",
            "--save",
            "--out-dir",
            "/tmp/frames",
            "--port",
            "regex:J-Link",
            "--baud",
            "921600",
            "-vv",
        ]);
        assert_eq!(args.camera_resolution.as_deref(), Some("320x240"));
        assert!(args.save);
        assert_eq!(args.out_dir, Some(PathBuf::from("/tmp/frames")));
        assert_eq!(args.port.as_deref(), Some("regex:J-Link"));
        assert_eq!(args.baud, Some(921_600));
        assert_eq!(args.verbose, 2);
        assert!(!args.no_preview);
        assert!(args.target_shape.is_none());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
