use super::PreviewSurface;
use crate::error::{AppError, Result};
use crate::frame::Dimensions;
use image::GrayImage;
use log::{debug, error, info, warn};
use std::io::Write;
use std::process::{Child, Command, Stdio};

/// Live preview window backed by an `ffplay` child reading raw gray frames.
///
/// The player is started on the first frame and restarted if the operator
/// closes the window.
pub struct FfplayPreview {
    program: String,
    title: String,
    size: Dimensions,
    child: Option<Child>,
}

impl FfplayPreview {
    pub fn new(program: impl Into<String>, title: impl Into<String>, size: Dimensions) -> Self {
        Self {
            program: program.into(),
            title: title.into(),
            size,
            child: None,
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-fflags".to_string(),
            "nobuffer".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pixel_format".to_string(),
            "gray".to_string(),
            "-video_size".to_string(),
            self.size.to_string(),
            "-window_title".to_string(),
            self.title.clone(),
            "-i".to_string(),
            "-".to_string(),
        ]
    }

    fn spawn(&self) -> Result<Child> {
        let child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AppError::preview(format!("Failed to start {}: {}", self.program, e)))?;
        info!("Started {} for {} preview", self.program, self.size);
        Ok(child)
    }

    fn ensure_running(&mut self) -> Result<&mut Child> {
        let exited = match self.child.as_mut() {
            Some(child) => child.try_wait()?.is_some(),
            None => true,
        };
        if exited {
            if self.child.take().is_some() {
                warn!("Preview window was closed, reopening");
            }
            self.child = Some(self.spawn()?);
        }
        self.child
            .as_mut()
            .ok_or_else(|| AppError::preview("preview process missing"))
    }
}

impl PreviewSurface for FfplayPreview {
    fn show(&mut self, frame: &GrayImage) -> Result<()> {
        if frame.dimensions() != (self.size.width, self.size.height) {
            return Err(AppError::preview(format!(
                "frame is {}x{}, preview expects {}",
                frame.width(),
                frame.height(),
                self.size
            )));
        }

        let child = self.ensure_running()?;
        let stdin = child
            .stdin
            .as_mut()
            .ok_or_else(|| AppError::preview("Failed to get stdin of preview process"))?;

        if let Err(e) = stdin.write_all(frame.as_raw()) {
            // Let the next frame respawn the player
            debug!("Preview write failed: {}", e);
            self.child = None;
            return Err(AppError::preview(format!("Failed to write frame: {}", e)));
        }
        Ok(())
    }
}

impl Drop for FfplayPreview {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            drop(child.stdin.take());
            if let Err(e) = child.kill() {
                error!("Failed to kill preview process: {}", e);
            }
            let _ = child.wait();
        }
    }
}
