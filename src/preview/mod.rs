mod ffplay;

pub use ffplay::FfplayPreview;

use crate::error::Result;
use image::GrayImage;

/// Window title used for the live preview.
pub const PREVIEW_TITLE: &str = "Development Board Samples";

/// Somewhere to show annotated frames as they arrive.
pub trait PreviewSurface: Send {
    fn show(&mut self, frame: &GrayImage) -> Result<()>;
}

impl<P: PreviewSurface + ?Sized> PreviewSurface for Box<P> {
    fn show(&mut self, frame: &GrayImage) -> Result<()> {
        (**self).show(frame)
    }
}

/// Headless preview that discards frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPreview;

impl NullPreview {
    pub fn new() -> Self {
        Self
    }
}

impl PreviewSurface for NullPreview {
    fn show(&mut self, _frame: &GrayImage) -> Result<()> {
        Ok(())
    }
}
