use super::geometry::FrameGeometry;
use super::types::Point;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use log::trace;

/// Intensity of the target rectangle outline.
pub const OUTLINE_INTENSITY: u8 = 255;

pub struct FrameProcessor;

impl FrameProcessor {
    /// Draw the target rectangle and scale the frame for display.
    pub fn prepare_preview(mut frame: GrayImage, geometry: &FrameGeometry) -> GrayImage {
        Self::draw_outline(
            &mut frame,
            geometry.target_top_left,
            geometry.target_bottom_right,
            OUTLINE_INTENSITY,
        );
        Self::resize(&frame, geometry.resize.width, geometry.resize.height)
    }

    /// Draw a single-pixel rectangle outline with inclusive corners, clipped
    /// to the image bounds.
    pub fn draw_outline(frame: &mut GrayImage, top_left: Point, bottom_right: Point, value: u8) {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 || top_left.x >= width || top_left.y >= height {
            return;
        }
        let pixel = Luma([value]);
        let right = bottom_right.x.min(width - 1);
        let bottom = bottom_right.y.min(height - 1);

        for x in top_left.x..=right {
            frame.put_pixel(x, top_left.y, pixel);
            if bottom_right.y < height {
                frame.put_pixel(x, bottom, pixel);
            }
        }
        for y in top_left.y..=bottom {
            frame.put_pixel(top_left.x, y, pixel);
            if bottom_right.x < width {
                frame.put_pixel(right, y, pixel);
            }
        }
        trace!(
            "Outlined ({}, {})-({}, {}) on {}x{} frame",
            top_left.x,
            top_left.y,
            bottom_right.x,
            bottom_right.y,
            width,
            height
        );
    }

    pub fn resize(frame: &GrayImage, width: u32, height: u32) -> GrayImage {
        if frame.dimensions() == (width, height) {
            return frame.clone();
        }
        imageops::resize(frame, width, height, FilterType::Triangle)
    }
}
