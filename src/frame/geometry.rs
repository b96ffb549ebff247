use super::types::{Dimensions, Point};
use crate::error::GeometryError;

/// Sensor frames whose diagonal is shorter than this are magnified for display.
pub const SMALL_FRAME_DIAGONAL: f64 = 300.0;

/// Display magnification applied to small sensor frames.
pub const SMALL_FRAME_MAGNIFICATION: u32 = 3;

/// Derived geometry for a sensor frame and the model's target region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub sensor: Dimensions,
    /// Target region size, clamped to the sensor size.
    pub target: Dimensions,
    pub target_top_left: Point,
    pub target_bottom_right: Point,
    /// Size of the frame shown in the preview.
    pub resize: Dimensions,
}

impl FrameGeometry {
    /// Parse `<W>x<H>` strings for the sensor resolution and target shape and
    /// compute the geometry from them.
    pub fn resolve(camera_resolution: &str, target_shape: &str) -> Result<Self, GeometryError> {
        let sensor = Dimensions::parse(camera_resolution)
            .ok_or_else(|| GeometryError::InvalidResolution(camera_resolution.to_string()))?;
        let target = Dimensions::parse(target_shape)
            .ok_or_else(|| GeometryError::InvalidTargetShape(target_shape.to_string()))?;
        Ok(Self::new(sensor, target))
    }

    pub fn new(sensor: Dimensions, target: Dimensions) -> Self {
        let target = Dimensions::new(
            target.width.min(sensor.width),
            target.height.min(sensor.height),
        );

        let center_x = sensor.width / 2;
        let center_y = sensor.height / 2;
        let half_w = target.width / 2;
        let half_h = target.height / 2;

        // Odd target extents lose a pixel on the bottom-right side.
        let target_top_left = Point::new(center_x - half_w, center_y - half_h);
        let target_bottom_right = Point::new(center_x + half_w, center_y + half_h);

        let resize = if sensor.diagonal() < SMALL_FRAME_DIAGONAL {
            Dimensions::new(
                sensor.width * SMALL_FRAME_MAGNIFICATION,
                sensor.height * SMALL_FRAME_MAGNIFICATION,
            )
        } else {
            sensor
        };

        Self {
            sensor,
            target,
            target_top_left,
            target_bottom_right,
            resize,
        }
    }

    /// Bytes in one complete frame.
    pub fn frame_size(&self) -> usize {
        self.sensor.area()
    }
}
