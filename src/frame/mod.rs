mod buffer;
mod dump;
mod geometry;
mod processor;
mod types;

pub use buffer::FrameAssembler;
pub use dump::FrameDumper;
pub use geometry::{FrameGeometry, SMALL_FRAME_DIAGONAL, SMALL_FRAME_MAGNIFICATION};
pub use processor::{FrameProcessor, OUTLINE_INTENSITY};
pub use types::{Dimensions, Frame, Point};
