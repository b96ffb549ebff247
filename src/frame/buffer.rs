use super::types::Dimensions;
use image::GrayImage;
use std::mem;

/// Accumulates raw stream bytes until a full sensor frame is available.
///
/// Partial data is kept across reads; the buffer only resets when a frame
/// completes.
pub struct FrameAssembler {
    buffer: Vec<u8>,
    sensor: Dimensions,
    frame_size: usize,
}

impl FrameAssembler {
    pub fn new(sensor: Dimensions) -> Self {
        let frame_size = sensor.area();
        Self {
            buffer: Vec::with_capacity(frame_size),
            sensor,
            frame_size,
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes still needed to complete the current frame.
    pub fn remaining(&self) -> usize {
        self.frame_size - self.buffer.len()
    }

    /// Append bytes to the in-progress frame.
    ///
    /// Consumes at most `remaining()` bytes and returns the completed frame,
    /// if the buffer now holds exactly `width * height` bytes, together with
    /// the unconsumed tail of `bytes`.
    pub fn push<'a>(&mut self, bytes: &'a [u8]) -> (Option<GrayImage>, &'a [u8]) {
        let (head, tail) = bytes.split_at(bytes.len().min(self.remaining()));
        self.buffer.extend_from_slice(head);

        if self.buffer.len() != self.frame_size {
            return (None, tail);
        }

        let filled = mem::replace(&mut self.buffer, Vec::with_capacity(self.frame_size));
        (
            GrayImage::from_raw(self.sensor.width, self.sensor.height, filled),
            tail,
        )
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
