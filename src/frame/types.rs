use image::GrayImage;
use std::fmt;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse a `<int>x<int>` string, case-insensitive on the separator.
    ///
    /// Returns `None` unless the input splits into exactly two positive
    /// integer tokens.
    pub fn parse(value: &str) -> Option<Self> {
        let lowered = value.to_lowercase();
        let mut tokens = lowered.split('x');
        let width = tokens.next()?.trim().parse::<u32>().ok()?;
        let height = tokens.next()?.trim().parse::<u32>().ok()?;
        if tokens.next().is_some() || width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }

    /// Number of single-byte pixels in a frame of this size.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn diagonal(&self) -> f64 {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        (w * w + h * h).sqrt()
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A completed sensor frame.
#[derive(Clone)]
pub struct Frame {
    pub data: GrayImage,
    /// Sequence number of this frame since the stream was first opened.
    pub nframe: u64,
}

impl Frame {
    pub fn new(data: GrayImage, nframe: u64) -> Self {
        Self { data, nframe }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(Dimensions::parse("160x120"), Some(Dimensions::new(160, 120)));
        assert_eq!(Dimensions::parse("84X84"), Some(Dimensions::new(84, 84)));
        assert_eq!(Dimensions::parse(" 320 x 240 "), Some(Dimensions::new(320, 240)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Dimensions::parse("160"), None);
        assert_eq!(Dimensions::parse("160x120x3"), None);
        assert_eq!(Dimensions::parse("ax120"), None);
        assert_eq!(Dimensions::parse("160x"), None);
        assert_eq!(Dimensions::parse("-160x120"), None);
        assert_eq!(Dimensions::parse("0x120"), None);
        assert_eq!(Dimensions::parse(""), None);
    }

    #[test]
    fn test_area_and_diagonal() {
        let dims = Dimensions::new(160, 120);
        assert_eq!(dims.area(), 19_200);
        assert!((dims.diagonal() - 200.0).abs() < f64::EPSILON);
    }
}
