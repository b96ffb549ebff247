use anyhow::{Context, Result};
use image::GrayImage;
use log::{debug, info, warn};
use std::fs;
use std::path::PathBuf;

/// Writes completed frames to disk as sequentially numbered JPEG files.
pub struct FrameDumper {
    dir: PathBuf,
    counter: u64,
}

impl FrameDumper {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: 0,
        }
    }

    /// Empty `dir` (creating it if needed) and return a dumper writing into it.
    pub fn prepare(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if dir.is_dir() {
            let stale = fs::read_dir(&dir)
                .with_context(|| format!("Failed to list {}", dir.display()))?
                .count();
            if stale > 0 {
                warn!("Removing {} existing entries from {}", stale, dir.display());
            }
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to clear {}", dir.display()))?;
        }
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        info!("Dumping images to {}", dir.display());
        Ok(Self::new(dir))
    }

    /// Number of frames written so far.
    pub fn count(&self) -> u64 {
        self.counter
    }

    pub fn next_path(&self) -> PathBuf {
        self.dir.join(format!("{:06}.jpg", self.counter))
    }

    pub fn save(&mut self, frame: &GrayImage) -> Result<PathBuf> {
        let path = self.next_path();
        frame
            .save(&path)
            .with_context(|| format!("Failed to write frame to {}", path.display()))?;
        debug!("Saved frame {}", path.display());
        self.counter += 1;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_names_are_zero_padded_and_sequential() {
        let tmp = tempfile::tempdir().unwrap();
        let mut dumper = FrameDumper::new(tmp.path());
        let frame = GrayImage::from_pixel(8, 8, Luma([128]));

        let first = dumper.save(&frame).unwrap();
        let second = dumper.save(&frame).unwrap();

        assert_eq!(first.file_name().unwrap(), "000000.jpg");
        assert_eq!(second.file_name().unwrap(), "000001.jpg");
        assert_eq!(dumper.count(), 2);

        let decoded = image::open(&first).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (8, 8));
    }

    #[test]
    fn test_prepare_clears_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("dump");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("000000.jpg"), b"stale").unwrap();

        let dumper = FrameDumper::prepare(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
        assert_eq!(dumper.count(), 0);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut dumper = FrameDumper::new(tmp.path().join("missing"));
        assert!(dumper.save(&GrayImage::new(2, 2)).is_err());
        assert_eq!(dumper.count(), 0);
    }
}
