// SPDX-License-Identifier: MIT OR Apache-2.0
//! Output file naming for rendered frames.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Image format used for saved frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageCodec {
    /// Lossless PNG
    #[default]
    Png,
    /// JPEG
    Jpeg,
    /// Windows bitmap
    Bmp,
    /// TIFF
    Tiff,
}

impl ImageCodec {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::Tiff => "tif",
        }
    }

    /// Codec matching a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }
}

/// Number of decimal digits needed to print `count`
pub fn digit_width(count: usize) -> usize {
    let mut width = 1;
    let mut n = count;
    while n >= 10 {
        n /= 10;
        width += 1;
    }
    width
}

/// Builds `<dataset>_<frame>.<ext>` paths under an output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNamer {
    directory: PathBuf,
    dataset: String,
    width: usize,
    codec: ImageCodec,
}

impl FrameNamer {
    /// Frame numbers are zero-padded to the digit width of `timepoint_count`
    pub fn new(
        directory: impl Into<PathBuf>,
        dataset: impl Into<String>,
        timepoint_count: usize,
        codec: ImageCodec,
    ) -> Self {
        Self {
            directory: directory.into(),
            dataset: dataset.into(),
            width: digit_width(timepoint_count),
            codec,
        }
    }

    /// Output directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name for `frame`
    pub fn file_name(&self, frame: u32) -> String {
        format!(
            "{}_{:0width$}.{}",
            self.dataset,
            frame,
            self.codec.extension(),
            width = self.width
        )
    }

    /// Full path for `frame`
    pub fn path_for(&self, frame: u32) -> PathBuf {
        self.directory.join(self.file_name(frame))
    }

    /// Create the output directory if needed
    pub fn prepare(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_width() {
        assert_eq!(digit_width(0), 1);
        assert_eq!(digit_width(9), 1);
        assert_eq!(digit_width(10), 2);
        assert_eq!(digit_width(250), 3);
    }

    #[test]
    fn test_file_names() {
        let namer = FrameNamer::new("out", "cells", 120, ImageCodec::Png);
        assert_eq!(namer.file_name(7), "cells_007.png");
        assert_eq!(namer.path_for(42), Path::new("out").join("cells_042.png"));
        // Frame numbers wider than the padding are not truncated
        assert_eq!(namer.file_name(1234), "cells_1234.png");
    }

    #[test]
    fn test_codec_extensions() {
        assert_eq!(ImageCodec::default(), ImageCodec::Png);
        assert_eq!(ImageCodec::Jpeg.extension(), "jpg");
        assert_eq!(ImageCodec::from_extension("TIFF"), Some(ImageCodec::Tiff));
        assert_eq!(ImageCodec::from_extension("gif"), None);
    }
}
