// frame.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use super::dimensions::Dimensions2D;
use super::vision_error::{Result, Stage, VisionError};

/// Byte order of the three interleaved color channels of a [`RawFrame`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Blue, green, red. The convention the health bar calibration was made under.
    #[default]
    Bgr,
    Rgb,
}

/// A color frame as produced by the emulator: `height` x `width` x 3, row-major, interleaved.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFrame {
    dimensions: Dimensions2D,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl RawFrame {
    pub const CHANNELS: usize = 3;

    pub fn new(dimensions: Dimensions2D, order: ChannelOrder, data: Vec<u8>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(VisionError::EmptyFrame {
                stage: Stage::FrameCapture,
                dimensions,
            });
        }
        let expected = dimensions.size() * Self::CHANNELS;
        if data.len() != expected {
            return Err(VisionError::BufferLengthMismatch {
                stage: Stage::FrameCapture,
                expected,
                received: data.len(),
            });
        }
        Ok(Self {
            dimensions,
            order,
            data,
        })
    }

    /// Builds a frame from interleaved pixels with 3 or 4 channels. A fourth (alpha) channel
    /// is dropped.
    pub fn from_interleaved(
        dimensions: Dimensions2D,
        channels: usize,
        order: ChannelOrder,
        data: &[u8],
    ) -> Result<Self> {
        match channels {
            3 => Self::new(dimensions, order, data.to_vec()),
            4 => {
                let expected = dimensions.size() * 4;
                if data.len() != expected {
                    return Err(VisionError::BufferLengthMismatch {
                        stage: Stage::FrameCapture,
                        expected,
                        received: data.len(),
                    });
                }
                let rgb = data
                    .chunks_exact(4)
                    .flat_map(|pixel| pixel[..3].iter().copied())
                    .collect();
                Self::new(dimensions, order, rgb)
            }
            received => Err(VisionError::ChannelCountMismatch {
                stage: Stage::FrameCapture,
                expected: Self::CHANNELS,
                received,
            }),
        }
    }

    /// A frame where every pixel has the same three channel values.
    pub fn filled(dimensions: Dimensions2D, order: ChannelOrder, pixel: [u8; 3]) -> Result<Self> {
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(dimensions.size() * Self::CHANNELS)
            .collect();
        Self::new(dimensions, order, data)
    }

    pub fn dimensions(&self) -> Dimensions2D {
        self.dimensions
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Keeps the bytes and changes how their channels are interpreted.
    pub fn reinterpret(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, row: usize, col: usize) -> Option<[u8; 3]> {
        if row >= self.dimensions.height || col >= self.dimensions.width {
            return None;
        }
        let i = (row * self.dimensions.width + col) * Self::CHANNELS;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, pixel: [u8; 3]) {
        if row >= self.dimensions.height || col >= self.dimensions.width {
            return;
        }
        let i = (row * self.dimensions.width + col) * Self::CHANNELS;
        self.data[i..i + 3].copy_from_slice(&pixel);
    }

    /// Paints every pixel of `region` that lies inside the frame.
    pub fn fill_region(&mut self, region: &PixelRegion, pixel: [u8; 3]) {
        for row in region.top..region.bottom.min(self.dimensions.height) {
            for col in region.left..region.right.min(self.dimensions.width) {
                self.set_pixel(row, col, pixel);
            }
        }
    }
}

/// Single channel 8-bit image derived from a [`RawFrame`].
#[derive(Clone, Debug, PartialEq)]
pub struct GrayscaleFrame {
    dimensions: Dimensions2D,
    data: Vec<u8>,
}

impl GrayscaleFrame {
    pub fn new(dimensions: Dimensions2D, data: Vec<u8>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(VisionError::EmptyFrame {
                stage: Stage::GrayscaleConversion,
                dimensions,
            });
        }
        if data.len() != dimensions.size() {
            return Err(VisionError::BufferLengthMismatch {
                stage: Stage::GrayscaleConversion,
                expected: dimensions.size(),
                received: data.len(),
            });
        }
        Ok(Self { dimensions, data })
    }

    /// Luma conversion with the fixed-point weights of the usual BGR to gray routine:
    /// `(1868 * B + 9617 * G + 4899 * R + 2^13) >> 14`.
    pub fn from_raw(raw: &RawFrame) -> Self {
        let data = raw
            .as_bytes()
            .chunks_exact(RawFrame::CHANNELS)
            .map(|pixel| match raw.order() {
                ChannelOrder::Bgr => luma(pixel[2], pixel[1], pixel[0]),
                ChannelOrder::Rgb => luma(pixel[0], pixel[1], pixel[2]),
            })
            .collect();
        Self {
            dimensions: raw.dimensions(),
            data,
        }
    }

    pub fn dimensions(&self) -> Dimensions2D {
        self.dimensions
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, row: usize, col: usize) -> Option<u8> {
        if row >= self.dimensions.height || col >= self.dimensions.width {
            return None;
        }
        Some(self.data[row * self.dimensions.width + col])
    }

    /// Number of pixels in `region` with an intensity strictly above `threshold`.
    pub fn count_above(&self, region: &PixelRegion, threshold: u8) -> Result<usize> {
        if !region.fits(self.dimensions) {
            return Err(VisionError::RegionOutOfBounds {
                stage: Stage::HealthRegionRead,
                region: *region,
                frame: self.dimensions,
            });
        }
        let width = self.dimensions.width;
        let count = (region.top..region.bottom)
            .map(|row| {
                self.data[row * width + region.left..row * width + region.right]
                    .iter()
                    .filter(|&&value| value > threshold)
                    .count()
            })
            .sum();
        Ok(count)
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    const R_WEIGHT: u32 = 4899;
    const G_WEIGHT: u32 = 9617;
    const B_WEIGHT: u32 = 1868;
    const SHIFT: u32 = 14;
    let weighted = r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT;
    ((weighted + (1 << (SHIFT - 1))) >> SHIFT) as u8
}

/// Half-open rectangle of pixels: rows `top..bottom`, columns `left..right`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl PixelRegion {
    pub const fn new(top: usize, bottom: usize, left: usize, right: usize) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    pub fn height(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }

    pub fn width(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    pub fn size(&self) -> usize {
        self.height() * self.width()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn fits(&self, frame: Dimensions2D) -> bool {
        !self.is_empty() && self.bottom <= frame.height && self.right <= frame.width
    }
}

impl fmt::Display for PixelRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}, {}..{}]",
            self.top, self.bottom, self.left, self.right
        )
    }
}
