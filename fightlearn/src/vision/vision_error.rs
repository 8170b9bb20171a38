use std::fmt;

use super::dimensions::Dimensions2D;
use super::frame::PixelRegion;

/// Pipeline stage that produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    FrameCapture,
    GrayscaleConversion,
    Resize,
    Normalization,
    HealthRegionRead,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FrameCapture => "frame capture",
            Stage::GrayscaleConversion => "grayscale conversion",
            Stage::Resize => "resize",
            Stage::Normalization => "normalization",
            Stage::HealthRegionRead => "health region read",
        };
        write!(f, "{name}")
    }
}

#[derive(thiserror::Error, Debug)]
pub enum VisionError {
    #[error("Empty frame in {stage}: got {dimensions:?}.")]
    EmptyFrame {
        stage: Stage,
        dimensions: Dimensions2D,
    },
    #[error("Buffer length mismatch in {stage}. Expected {expected} values but received {received}.")]
    BufferLengthMismatch {
        stage: Stage,
        expected: usize,
        received: usize,
    },
    #[error("Channel count mismatch in {stage}. Expected {expected} channels but received {received}.")]
    ChannelCountMismatch {
        stage: Stage,
        expected: usize,
        received: usize,
    },
    #[error("Invalid target size {target:?} in {stage}.")]
    InvalidTargetSize { stage: Stage, target: Dimensions2D },
    #[error("Invalid normalization std {value} for channel {channel}.")]
    InvalidNormalization { channel: usize, value: f32 },
    #[error("Region {region} does not fit a frame of {frame:?} in {stage}.")]
    RegionOutOfBounds {
        stage: Stage,
        region: PixelRegion,
        frame: Dimensions2D,
    },
    #[error(
        "Dimension {dim} out of bounds in {stage}, indexed with `{indexed_size}` when the real size is `{real_size}`."
    )]
    IndexOutOfBounds {
        stage: Stage,
        dim: usize,
        indexed_size: usize,
        real_size: usize,
    },
}

impl VisionError {
    pub fn stage(&self) -> Stage {
        match self {
            VisionError::EmptyFrame { stage, .. }
            | VisionError::BufferLengthMismatch { stage, .. }
            | VisionError::ChannelCountMismatch { stage, .. }
            | VisionError::InvalidTargetSize { stage, .. }
            | VisionError::RegionOutOfBounds { stage, .. }
            | VisionError::IndexOutOfBounds { stage, .. } => *stage,
            VisionError::InvalidNormalization { .. } => Stage::Normalization,
        }
    }
}

pub type Result<T> = std::result::Result<T, VisionError>;
