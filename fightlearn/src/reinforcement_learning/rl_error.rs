use crate::vision::{Dimensions2D, PixelRegion, VisionError};

use super::health::HealthBar;

#[derive(thiserror::Error, Debug)]
pub enum RLError {
    #[error("Action out of range got: {value} when max action value is {max}.")]
    ActionOutOfRange { value: u32, max: u32 },
    #[error("Expected {expected} actions, one per environment, but received {received}.")]
    ActionCountMismatch { expected: usize, received: usize },
    #[error("Vision pipeline error: {0}")]
    Vision(#[from] VisionError),
    #[error("The {bar} health region {region} does not fit a frame of {frame:?}.")]
    HealthRegionOutOfBounds {
        bar: HealthBar,
        region: PixelRegion,
        frame: Dimensions2D,
    },
    #[error("The {bar} health region {region} contains no pixels.")]
    EmptyHealthRegion { bar: HealthBar, region: PixelRegion },
    #[error("The episode has finished, call reset before stepping again.")]
    EpisodeFinished,
    #[error("Emulator error: {0}")]
    Emulator(String),
    #[error("Couldn't parse the environment config.")]
    Config(#[from] serde_json::Error),
    #[error("IO error")]
    IOError(#[from] std::io::Error),
}

pub type RLResult<T> = std::result::Result<T, RLError>;
