use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vision::{Dimensions2D, GrayscaleFrame, PixelRegion};

use super::rl_error::{RLError, RLResult};

// Calibrated against the on-screen health bars of one build of the game (224 rows of
// 256 columns). Nothing here is derived: a different build or resolution needs new values.

/// Rows 15..20, columns 32..120 of the grayscale frame.
pub const PLAYER_HEALTH_REGION: PixelRegion = PixelRegion::new(15, 20, 32, 120);
/// Rows 15..20, columns 136..224 of the grayscale frame.
pub const OPPONENT_HEALTH_REGION: PixelRegion = PixelRegion::new(15, 20, 136, 224);
/// A pixel counts as remaining health when its intensity is strictly above this.
pub const HEALTH_PIXEL_THRESHOLD: u8 = 129;
pub const CALIBRATED_FRAME: Dimensions2D = Dimensions2D {
    height: 224,
    width: 256,
};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthBar {
    Player,
    Opponent,
}

impl fmt::Display for HealthBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthBar::Player => write!(f, "player"),
            HealthBar::Opponent => write!(f, "opponent"),
        }
    }
}

/// Most recently measured health of both fighters, as fractions in `[0, 1]`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct HealthState {
    pub player: f64,
    pub opponent: f64,
}

impl HealthState {
    pub const FULL: HealthState = HealthState {
        player: 1.0,
        opponent: 1.0,
    };

    pub fn new(player: f64, opponent: f64) -> Self {
        Self { player, opponent }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::FULL
    }
}

/// Where the two health bars are and how bright a lit bar pixel is.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct HealthBars {
    pub player: PixelRegion,
    pub opponent: PixelRegion,
    pub threshold: u8,
}

impl Default for HealthBars {
    fn default() -> Self {
        Self {
            player: PLAYER_HEALTH_REGION,
            opponent: OPPONENT_HEALTH_REGION,
            threshold: HEALTH_PIXEL_THRESHOLD,
        }
    }
}

impl HealthBars {
    pub fn region(&self, bar: HealthBar) -> &PixelRegion {
        match bar {
            HealthBar::Player => &self.player,
            HealthBar::Opponent => &self.opponent,
        }
    }

    /// Checks both regions are non-empty and lie inside frames of `frame` dimensions.
    pub fn validate(&self, frame: Dimensions2D) -> RLResult<()> {
        for bar in [HealthBar::Player, HealthBar::Opponent] {
            let region = *self.region(bar);
            if region.is_empty() {
                return Err(RLError::EmptyHealthRegion { bar, region });
            }
            if !region.fits(frame) {
                return Err(RLError::HealthRegionOutOfBounds { bar, region, frame });
            }
        }
        Ok(())
    }

    /// Fraction of lit pixels in one bar.
    pub fn read(&self, gray: &GrayscaleFrame, bar: HealthBar) -> RLResult<f64> {
        let region = *self.region(bar);
        if region.is_empty() {
            return Err(RLError::EmptyHealthRegion { bar, region });
        }
        if !region.fits(gray.dimensions()) {
            return Err(RLError::HealthRegionOutOfBounds {
                bar,
                region,
                frame: gray.dimensions(),
            });
        }
        let lit = gray.count_above(&region, self.threshold)?;
        Ok(lit as f64 / region.size() as f64)
    }

    pub fn measure(&self, gray: &GrayscaleFrame) -> RLResult<HealthState> {
        Ok(HealthState {
            player: self.read(gray, HealthBar::Player)?,
            opponent: self.read(gray, HealthBar::Opponent)?,
        })
    }
}
