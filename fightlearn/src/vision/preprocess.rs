// preprocess.rs
use serde::{Deserialize, Serialize};

use super::dimensions::{Dimensions2D, Dimensions3D};
use super::frame::{GrayscaleFrame, RawFrame};
use super::resize::resize_area;
use super::vision_error::{Result, Stage, VisionError};

/// ImageNet channel statistics the downstream feature extractor was pretrained with.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];
pub const OBSERVATION_SIZE: usize = 96;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ObservationConfig {
    pub target: Dimensions2D,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            target: Dimensions2D::new(OBSERVATION_SIZE, OBSERVATION_SIZE),
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }
}

impl ObservationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target.is_empty() {
            return Err(VisionError::InvalidTargetSize {
                stage: Stage::Resize,
                target: self.target,
            });
        }
        for (channel, &value) in self.std.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(VisionError::InvalidNormalization { channel, value });
            }
        }
        Ok(())
    }

    pub fn dimensions(&self) -> Dimensions3D {
        Dimensions3D::from_d2(RawFrame::CHANNELS, self.target)
    }
}

/// Channel-major (`C x H x W`) normalized observation.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationTensor {
    dimensions: Dimensions3D,
    values: Vec<f32>,
}

impl ObservationTensor {
    pub fn dimensions(&self) -> Dimensions3D {
        self.dimensions
    }

    pub fn get(&self, chw: (usize, usize, usize)) -> Result<f32> {
        Ok(self.values[self.dimensions.flat_index(chw)?])
    }

    /// All values of channel `c`, row-major.
    pub fn channel(&self, c: usize) -> Result<&[f32]> {
        let start = self.dimensions.flat_index((c, 0, 0))?;
        let plane = self.dimensions.height * self.dimensions.width;
        Ok(&self.values[start..start + plane])
    }
}

impl AsRef<[f32]> for ObservationTensor {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}

/// Output of [`preprocess`]: the observation for the agent and the grayscale copy the
/// health bars are read from.
#[derive(Clone, Debug)]
pub struct Preprocessed {
    pub observation: ObservationTensor,
    pub grayscale: GrayscaleFrame,
}

pub fn preprocess(raw: &RawFrame, config: &ObservationConfig) -> Result<Preprocessed> {
    let grayscale = GrayscaleFrame::from_raw(raw);
    let observation = observation_from_raw(raw, config)?;
    Ok(Preprocessed {
        observation,
        grayscale,
    })
}

/// Resize, scale to `[0, 1]`, reorder `HWC -> CHW` and normalize per channel.
pub fn observation_from_raw(raw: &RawFrame, config: &ObservationConfig) -> Result<ObservationTensor> {
    config.validate()?;
    let resized = resize_area(raw, config.target)?;
    let dimensions = config.dimensions();
    let plane = dimensions.height * dimensions.width;
    let bytes = resized.as_bytes();
    if bytes.len() != dimensions.size() {
        return Err(VisionError::BufferLengthMismatch {
            stage: Stage::Normalization,
            expected: dimensions.size(),
            received: bytes.len(),
        });
    }

    let mut values = vec![0.0f32; dimensions.size()];
    for (i, pixel) in bytes.chunks_exact(RawFrame::CHANNELS).enumerate() {
        for (c, &byte) in pixel.iter().enumerate() {
            let scaled = byte as f32 / 255.0;
            values[c * plane + i] = (scaled - config.mean[c]) / config.std[c];
        }
    }
    Ok(ObservationTensor { dimensions, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::frame::ChannelOrder;
    use float_cmp::approx_eq;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    fn random_frame(rng: &mut XorShiftRng, dims: Dimensions2D) -> RawFrame {
        let data = (0..dims.size() * 3).map(|_| rng.gen::<u8>()).collect();
        RawFrame::new(dims, ChannelOrder::Bgr, data).unwrap()
    }

    #[test]
    fn test_observation_shape_and_range() {
        let mut rng = XorShiftRng::from_seed(*b"MyFragileSeed123");
        let config = ObservationConfig::default();
        for dims in [
            Dimensions2D::new(224, 256),
            Dimensions2D::new(224, 320),
            Dimensions2D::new(17, 5),
        ] {
            let frame = random_frame(&mut rng, dims);
            let out = preprocess(&frame, &config).unwrap();
            assert_eq!(out.observation.dimensions(), Dimensions3D::new(3, 96, 96));
            assert_eq!(out.observation.as_ref().len(), 3 * 96 * 96);
            assert!(out
                .observation
                .as_ref()
                .iter()
                .all(|v| (-3.0..=3.0).contains(v)));
            assert_eq!(out.grayscale.dimensions(), dims);
        }
    }

    #[test]
    fn test_extreme_pixels_normalize_to_expected_bounds() {
        let config = ObservationConfig::default();
        let black = RawFrame::filled(Dimensions2D::new(8, 8), ChannelOrder::Bgr, [0, 0, 0]).unwrap();
        let white =
            RawFrame::filled(Dimensions2D::new(8, 8), ChannelOrder::Bgr, [255, 255, 255]).unwrap();
        let low = observation_from_raw(&black, &config).unwrap();
        let high = observation_from_raw(&white, &config).unwrap();
        for c in 0..3 {
            let expected_low = -IMAGENET_MEAN[c] / IMAGENET_STD[c];
            let expected_high = (1.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            assert!(approx_eq!(f32, low.get((c, 0, 0)).unwrap(), expected_low, epsilon = 1e-6));
            assert!(approx_eq!(f32, high.get((c, 95, 95)).unwrap(), expected_high, epsilon = 1e-6));
        }
    }

    #[test]
    fn test_channels_are_reordered_channel_major() {
        let config = ObservationConfig::default();
        let frame = RawFrame::filled(Dimensions2D::new(96, 96), ChannelOrder::Bgr, [255, 0, 51])
            .unwrap();
        let observation = observation_from_raw(&frame, &config).unwrap();
        let first = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let second = -IMAGENET_MEAN[1] / IMAGENET_STD[1];
        let third = (0.2 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
        assert!(observation.channel(0).unwrap().iter().all(|&v| approx_eq!(f32, v, first, epsilon = 1e-6)));
        assert!(observation.channel(1).unwrap().iter().all(|&v| approx_eq!(f32, v, second, epsilon = 1e-6)));
        assert!(observation.channel(2).unwrap().iter().all(|&v| approx_eq!(f32, v, third, epsilon = 1e-6)));
    }

    #[test]
    fn test_channel_out_of_range_is_an_error() {
        let frame = RawFrame::filled(Dimensions2D::new(8, 8), ChannelOrder::Bgr, [7, 7, 7]).unwrap();
        let observation = observation_from_raw(&frame, &ObservationConfig::default()).unwrap();
        assert_eq!(observation.channel(2).unwrap().len(), 96 * 96);
        assert!(matches!(
            observation.channel(3),
            Err(VisionError::IndexOutOfBounds {
                dim: 0,
                indexed_size: 3,
                real_size: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_std_is_rejected() {
        let config = ObservationConfig {
            std: [0.229, 0.0, 0.225],
            ..Default::default()
        };
        let frame = RawFrame::filled(Dimensions2D::new(8, 8), ChannelOrder::Bgr, [0, 0, 0]).unwrap();
        let err = observation_from_raw(&frame, &config).unwrap_err();
        assert_eq!(err.stage(), Stage::Normalization);
    }
}
