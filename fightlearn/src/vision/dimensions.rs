use serde::{Deserialize, Serialize};

use super::vision_error::{Result, Stage, VisionError};

/// Channel-major shape of a tensor: `depth` channels of `height` x `width` values.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions3D {
    pub depth: usize,
    pub height: usize,
    pub width: usize,
}

impl Dimensions3D {
    pub fn new(depth: usize, height: usize, width: usize) -> Self {
        Self {
            depth,
            height,
            width,
        }
    }

    pub fn from_d2(depth: usize, dimensions2: Dimensions2D) -> Self {
        Self {
            depth,
            height: dimensions2.height,
            width: dimensions2.width,
        }
    }

    pub fn size(&self) -> usize {
        self.depth * self.height * self.width
    }

    pub fn strides(&self) -> [usize; 3] {
        [self.height * self.width, self.width, 1]
    }

    pub fn flat_index(&self, chw: (usize, usize, usize)) -> Result<usize> {
        let sizes = [self.depth, self.height, self.width];
        let indices = [chw.0, chw.1, chw.2];
        for (dim, (&indexed_size, &real_size)) in indices.iter().zip(sizes.iter()).enumerate() {
            if indexed_size >= real_size {
                return Err(VisionError::IndexOutOfBounds {
                    stage: Stage::Normalization,
                    dim,
                    indexed_size,
                    real_size,
                });
            }
        }
        let strides = self.strides();
        Ok(chw.0 * strides[0] + chw.1 * strides[1] + chw.2 * strides[2])
    }
}

/// Height x width of a single image plane.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions2D {
    pub height: usize,
    pub width: usize,
}

impl Dimensions2D {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn size(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }
}
