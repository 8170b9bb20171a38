// vision.rs
pub mod dimensions;
pub mod frame;
pub mod preprocess;
pub mod resize;
pub mod vision_error;

pub use dimensions::{Dimensions2D, Dimensions3D};
pub use frame::{ChannelOrder, GrayscaleFrame, PixelRegion, RawFrame};
pub use preprocess::{preprocess, ObservationConfig, ObservationTensor, Preprocessed};
pub use vision_error::{Stage, VisionError};
