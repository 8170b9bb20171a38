use super::dimensions::Dimensions2D;
use super::frame::RawFrame;
use super::vision_error::{Result, Stage, VisionError};

/// Source pixels covered by one destination pixel along an axis, with their overlap.
type AxisWeights = Vec<Vec<(usize, f64)>>;

fn axis_weights(src: usize, dst: usize) -> AxisWeights {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|d| {
            let start = d as f64 * scale;
            let end = (d + 1) as f64 * scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (overlap > 1e-9).then_some((s, overlap))
                })
                .collect()
        })
        .collect()
}

/// Resizes a color frame by area averaging: every destination pixel is the overlap-weighted
/// mean of the source pixels under it, rounded back to 8 bits. Works for any source size,
/// upscaling included.
pub fn resize_area(raw: &RawFrame, target: Dimensions2D) -> Result<RawFrame> {
    if target.is_empty() {
        return Err(VisionError::InvalidTargetSize {
            stage: Stage::Resize,
            target,
        });
    }
    let source = raw.dimensions();
    if source == target {
        return Ok(raw.clone());
    }
    let rows = axis_weights(source.height, target.height);
    let cols = axis_weights(source.width, target.width);
    let src = raw.as_bytes();
    let channels = RawFrame::CHANNELS;

    let mut data = Vec::with_capacity(target.size() * channels);
    for row_weights in &rows {
        let row_total: f64 = row_weights.iter().map(|(_, w)| w).sum();
        for col_weights in &cols {
            let col_total: f64 = col_weights.iter().map(|(_, w)| w).sum();
            let mut acc = [0.0f64; RawFrame::CHANNELS];
            for &(sy, wy) in row_weights {
                let row_offset = sy * source.width;
                for &(sx, wx) in col_weights {
                    let i = (row_offset + sx) * channels;
                    let w = wy * wx;
                    for (c, value) in acc.iter_mut().enumerate() {
                        *value += src[i + c] as f64 * w;
                    }
                }
            }
            let total = row_total * col_total;
            data.extend(
                acc.iter()
                    .map(|value| (value / total).round().clamp(0.0, 255.0) as u8),
            );
        }
    }
    RawFrame::new(target, raw.order(), data).map_err(|e| match e {
        VisionError::BufferLengthMismatch {
            expected, received, ..
        } => VisionError::BufferLengthMismatch {
            stage: Stage::Resize,
            expected,
            received,
        },
        e => e,
    })
}
