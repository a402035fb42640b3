//! Small helpers shared across effect implementations.

use lumen_core::{ChannelValue, PixelFrame};

/// Resolves an optional color input, defaulting to all-white.
pub(crate) fn color_or_white(input: Option<&ChannelValue>, num_pixels: usize) -> PixelFrame {
    match input.and_then(ChannelValue::as_pixels) {
        Some(frame) => frame.clone(),
        None => PixelFrame::solid(num_pixels, 255.0, 255.0, 255.0),
    }
}

/// Linearly resamples `src` to `dst_len` points over the same [0, 1] span.
pub(crate) fn resample_linear(src: &[f32], dst_len: usize) -> Vec<f32> {
    if src.is_empty() || dst_len == 0 {
        return vec![0.0; dst_len];
    }
    if src.len() == 1 {
        return vec![src[0]; dst_len];
    }
    (0..dst_len)
        .map(|i| {
            let pos = if dst_len == 1 {
                0.0
            } else {
                i as f32 / (dst_len - 1) as f32 * (src.len() - 1) as f32
            };
            let base = (pos.floor() as usize).min(src.len() - 2);
            let frac = pos - base as f32;
            src[base] * (1.0 - frac) + src[base + 1] * frac
        })
        .collect()
}
