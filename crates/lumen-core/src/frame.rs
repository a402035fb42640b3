//! Channel payloads: audio chunks and RGB pixel frames.
//!
//! A [`PixelFrame`] is the (3, N) real-valued array the whole pipeline works
//! in: three rows (red, green, blue) by `len` columns (pixels), stored
//! row-major as one flat `Vec<f32>`. Values stay floating point throughout
//! the graph; only the LED sink clamps to [0, 255] and packs to bytes.
//!
//! [`ChannelValue`] is what travels along a connection: an `Arc`'d audio
//! chunk or an `Arc`'d pixel frame. Cloning a channel value copies the
//! reference, not the buffer, so the process pass can fan one producer
//! output into many consumers for free.

use std::sync::Arc;

/// The type a channel carries, fixed at effect declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Mono audio chunk (f32 samples).
    Audio,
    /// RGB pixel frame.
    Pixels,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Audio => write!(f, "audio"),
            ChannelKind::Pixels => write!(f, "pixels"),
        }
    }
}

/// A value flowing along a graph connection.
#[derive(Debug, Clone)]
pub enum ChannelValue {
    /// Mono audio chunk.
    Audio(Arc<[f32]>),
    /// RGB pixel frame.
    Pixels(Arc<PixelFrame>),
}

impl ChannelValue {
    /// Wraps an audio chunk.
    pub fn audio(samples: Vec<f32>) -> Self {
        ChannelValue::Audio(samples.into())
    }

    /// Wraps a pixel frame.
    pub fn pixels(frame: PixelFrame) -> Self {
        ChannelValue::Pixels(Arc::new(frame))
    }

    /// The kind of payload this value carries.
    pub fn kind(&self) -> ChannelKind {
        match self {
            ChannelValue::Audio(_) => ChannelKind::Audio,
            ChannelValue::Pixels(_) => ChannelKind::Pixels,
        }
    }

    /// Borrows the audio samples, if this is an audio value.
    pub fn as_audio(&self) -> Option<&[f32]> {
        match self {
            ChannelValue::Audio(samples) => Some(samples),
            ChannelValue::Pixels(_) => None,
        }
    }

    /// Borrows the pixel frame, if this is a pixel value.
    pub fn as_pixels(&self) -> Option<&PixelFrame> {
        match self {
            ChannelValue::Pixels(frame) => Some(frame),
            ChannelValue::Audio(_) => None,
        }
    }
}

/// A (3, N) RGB frame: rows red, green, blue; columns are pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelFrame {
    data: Vec<f32>,
    len: usize,
}

impl PixelFrame {
    /// All-black frame of `len` pixels.
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0.0; 3 * len],
            len,
        }
    }

    /// Frame with every pixel set to `(r, g, b)`.
    pub fn solid(len: usize, r: f32, g: f32, b: f32) -> Self {
        let mut frame = Self::new(len);
        frame.row_mut(0).fill(r);
        frame.row_mut(1).fill(g);
        frame.row_mut(2).fill(b);
        frame
    }

    /// Builds a frame from three equal-length channel rows.
    pub fn from_rows(r: &[f32], g: &[f32], b: &[f32]) -> Self {
        debug_assert!(r.len() == g.len() && g.len() == b.len());
        let len = r.len();
        let mut data = Vec::with_capacity(3 * len);
        data.extend_from_slice(r);
        data.extend_from_slice(g);
        data.extend_from_slice(b);
        Self { data, len }
    }

    /// Number of pixels (columns).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the frame has zero pixels.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrows color row `channel` (0 = red, 1 = green, 2 = blue).
    pub fn row(&self, channel: usize) -> &[f32] {
        &self.data[channel * self.len..(channel + 1) * self.len]
    }

    /// Mutably borrows color row `channel`.
    pub fn row_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.data[channel * self.len..(channel + 1) * self.len]
    }

    /// Value at `(channel, pixel)`.
    pub fn get(&self, channel: usize, pixel: usize) -> f32 {
        self.data[channel * self.len + pixel]
    }

    /// Sets the value at `(channel, pixel)`.
    pub fn set(&mut self, channel: usize, pixel: usize, value: f32) {
        self.data[channel * self.len + pixel] = value;
    }

    /// Multiplies every value by `factor`.
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.data {
            *v *= factor;
        }
    }

    /// Clamps every value into `[lo, hi]`.
    pub fn clip(&mut self, lo: f32, hi: f32) {
        for v in &mut self.data {
            *v = v.clamp(lo, hi);
        }
    }

    /// Rounds every value to the nearest integer (still stored as f32).
    pub fn round(&mut self) {
        for v in &mut self.data {
            *v = v.round();
        }
    }

    /// Per-element maximum with `other` (same length).
    pub fn max_hold(&mut self, other: &PixelFrame) {
        debug_assert_eq!(self.len, other.len);
        for (v, o) in self.data.iter_mut().zip(&other.data) {
            *v = v.max(*o);
        }
    }

    /// Shifts every row right by `k` columns; the first `k` columns keep
    /// their previous content (callers overwrite them).
    pub fn shift_right(&mut self, k: usize) {
        let k = k.min(self.len);
        for channel in 0..3 {
            let row = self.row_mut(channel);
            row.copy_within(0..row.len() - k, k);
        }
    }

    /// Rolls every row left by one column, zeroing the vacated last column.
    pub fn roll_left_zero(&mut self) {
        if self.len == 0 {
            return;
        }
        for channel in 0..3 {
            let row = self.row_mut(channel);
            row.copy_within(1.., 0);
            let last = row.len() - 1;
            row[last] = 0.0;
        }
    }

    /// Returns a copy with the column order reversed.
    pub fn flipped(&self) -> PixelFrame {
        let mut out = self.clone();
        for channel in 0..3 {
            out.row_mut(channel).reverse();
        }
        out
    }

    /// Concatenates `other` to the right of `self`.
    pub fn concat(&self, other: &PixelFrame) -> PixelFrame {
        let len = self.len + other.len;
        let mut out = PixelFrame::new(len);
        for channel in 0..3 {
            out.row_mut(channel)[..self.len].copy_from_slice(self.row(channel));
            out.row_mut(channel)[self.len..].copy_from_slice(other.row(channel));
        }
        out
    }

    /// Returns true if every value is integral (after rounding emission).
    pub fn is_integral(&self) -> bool {
        self.data.iter().all(|v| v.fract() == 0.0)
    }

    /// Flat row-major view (`[r.., g.., b..]`).
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
