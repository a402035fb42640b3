//! Dual-band warped spectrum visualizer.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};
use lumen_dsp::{Preprocessor, Scale, Window, convolve_same, warped_psd};

use crate::blend::BlendMode;
use crate::context::EffectContext;
use crate::support::{color_or_white, resample_linear};

/// Bass band upper edge in Hz (roughly C0 to middle C).
const BASS_RANGE: (f32, f32) = (32.7, 261.0);

/// FFT and band-energy visualizer: bass and melody bands drawn across the
/// full strip in two colors.
///
/// Inputs: `0` audio, `1` melody color, `2` bass color (colors default to
/// white). Output: one pixel buffer.
#[derive(Debug)]
pub struct Spectrum {
    ctx: EffectContext,
    fmax: f64,
    n_overlaps: usize,
    fft_bins: usize,
    col_blend: BlendMode,
    preprocessor: Option<Preprocessor>,
    smoothing_taps: Vec<f32>,
}

impl Spectrum {
    /// Registry class tag.
    pub const CLASS: &'static str = "spectrum";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            fmax: 6000.0,
            n_overlaps: 4,
            fft_bins: 64,
            col_blend: BlendMode::DEFAULT,
            preprocessor: None,
            smoothing_taps: Vec::new(),
        };
        effect.set_params(params)?;
        Ok(effect)
    }

    fn apply(&mut self, params: &ParamMap) {
        if let Some(v) = params.get("fmax").and_then(|v| v.as_f64()) {
            self.fmax = v;
        }
        if let Some(v) = params.get("n_overlaps").and_then(|v| v.as_f64()) {
            self.n_overlaps = v as usize;
        }
        if let Some(v) = params.get("fft_bins").and_then(|v| v.as_f64()) {
            self.fft_bins = v as usize;
        }
        if let Some(v) = params.get("col_blend").and_then(|v| v.as_str()) {
            if let Some(mode) = BlendMode::from_name(v) {
                self.col_blend = mode;
            }
        }
    }

    /// Interpolates band energies to strip width, smooths, scales to 255.
    fn band_to_line(&self, band: &[f32]) -> Vec<f32> {
        let line = resample_linear(band, self.ctx.num_pixels);
        let line = convolve_same(&line, &self.smoothing_taps);
        line.into_iter().map(|v| v * 255.0).collect()
    }
}

impl Effect for Spectrum {
    fn class_name(&self) -> &'static str {
        Self::CLASS
    }

    fn input_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Audio, ChannelKind::Pixels, ChannelKind::Pixels]
    }

    fn output_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .number("fmax", 6000.0, 1000.0, 8000.0, 100.0)
            .number("n_overlaps", 4.0, 1.0, 20.0, 1.0)
            .number("fft_bins", 64.0, 32.0, 128.0, 1.0)
            .choice("col_blend", BlendMode::CHOICES, "lighten_only")
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("fmax".into(), self.fmax.into());
        map.insert("n_overlaps".into(), (self.n_overlaps as f64).into());
        map.insert("fft_bins".into(), (self.fft_bins as f64).into());
        map.insert("col_blend".into(), self.col_blend.name().into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        // The band edge also has to fit under the capture Nyquist rate,
        // which the static schema range cannot know.
        let fmax = params
            .get("fmax")
            .and_then(|v| v.as_f64())
            .unwrap_or(self.fmax);
        let nyquist = f64::from(self.ctx.sample_rate) / 2.0;
        if fmax > nyquist {
            return Err(ParamError::OutOfRange {
                name: "fmax".into(),
                value: fmax,
                min: 0.0,
                max: nyquist,
            });
        }
        self.apply(params);
        self.init_state();
        Ok(())
    }

    fn init_state(&mut self) {
        // set_params keeps fmax under the Nyquist rate; a stale combination
        // leaves the preprocessor unset and process reports it per tick.
        self.preprocessor =
            Preprocessor::new(self.ctx.sample_rate, self.fmax as f32, self.n_overlaps).ok();
        self.smoothing_taps = Window::Hamming.coefficients(8);
    }

    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        let Some(audio) = inputs[0].as_ref().and_then(ChannelValue::as_audio) else {
            outputs[0] = None;
            return Ok(());
        };
        let preprocessor = self
            .preprocessor
            .as_mut()
            .ok_or_else(|| TickError::Failed("state not initialized".into()))?;
        let fs_ds = preprocessor.out_rate();
        let Some(y) = preprocessor.push(audio) else {
            // Below the silence gate; nothing to show this tick.
            outputs[0] = None;
            return Ok(());
        };

        let bass = warped_psd(&y, self.fft_bins, fs_ds, BASS_RANGE, Scale::Bark);
        let melody = warped_psd(
            &y,
            self.fft_bins,
            fs_ds,
            (BASS_RANGE.1, self.fmax as f32),
            Scale::Bark,
        );
        let bass_line = self.band_to_line(&bass);
        let melody_line = self.band_to_line(&melody);

        let col_melody = color_or_white(inputs[1].as_ref(), self.ctx.num_pixels);
        let col_bass = color_or_white(inputs[2].as_ref(), self.ctx.num_pixels);

        // Each band tints its color buffer, then the two blend.
        let mut bass_px = col_bass;
        let mut melody_px = col_melody;
        for channel in 0..3 {
            for (v, &line) in bass_px.row_mut(channel).iter_mut().zip(&bass_line) {
                *v = *v * line / 255.0;
            }
            for (v, &line) in melody_px.row_mut(channel).iter_mut().zip(&melody_line) {
                *v = *v * line / 255.0;
            }
        }
        let mut pixels = self.col_blend.blend(&bass_px, &melody_px);
        pixels.clip(0.0, 255.0);
        pixels.round();
        outputs[0] = Some(ChannelValue::pixels(pixels));
        Ok(())
    }
}
