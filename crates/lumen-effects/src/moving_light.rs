//! Bass-driven light pulse traveling along the strip.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};
use lumen_dsp::{Bandpass, gaussian_blur_row};

use crate::context::EffectContext;
use crate::support::color_or_white;

const BLUR_SIGMA: f32 = 0.5;

/// A light spawned at pixel zero by bandpassed energy, drifting toward the
/// far end while fading out.
///
/// Inputs: `0` audio, `1` color (defaults to white). Output: one pixel
/// buffer. Holds the strip state between ticks; time advances in
/// [`Effect::update`].
pub struct MovingLight {
    ctx: EffectContext,
    speed: f64,
    dim_time: f64,
    lowcut_hz: f64,
    highcut_hz: f64,
    bandpass: Option<Bandpass>,
    state: lumen_core::PixelFrame,
    t: f64,
    t_move_last: f64,
    dt: f64,
}

impl MovingLight {
    /// Registry class tag.
    pub const CLASS: &'static str = "moving_light";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            speed: 10.0,
            dim_time: 2.0,
            lowcut_hz: 50.0,
            highcut_hz: 100.0,
            bandpass: None,
            state: lumen_core::PixelFrame::new(ctx.num_pixels),
            t: 0.0,
            t_move_last: 0.0,
            dt: 0.0,
        };
        effect.set_params(params)?;
        Ok(effect)
    }

    fn apply(&mut self, params: &ParamMap) {
        if let Some(v) = params.get("speed").and_then(|v| v.as_f64()) {
            self.speed = v;
        }
        if let Some(v) = params.get("dim_time").and_then(|v| v.as_f64()) {
            self.dim_time = v;
        }
        if let Some(v) = params.get("lowcut_hz").and_then(|v| v.as_f64()) {
            self.lowcut_hz = v;
        }
        if let Some(v) = params.get("highcut_hz").and_then(|v| v.as_f64()) {
            self.highcut_hz = v;
        }
    }

    fn blur_state(&mut self, upto: usize) {
        for channel in 0..3 {
            let row = self.state.row_mut(channel);
            let end = upto.min(row.len());
            gaussian_blur_row(&mut row[..end], BLUR_SIGMA);
        }
    }
}

impl Effect for MovingLight {
    fn class_name(&self) -> &'static str {
        Self::CLASS
    }

    fn input_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Audio, ChannelKind::Pixels]
    }

    fn output_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .number("speed", 10.0, 1.0, 200.0, 1.0)
            .number("dim_time", 2.0, 0.0, 100.0, 1.0)
            .number("lowcut_hz", 50.0, 0.0, 8000.0, 1.0)
            .number("highcut_hz", 100.0, 0.0, 8000.0, 1.0)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("speed".into(), self.speed.into());
        map.insert("dim_time".into(), self.dim_time.into());
        map.insert("lowcut_hz".into(), self.lowcut_hz.into());
        map.insert("highcut_hz".into(), self.highcut_hz.into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        self.apply(params);
        self.init_state();
        Ok(())
    }

    fn init_state(&mut self) {
        self.bandpass = Some(Bandpass::new(
            self.ctx.sample_rate,
            self.lowcut_hz as f32,
            self.highcut_hz as f32,
        ));
        self.state = lumen_core::PixelFrame::new(self.ctx.num_pixels);
        self.t = 0.0;
        self.t_move_last = 0.0;
        self.dt = 0.0;
    }

    fn update(&mut self, dt: f64) -> Result<(), TickError> {
        self.t += dt;
        self.dt = dt;
        Ok(())
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
        let num_pixels = self.ctx.num_pixels;
        let bandpass = self
            .bandpass
            .as_mut()
            .ok_or_else(|| TickError::Failed("state not initialized".into()))?;
        let mut filtered = audio.to_vec();
        bandpass.process_chunk(&mut filtered);

        // Travel: move whole pixels once enough fractional distance built up.
        let since_move = self.t - self.t_move_last;
        if since_move * self.speed > 1.0 {
            let k = ((since_move * self.speed) as usize).clamp(1, num_pixels.saturating_sub(1));
            self.state.shift_right(k);
            for channel in 0..3 {
                let fill = self.state.get(channel, k);
                self.state.row_mut(channel)[..k].fill(fill);
            }
            self.blur_state(2 * k);
            self.t_move_last = self.t;
        }

        // Fade and diffuse.
        if self.dim_time > 0.0 {
            let keep = (1.0 - self.dt / self.dim_time).max(0.0) as f32;
            self.state.scale(keep);
        }
        self.blur_state(num_pixels);
        self.blur_state(num_pixels);

        // Inject energy at the origin.
        let peak = filtered.iter().fold(0.0_f32, |acc, &v| acc.max(v));
        let p = (peak * 2.0).powi(2);
        let color = color_or_white(inputs[1].as_ref(), num_pixels);
        for channel in 0..3 {
            let lit = color.get(channel, 0) * p + 255.0 * p;
            let current = self.state.get(channel, 0);
            self.state.set(channel, 0, current.max(lit));
        }
        self.state.clip(0.0, 255.0);
        outputs[0] = Some(ChannelValue::pixels(self.state.clone()));
        Ok(())
    }
}
