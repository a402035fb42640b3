//! Onset-triggered flash.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};
use lumen_dsp::{Bandpass, ExpFilter, alpha_for};

use crate::context::EffectContext;
use crate::support::color_or_white;

/// Minimum spacing between detected beats.
const REFRACTORY_SECS: f64 = 0.1;

/// Time constant of the running energy baseline.
const BASELINE_TAU: f64 = 1.5;

/// Flashes the whole strip when bandpassed energy jumps above its running
/// baseline, then fades over `decay_time` seconds.
///
/// A beat fires when chunk energy exceeds `sensitivity` times the slow
/// baseline, at most once per 100 ms. Inputs: `0` audio, `1` color
/// (defaults to white). Output: one pixel buffer.
pub struct BeatFlash {
    ctx: EffectContext,
    sensitivity: f64,
    decay_time: f64,
    lowcut_hz: f64,
    highcut_hz: f64,
    bandpass: Option<Bandpass>,
    baseline: ExpFilter,
    level: f32,
    t: f64,
    t_last_beat: f64,
    dt: f64,
}

impl BeatFlash {
    /// Registry class tag.
    pub const CLASS: &'static str = "beat_flash";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            sensitivity: 1.3,
            decay_time: 0.5,
            lowcut_hz: 50.0,
            highcut_hz: 200.0,
            bandpass: None,
            baseline: ExpFilter::new(0.0, 0.01, 0.01),
            level: 0.0,
            t: 0.0,
            t_last_beat: f64::NEG_INFINITY,
            dt: 0.0,
        };
        effect.set_params(params)?;
        Ok(effect)
    }

    fn apply(&mut self, params: &ParamMap) {
        if let Some(v) = params.get("sensitivity").and_then(|v| v.as_f64()) {
            self.sensitivity = v;
        }
        if let Some(v) = params.get("decay_time").and_then(|v| v.as_f64()) {
            self.decay_time = v;
        }
        if let Some(v) = params.get("lowcut_hz").and_then(|v| v.as_f64()) {
            self.lowcut_hz = v;
        }
        if let Some(v) = params.get("highcut_hz").and_then(|v| v.as_f64()) {
            self.highcut_hz = v;
        }
    }
}

impl Effect for BeatFlash {
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
            .number("sensitivity", 1.3, 1.0, 4.0, 0.05)
            .number("decay_time", 0.5, 0.05, 5.0, 0.01)
            .number("lowcut_hz", 50.0, 0.0, 8000.0, 1.0)
            .number("highcut_hz", 200.0, 0.0, 8000.0, 1.0)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("sensitivity".into(), self.sensitivity.into());
        map.insert("decay_time".into(), self.decay_time.into());
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
        let alpha = alpha_for(1.0 / f64::from(self.ctx.chunk_rate), BASELINE_TAU);
        self.baseline = ExpFilter::new(0.0, alpha, alpha);
        self.level = 0.0;
        self.t = 0.0;
        self.t_last_beat = f64::NEG_INFINITY;
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
        let bandpass = self
            .bandpass
            .as_mut()
            .ok_or_else(|| TickError::Failed("state not initialized".into()))?;
        let mut filtered = audio.to_vec();
        bandpass.process_chunk(&mut filtered);
        let energy =
            filtered.iter().map(|v| v * v).sum::<f32>() / filtered.len().max(1) as f32;
        let baseline = self.baseline.update(energy);

        let armed = self.t - self.t_last_beat >= REFRACTORY_SECS;
        if armed && f64::from(energy) > self.sensitivity * f64::from(baseline.max(1e-10)) {
            self.level = 1.0;
            self.t_last_beat = self.t;
        } else if self.decay_time > 0.0 {
            self.level = (self.level - (self.dt / self.decay_time) as f32).max(0.0);
        } else {
            self.level = 0.0;
        }

        let mut frame = color_or_white(inputs[1].as_ref(), self.ctx.num_pixels);
        frame.scale(self.level);
        frame.clip(0.0, 255.0);
        outputs[0] = Some(ChannelValue::pixels(frame));
        Ok(())
    }
}
