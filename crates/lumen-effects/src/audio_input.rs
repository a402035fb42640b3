//! Audio capture source with auto-gain.

use std::time::Duration;

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};
use lumen_io::{CaptureConfig, CaptureError, CaptureStream};

use crate::context::EffectContext;

/// Read timeout; generous against scheduling hiccups while still letting
/// shutdown be detected promptly.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Capture source: one interleaved device stream, `num_channels`
/// de-interleaved audio outputs.
///
/// `update` blocks until the next chunk arrives; overflows are counted,
/// the stream is reopened, and the tick continues. The auto-gain law has an
/// instant attack (`m * g > 1` clamps `g` to `1/m`) and an exponential
/// release that climbs back to `autogain_max` over `autogain_time` seconds.
pub struct AudioInput {
    ctx: EffectContext,
    num_channels: usize,
    autogain: bool,
    autogain_max: f64,
    autogain_time: f64,
    stream: Option<Box<dyn CaptureStream>>,
    gain: f32,
    chunk: Option<Vec<f32>>,
    overflows: u64,
}

impl AudioInput {
    /// Registry class tag.
    pub const CLASS: &'static str = "audio_input";

    /// Creates the source from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            num_channels: 1,
            autogain: false,
            autogain_max: 10.0,
            autogain_time: 30.0,
            stream: None,
            gain: 1.0,
            chunk: None,
            overflows: 0,
        };
        effect.schema().validate(params)?;
        if let Some(v) = params.get("num_channels").and_then(|v| v.as_f64()) {
            effect.num_channels = v as usize;
        }
        effect.apply(params);
        Ok(effect)
    }

    /// Total overflow count since construction.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    /// Current gain value.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    fn apply(&mut self, params: &ParamMap) {
        if let Some(v) = params.get("autogain").and_then(|v| v.as_bool()) {
            self.autogain = v;
        }
        if let Some(v) = params.get("autogain_max").and_then(|v| v.as_f64()) {
            self.autogain_max = v;
        }
        if let Some(v) = params.get("autogain_time").and_then(|v| v.as_f64()) {
            self.autogain_time = v;
        }
    }

    fn open_stream(&mut self) -> Result<(), TickError> {
        let config = CaptureConfig {
            sample_rate: self.ctx.sample_rate as u32,
            chunk_frames: self.ctx.chunk_frames(),
            channels: self.num_channels as u16,
            device_name: None,
        };
        match self.ctx.capture.open(&config) {
            Ok(stream) => {
                self.stream = Some(stream);
                Ok(())
            }
            Err(err) => Err(TickError::fatal_device(format!(
                "cannot open capture: {err}"
            ))),
        }
    }

    fn apply_autogain(&mut self, chunk: &[f32]) {
        if !self.autogain {
            self.gain = 1.0;
            return;
        }
        let m = chunk.iter().fold(0.0_f32, |acc, &v| acc.max(v.abs()));
        if m * self.gain > 1.0 {
            self.gain = 1.0 / m;
        } else if f64::from(self.gain) < self.autogain_max {
            let v_min = 1.0 / self.autogain_max;
            let ramp = (1.0 / v_min)
                .powf(1.0 / (f64::from(self.ctx.chunk_rate) * self.autogain_time));
            self.gain = (f64::from(self.gain) * ramp).min(self.autogain_max) as f32;
        }
    }
}

impl Effect for AudioInput {
    fn class_name(&self) -> &'static str {
        Self::CLASS
    }

    fn input_kinds(&self) -> Vec<ChannelKind> {
        vec![]
    }

    fn output_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Audio; self.num_channels]
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .number("num_channels", 1.0, 1.0, 8.0, 1.0)
            .boolean("autogain", false)
            .number("autogain_max", 10.0, 1.0, 100.0, 1.0)
            .number("autogain_time", 30.0, 1.0, 600.0, 1.0)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("num_channels".into(), (self.num_channels as f64).into());
        map.insert("autogain".into(), self.autogain.into());
        map.insert("autogain_max".into(), self.autogain_max.into());
        map.insert("autogain_time".into(), self.autogain_time.into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        if let Some(v) = params.get("num_channels").and_then(|v| v.as_f64()) {
            if v as usize != self.num_channels {
                return Err(ParamError::Immutable("num_channels".into()));
            }
        }
        self.apply(params);
        self.init_state();
        Ok(())
    }

    fn init_state(&mut self) {
        self.stream = None;
        self.gain = 1.0;
        self.chunk = None;
    }

    fn update(&mut self, _dt: f64) -> Result<(), TickError> {
        if self.stream.is_none() {
            self.open_stream()?;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(TickError::device("capture stream unavailable"));
        };
        let chunk = match stream.read(READ_TIMEOUT) {
            Ok(chunk) => chunk,
            Err(CaptureError::Overflow(dropped)) => {
                self.overflows += dropped as u64;
                tracing::warn!(dropped, total = self.overflows, "capture overflow, reopening");
                self.stream = None;
                self.open_stream()?;
                let Some(stream) = self.stream.as_mut() else {
                    return Err(TickError::device("capture stream unavailable"));
                };
                stream
                    .read(READ_TIMEOUT)
                    .map_err(|e| TickError::device(e.to_string()))?
            }
            Err(CaptureError::Timeout(t)) => {
                self.chunk = None;
                return Err(TickError::device(format!("no audio within {t:?}")));
            }
            Err(CaptureError::Device(msg)) => {
                self.stream = None;
                self.chunk = None;
                return Err(TickError::fatal_device(msg));
            }
        };
        self.apply_autogain(&chunk);
        self.chunk = Some(chunk);
        Ok(())
    }

    fn process(
        &mut self,
        _inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        let Some(chunk) = &self.chunk else {
            outputs.iter_mut().for_each(|s| *s = None);
            return Ok(());
        };
        for (c, slot) in outputs.iter_mut().enumerate() {
            let samples: Vec<f32> = chunk
                .iter()
                .skip(c)
                .step_by(self.num_channels)
                .map(|&v| v * self.gain)
                .collect();
            *slot = Some(ChannelValue::audio(samples));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::test_context;
    use lumen_core::ParamValue;
    use std::sync::Arc;

    use lumen_io::{MockBackend, MockSignal};

    fn loud_context() -> EffectContext {
        let mut ctx = test_context(8);
        ctx.capture = Arc::new(MockBackend::new(MockSignal::Sine {
            freq: 440.0,
            amplitude: 0.25,
        }));
        ctx
    }

    #[test]
    fn deinterleaves_into_channel_outputs() {
        let ctx = loud_context();
        let mut params = ParamMap::new();
        params.insert("num_channels".into(), 2.0_f64.into());
        let mut input = AudioInput::from_params(&params, &ctx).unwrap();
        input.init_state();
        input.update(1.0 / 60.0).unwrap();

        let mut outputs = vec![None, None];
        input.process(&[], &mut outputs).unwrap();
        let left = outputs[0].as_ref().unwrap().as_audio().unwrap();
        let right = outputs[1].as_ref().unwrap().as_audio().unwrap();
        assert_eq!(left.len(), right.len());
        assert_eq!(left.len(), ctx.chunk_frames());
    }

    #[test]
    fn autogain_attack_prevents_clipping() {
        let ctx = loud_context();
        let mut params = ParamMap::new();
        params.insert("autogain".into(), ParamValue::Bool(true));
        params.insert("autogain_max".into(), 10.0_f64.into());
        let mut input = AudioInput::from_params(&params, &ctx).unwrap();
        input.init_state();

        // Gain climbs while the signal is quiet relative to full scale.
        for _ in 0..120 {
            input.update(1.0 / 60.0).unwrap();
        }
        let ramped = input.gain();
        assert!(ramped > 1.0);

        // Attack: a chunk whose peak would clip pulls gain straight down.
        input.apply_autogain(&[0.9, -0.9]);
        assert!(input.gain() <= 1.0 / 0.9 + 1e-4);
    }

    #[test]
    fn autogain_respects_ceiling() {
        let ctx = test_context(8);
        let mut params = ParamMap::new();
        params.insert("autogain".into(), ParamValue::Bool(true));
        params.insert("autogain_max".into(), 4.0_f64.into());
        params.insert("autogain_time".into(), 1.0_f64.into());
        let mut input = AudioInput::from_params(&params, &ctx).unwrap();
        input.init_state();
        for _ in 0..600 {
            input.apply_autogain(&[0.01, -0.01]);
        }
        assert!(input.gain() <= 4.0 + 1e-4);
        assert!(input.gain() > 3.9);
    }

    #[test]
    fn num_channels_is_immutable() {
        let ctx = test_context(8);
        let mut input = AudioInput::from_params(&ParamMap::new(), &ctx).unwrap();
        let mut params = ParamMap::new();
        params.insert("num_channels".into(), 2.0_f64.into());
        assert!(matches!(
            input.set_params(&params),
            Err(ParamError::Immutable(_))
        ));
    }
}
