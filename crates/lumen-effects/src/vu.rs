//! Level-meter effects: RMS and dB-peak bar graphs.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};
use lumen_dsp::rms;

use crate::context::EffectContext;
use crate::support::color_or_white;

fn draw_bar(color: &lumen_core::PixelFrame, level: f32, num_pixels: usize) -> lumen_core::PixelFrame {
    let mut out = color.clone();
    let lit = ((num_pixels as f32 * level).floor() as usize).clamp(0, num_pixels.saturating_sub(1));
    for channel in 0..3 {
        for v in &mut out.row_mut(channel)[lit..] {
            *v = 0.0;
        }
    }
    out
}

/// RMS bar meter: lights pixels `0..⌊N * rms⌋` with the color input.
///
/// Inputs: `0` audio, `1` color (defaults to white). Output: one pixel
/// buffer.
pub struct VuMeterRms {
    ctx: EffectContext,
}

impl VuMeterRms {
    /// Registry class tag.
    pub const CLASS: &'static str = "vu_rms";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self { ctx: ctx.clone() };
        effect.set_params(params)?;
        Ok(effect)
    }
}

impl Effect for VuMeterRms {
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
    }

    fn params(&self) -> ParamMap {
        ParamMap::new()
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)
    }

    fn init_state(&mut self) {}

    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        let Some(audio) = inputs[0].as_ref().and_then(ChannelValue::as_audio) else {
            outputs[0] = None;
            return Ok(());
        };
        let level = rms(audio).clamp(0.0, 1.0);
        let color = color_or_white(inputs[1].as_ref(), self.ctx.num_pixels);
        outputs[0] = Some(ChannelValue::pixels(draw_bar(
            &color,
            level,
            self.ctx.num_pixels,
        )));
        Ok(())
    }
}

/// Peak bar meter on a dB scale.
///
/// The chunk peak is converted to `d = 20 * log10(max(peak, 1e-16))` and
/// mapped to a `(db_range + d) / db_range` fill fraction, so a `db_range`
/// of 60 lights the whole strip at 0 dBFS and goes dark at -60 dBFS.
pub struct VuMeterPeak {
    ctx: EffectContext,
    db_range: f64,
}

impl VuMeterPeak {
    /// Registry class tag.
    pub const CLASS: &'static str = "vu_peak";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            db_range: 60.0,
        };
        effect.set_params(params)?;
        Ok(effect)
    }
}

impl Effect for VuMeterPeak {
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
        ParamSchema::new().number("db_range", 60.0, 20.0, 100.0, 1.0)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("db_range".into(), self.db_range.into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        if let Some(v) = params.get("db_range").and_then(|v| v.as_f64()) {
            self.db_range = v;
        }
        Ok(())
    }

    fn init_state(&mut self) {}

    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        let Some(audio) = inputs[0].as_ref().and_then(ChannelValue::as_audio) else {
            outputs[0] = None;
            return Ok(());
        };
        let peak = audio.iter().fold(0.0_f32, |acc, &v| acc.max(v.abs()));
        let d = 20.0 * f64::from(peak.max(1e-16)).log10();
        let level = ((self.db_range + d) / self.db_range).clamp(0.0, 1.0) as f32;
        let color = color_or_white(inputs[1].as_ref(), self.ctx.num_pixels);
        outputs[0] = Some(ChannelValue::pixels(draw_bar(
            &color,
            level,
            self.ctx.num_pixels,
        )));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::test_context;

    #[test]
    fn rms_meter_scales_with_level() {
        let ctx = test_context(100);
        let mut fx = VuMeterRms::from_params(&ParamMap::new(), &ctx).unwrap();
        let mut outputs = vec![None];
        fx.process(
            &[Some(ChannelValue::audio(vec![0.5; 128])), None],
            &mut outputs,
        )
        .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        // rms of a constant 0.5 signal is 0.5; half the strip lights up.
        assert_eq!(frame.get(0, 0), 255.0);
        assert_eq!(frame.get(0, 48), 255.0);
        assert_eq!(frame.get(0, 51), 0.0);
    }

    #[test]
    fn peak_meter_full_scale_lights_everything() {
        let ctx = test_context(10);
        let mut fx = VuMeterPeak::from_params(&ParamMap::new(), &ctx).unwrap();
        let mut outputs = vec![None];
        fx.process(
            &[Some(ChannelValue::audio(vec![1.0; 64])), None],
            &mut outputs,
        )
        .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        // 0 dBFS maps to a full bar except the very last index.
        assert!(frame.row(0)[..9].iter().all(|&v| v == 255.0));
    }

    #[test]
    fn peak_meter_clamps_below_range() {
        let ctx = test_context(10);
        let mut fx = VuMeterPeak::from_params(&ParamMap::new(), &ctx).unwrap();
        let mut outputs = vec![None];
        // -80 dBFS with a 60 dB range stays dark.
        fx.process(
            &[Some(ChannelValue::audio(vec![1e-4; 64])), None],
            &mut outputs,
        )
        .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert!(frame.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rms_meter_exposes_no_parameters() {
        let ctx = test_context(10);
        let mut fx = VuMeterRms::from_params(&ParamMap::new(), &ctx).unwrap();
        assert!(fx.schema().is_empty());
        // The dB range knob belongs to the peak meter only.
        let mut params = ParamMap::new();
        params.insert("db_range".into(), 40.0_f64.into());
        assert!(matches!(
            fx.set_params(&params),
            Err(ParamError::UnknownParameter(_))
        ));
    }

    #[test]
    fn missing_audio_yields_no_output() {
        let ctx = test_context(10);
        let mut fx = VuMeterRms::from_params(&ParamMap::new(), &ctx).unwrap();
        let mut outputs = vec![None];
        fx.process(&[None, None], &mut outputs).unwrap();
        assert!(outputs[0].is_none());
    }
}
