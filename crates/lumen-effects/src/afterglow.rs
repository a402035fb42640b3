//! Phosphor-style decay layered over a pixel stream.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};

use crate::context::EffectContext;

/// Holds a per-pixel glow buffer that decays linearly over `glow_time`
/// seconds and is raised to the input whenever the input is brighter.
///
/// A bright frame followed by darkness therefore trails off instead of
/// cutting out. Input: one pixel buffer. Output: one pixel buffer.
pub struct AfterGlow {
    ctx: EffectContext,
    glow_time: f64,
    glow: lumen_core::PixelFrame,
}

impl AfterGlow {
    /// Registry class tag.
    pub const CLASS: &'static str = "afterglow";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            glow_time: 1.0,
            glow: lumen_core::PixelFrame::new(ctx.num_pixels),
        };
        effect.set_params(params)?;
        Ok(effect)
    }
}

impl Effect for AfterGlow {
    fn class_name(&self) -> &'static str {
        Self::CLASS
    }

    fn input_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }

    fn output_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new().number("glow_time", 1.0, 0.0, 10.0, 0.01)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("glow_time".into(), self.glow_time.into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        if let Some(v) = params.get("glow_time").and_then(|v| v.as_f64()) {
            self.glow_time = v;
        }
        Ok(())
    }

    fn init_state(&mut self) {
        self.glow = lumen_core::PixelFrame::new(self.ctx.num_pixels);
    }

    fn update(&mut self, dt: f64) -> Result<(), TickError> {
        if self.glow_time > 0.0 {
            let keep = (1.0 - dt / self.glow_time).max(0.0) as f32;
            self.glow.scale(keep);
        } else {
            self.glow.scale(0.0);
        }
        self.glow.clip(0.0, 255.0);
        Ok(())
    }

    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        if let Some(frame) = inputs[0].as_ref().and_then(ChannelValue::as_pixels) {
            self.glow.max_hold(frame);
        }
        outputs[0] = Some(ChannelValue::pixels(self.glow.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::test_context;
    use lumen_core::PixelFrame;

    #[test]
    fn bright_frame_decays_linearly() {
        let ctx = test_context(4);
        let mut fx = AfterGlow::from_params(&ParamMap::new(), &ctx).unwrap();
        fx.init_state();
        let mut outputs = vec![None];
        let flash = PixelFrame::solid(4, 255.0, 255.0, 255.0);
        fx.process(&[Some(ChannelValue::pixels(flash))], &mut outputs)
            .unwrap();

        // One second of dark frames at 60 fps drains a glow_time of 1.0.
        for k in 1..=60u32 {
            fx.update(1.0 / 60.0).unwrap();
            fx.process(&[Some(ChannelValue::pixels(PixelFrame::new(4)))], &mut outputs)
                .unwrap();
            let got = outputs[0].as_ref().unwrap().as_pixels().unwrap().get(0, 0);
            let expected = 255.0 * (1.0 - 1.0 / 60.0_f32).powi(k as i32);
            assert!((got - expected).abs() <= 1.0, "tick {k}: {got} vs {expected}");
        }
    }

    #[test]
    fn brighter_input_resets_the_glow() {
        let ctx = test_context(2);
        let mut fx = AfterGlow::from_params(&ParamMap::new(), &ctx).unwrap();
        fx.init_state();
        let mut outputs = vec![None];
        fx.process(
            &[Some(ChannelValue::pixels(PixelFrame::solid(2, 100.0, 0.0, 0.0)))],
            &mut outputs,
        )
        .unwrap();
        fx.update(0.25).unwrap();
        fx.process(
            &[Some(ChannelValue::pixels(PixelFrame::solid(2, 200.0, 0.0, 0.0)))],
            &mut outputs,
        )
        .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert_eq!(frame.get(0, 0), 200.0);
    }

    #[test]
    fn missing_input_still_emits_the_glow() {
        let ctx = test_context(2);
        let mut fx = AfterGlow::from_params(&ParamMap::new(), &ctx).unwrap();
        fx.init_state();
        let mut outputs = vec![None];
        fx.process(
            &[Some(ChannelValue::pixels(PixelFrame::solid(2, 80.0, 0.0, 0.0)))],
            &mut outputs,
        )
        .unwrap();
        fx.update(0.1).unwrap();
        fx.process(&[None], &mut outputs).unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert!(frame.get(0, 0) > 0.0);
    }
}
