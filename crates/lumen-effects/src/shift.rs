//! Scrolling trail: the strip drifts left while new input stacks on top.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};

use crate::context::EffectContext;

/// Rolls the held strip one pixel toward index zero at `speed` columns per
/// second, dims what remains over `dim_time`, then adds the input frame.
///
/// Input: one pixel buffer. Output: one pixel buffer.
pub struct Shift {
    ctx: EffectContext,
    speed: f64,
    dim_time: f64,
    state: lumen_core::PixelFrame,
    carry: f64,
    dt: f64,
}

impl Shift {
    /// Registry class tag.
    pub const CLASS: &'static str = "shift";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            speed: 2.0,
            dim_time: 0.1,
            state: lumen_core::PixelFrame::new(ctx.num_pixels),
            carry: 0.0,
            dt: 0.0,
        };
        effect.set_params(params)?;
        Ok(effect)
    }
}

impl Effect for Shift {
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
        ParamSchema::new()
            .number("speed", 2.0, 0.0, 100.0, 0.1)
            .number("dim_time", 0.1, 0.01, 10.0, 0.01)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("speed".into(), self.speed.into());
        map.insert("dim_time".into(), self.dim_time.into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        if let Some(v) = params.get("speed").and_then(|v| v.as_f64()) {
            self.speed = v;
        }
        if let Some(v) = params.get("dim_time").and_then(|v| v.as_f64()) {
            self.dim_time = v;
        }
        Ok(())
    }

    fn init_state(&mut self) {
        self.state = lumen_core::PixelFrame::new(self.ctx.num_pixels);
        self.carry = 0.0;
        self.dt = 0.0;
    }

    fn update(&mut self, dt: f64) -> Result<(), TickError> {
        self.dt = dt;
        self.carry += dt * self.speed;
        Ok(())
    }

    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        while self.carry >= 1.0 {
            self.state.roll_left_zero();
            self.carry -= 1.0;
        }
        if self.dim_time > 0.0 {
            let keep = (1.0 - self.dt / self.dim_time).max(0.0) as f32;
            self.state.scale(keep);
        }
        if let Some(frame) = inputs[0].as_ref().and_then(ChannelValue::as_pixels) {
            for channel in 0..3 {
                for (v, &add) in self
                    .state
                    .row_mut(channel)
                    .iter_mut()
                    .zip(frame.row(channel))
                {
                    *v += add;
                }
            }
        }
        self.state.clip(0.0, 255.0);
        outputs[0] = Some(ChannelValue::pixels(self.state.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::test_context;
    use lumen_core::PixelFrame;

    fn spot(len: usize, pixel: usize) -> PixelFrame {
        let mut f = PixelFrame::new(len);
        f.set(0, pixel, 200.0);
        f
    }

    #[test]
    fn content_rolls_toward_index_zero() {
        let ctx = test_context(8);
        let mut params = ParamMap::new();
        params.insert("speed".into(), 60.0_f64.into());
        params.insert("dim_time".into(), 10.0_f64.into());
        let mut fx = Shift::from_params(&params, &ctx).unwrap();
        fx.init_state();
        let mut outputs = vec![None];
        fx.process(&[Some(ChannelValue::pixels(spot(8, 4)))], &mut outputs)
            .unwrap();
        // One tick at 60 px/s and 60 fps moves the spot one column left.
        fx.update(1.0 / 60.0).unwrap();
        fx.process(&[Some(ChannelValue::pixels(PixelFrame::new(8)))], &mut outputs)
            .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert!(frame.get(0, 3) > 0.0);
        assert_eq!(frame.get(0, 4), 0.0);
    }

    #[test]
    fn vacated_right_edge_goes_dark() {
        let ctx = test_context(4);
        let mut params = ParamMap::new();
        params.insert("speed".into(), 60.0_f64.into());
        params.insert("dim_time".into(), 10.0_f64.into());
        let mut fx = Shift::from_params(&params, &ctx).unwrap();
        fx.init_state();
        let mut outputs = vec![None];
        fx.process(
            &[Some(ChannelValue::pixels(PixelFrame::solid(4, 100.0, 0.0, 0.0)))],
            &mut outputs,
        )
        .unwrap();
        fx.update(1.0 / 60.0).unwrap();
        fx.process(&[Some(ChannelValue::pixels(PixelFrame::new(4)))], &mut outputs)
            .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert_eq!(frame.get(0, 3), 0.0);
        assert!(frame.get(0, 0) > 0.0);
    }

    #[test]
    fn additive_input_saturates_at_full_scale() {
        let ctx = test_context(2);
        let mut fx = Shift::from_params(&ParamMap::new(), &ctx).unwrap();
        fx.init_state();
        let bright = PixelFrame::solid(2, 200.0, 200.0, 200.0);
        let mut outputs = vec![None];
        fx.process(&[Some(ChannelValue::pixels(bright.clone()))], &mut outputs)
            .unwrap();
        fx.process(&[Some(ChannelValue::pixels(bright))], &mut outputs)
            .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert_eq!(frame.get(0, 0), 255.0);
    }
}
