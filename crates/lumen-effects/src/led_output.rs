//! Strip sink: the terminal node pushing frames at the transport.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};

use crate::context::EffectContext;

/// Terminal node: clamps the incoming frame to byte range and hands it to
/// the shared LED transport.
///
/// The shown frame is kept and re-exposed on the single output so a frame
/// loop (or a preview) can read back exactly what went to the hardware.
/// A transport failure is a recoverable device error; the next good frame
/// clears it.
pub struct LedOutput {
    ctx: EffectContext,
    gamma: bool,
    last_frame: Option<lumen_core::PixelFrame>,
}

impl LedOutput {
    /// Registry class tag.
    pub const CLASS: &'static str = "led_output";

    /// Creates the sink from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            gamma: false,
            last_frame: None,
        };
        effect.set_params(params)?;
        Ok(effect)
    }

    /// The frame most recently pushed to the transport.
    pub fn last_frame(&self) -> Option<&lumen_core::PixelFrame> {
        self.last_frame.as_ref()
    }
}

impl Effect for LedOutput {
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
        ParamSchema::new().boolean("gamma", false)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("gamma".into(), self.gamma.into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        if let Some(v) = params.get("gamma").and_then(|v| v.as_bool()) {
            self.gamma = v;
        }
        Ok(())
    }

    fn init_state(&mut self) {
        self.last_frame = None;
    }

    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        let Some(frame) = inputs[0].as_ref().and_then(ChannelValue::as_pixels) else {
            outputs[0] = None;
            return Ok(());
        };
        let mut frame = frame.clone();
        frame.clip(0.0, 255.0);
        frame.round();
        if self.gamma {
            for channel in 0..3 {
                for v in frame.row_mut(channel) {
                    *v = f32::from(lumen_io::gamma_correct(*v as u8));
                }
            }
        }
        {
            let mut transport = self
                .ctx
                .transport
                .lock()
                .map_err(|_| TickError::Failed("transport lock poisoned".into()))?;
            transport
                .show(&frame)
                .map_err(|e| TickError::device(e.to_string()))?;
        }
        self.last_frame = Some(frame.clone());
        outputs[0] = Some(ChannelValue::pixels(frame));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::PixelFrame;
    use lumen_io::{LedTransport, MockBackend, TestTransport};
    use std::sync::{Arc, Mutex};

    fn recording_context(num_pixels: usize) -> EffectContext {
        EffectContext {
            sample_rate: 44100.0,
            num_pixels,
            chunk_rate: 60.0,
            capture: Arc::new(MockBackend::silent()),
            transport: Arc::new(Mutex::new(
                Box::new(TestTransport::new()) as Box<dyn LedTransport>
            )),
        }
    }

    #[test]
    fn clamps_and_forwards_to_the_transport() {
        let ctx = recording_context(3);
        let mut fx = LedOutput::from_params(&ParamMap::new(), &ctx).unwrap();
        let mut outputs = vec![None];
        let hot = PixelFrame::solid(3, 300.0, -20.0, 128.4);
        fx.process(&[Some(ChannelValue::pixels(hot))], &mut outputs)
            .unwrap();
        let shown = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert_eq!(shown.get(0, 0), 255.0);
        assert_eq!(shown.get(1, 0), 0.0);
        assert_eq!(shown.get(2, 0), 128.0);
        assert_eq!(fx.last_frame().unwrap(), shown);
    }

    #[test]
    fn gamma_darkens_midtones() {
        let ctx = recording_context(1);
        let mut params = ParamMap::new();
        params.insert("gamma".into(), true.into());
        let mut fx = LedOutput::from_params(&params, &ctx).unwrap();
        let mut outputs = vec![None];
        fx.process(
            &[Some(ChannelValue::pixels(PixelFrame::solid(1, 128.0, 128.0, 128.0)))],
            &mut outputs,
        )
        .unwrap();
        let shown = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert!(shown.get(0, 0) < 128.0);
    }

    #[test]
    fn missing_input_shows_nothing() {
        let ctx = recording_context(2);
        let mut fx = LedOutput::from_params(&ParamMap::new(), &ctx).unwrap();
        let mut outputs = vec![None];
        fx.process(&[None], &mut outputs).unwrap();
        assert!(outputs[0].is_none());
        assert!(fx.last_frame().is_none());
    }
}
