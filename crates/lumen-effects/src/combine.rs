//! Two-input pixel blend node.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};

use crate::blend::BlendMode;

/// Blends two pixel streams with a configurable [`BlendMode`].
///
/// With only one input present the node passes it through; with neither it
/// emits nothing.
pub struct Combine {
    mode: BlendMode,
}

impl Combine {
    /// Registry class tag.
    pub const CLASS: &'static str = "combine";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let mut effect = Self {
            mode: BlendMode::DEFAULT,
        };
        effect.set_params(params)?;
        Ok(effect)
    }
}

impl Effect for Combine {
    fn class_name(&self) -> &'static str {
        Self::CLASS
    }

    fn input_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels, ChannelKind::Pixels]
    }

    fn output_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new().choice("mode", BlendMode::CHOICES, "lighten_only")
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("mode".into(), self.mode.name().into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        if let Some(v) = params.get("mode").and_then(|v| v.as_str()) {
            if let Some(mode) = BlendMode::from_name(v) {
                self.mode = mode;
            }
        }
        Ok(())
    }

    fn init_state(&mut self) {}

    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        let a = inputs[0].as_ref().and_then(ChannelValue::as_pixels);
        let b = inputs[1].as_ref().and_then(ChannelValue::as_pixels);
        outputs[0] = match (a, b) {
            (Some(a), Some(b)) => Some(ChannelValue::pixels(self.mode.blend(a, b))),
            (Some(one), None) | (None, Some(one)) => Some(ChannelValue::pixels(one.clone())),
            (None, None) => None,
        };
        Ok(())
    }
}
