//! Concatenation of several pixel streams into one longer strip.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};

/// Maximum number of input strips.
pub const MAX_INPUTS: usize = 8;

/// Joins up to eight pixel inputs end to end, optionally flipping each
/// segment. Missing inputs contribute nothing.
///
/// `num_channels` fixes the input arity at construction; the `flipN`
/// toggles stay live.
pub struct Append {
    num_channels: usize,
    flip: [bool; MAX_INPUTS],
}

impl Append {
    /// Registry class tag.
    pub const CLASS: &'static str = "append";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let mut effect = Self {
            num_channels: 2,
            flip: [false; MAX_INPUTS],
        };
        effect.schema().validate(params)?;
        if let Some(v) = params.get("num_channels").and_then(|v| v.as_f64()) {
            effect.num_channels = v as usize;
        }
        effect.apply(params);
        Ok(effect)
    }

    fn apply(&mut self, params: &ParamMap) {
        for (i, flip) in self.flip.iter_mut().enumerate() {
            let name = format!("flip{i}");
            if let Some(v) = params.get(&name).and_then(|v| v.as_bool()) {
                *flip = v;
            }
        }
    }
}

impl Effect for Append {
    fn class_name(&self) -> &'static str {
        Self::CLASS
    }

    fn input_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels; self.num_channels]
    }

    fn output_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .number("num_channels", 2.0, 1.0, 8.0, 1.0)
            .boolean("flip0", false)
            .boolean("flip1", false)
            .boolean("flip2", false)
            .boolean("flip3", false)
            .boolean("flip4", false)
            .boolean("flip5", false)
            .boolean("flip6", false)
            .boolean("flip7", false)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("num_channels".into(), (self.num_channels as f64).into());
        for (i, flip) in self.flip.iter().enumerate() {
            map.insert(format!("flip{i}"), (*flip).into());
        }
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
        Ok(())
    }

    fn init_state(&mut self) {}

    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        let mut joined: Option<lumen_core::PixelFrame> = None;
        for (i, input) in inputs.iter().enumerate().take(self.num_channels) {
            let Some(frame) = input.as_ref().and_then(ChannelValue::as_pixels) else {
                continue;
            };
            let segment = if self.flip[i] {
                frame.flipped()
            } else {
                frame.clone()
            };
            joined = Some(match joined {
                Some(acc) => acc.concat(&segment),
                None => segment,
            });
        }
        outputs[0] = joined.map(ChannelValue::pixels);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::PixelFrame;

    fn ramp(n: usize, base: f32) -> PixelFrame {
        let r: Vec<f32> = (0..n).map(|i| base + i as f32).collect();
        PixelFrame::from_rows(&r, &vec![0.0; n], &vec![0.0; n])
    }

    #[test]
    fn concatenates_in_input_order() {
        let mut fx = Append::from_params(&ParamMap::new()).unwrap();
        let mut outputs = vec![None];
        fx.process(
            &[
                Some(ChannelValue::pixels(ramp(2, 0.0))),
                Some(ChannelValue::pixels(ramp(2, 10.0))),
            ],
            &mut outputs,
        )
        .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert_eq!(frame.row(0), &[0.0, 1.0, 10.0, 11.0]);
    }

    #[test]
    fn flip_reverses_a_segment() {
        let mut params = ParamMap::new();
        params.insert("flip1".into(), true.into());
        let mut fx = Append::from_params(&params).unwrap();
        let mut outputs = vec![None];
        fx.process(
            &[
                Some(ChannelValue::pixels(ramp(2, 0.0))),
                Some(ChannelValue::pixels(ramp(2, 10.0))),
            ],
            &mut outputs,
        )
        .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert_eq!(frame.row(0), &[0.0, 1.0, 11.0, 10.0]);
    }

    #[test]
    fn missing_inputs_are_skipped() {
        let mut fx = Append::from_params(&ParamMap::new()).unwrap();
        let mut outputs = vec![None];
        fx.process(
            &[None, Some(ChannelValue::pixels(ramp(3, 5.0)))],
            &mut outputs,
        )
        .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.get(0, 0), 5.0);
    }

    #[test]
    fn all_missing_yields_no_output() {
        let mut fx = Append::from_params(&ParamMap::new()).unwrap();
        let mut outputs = vec![None];
        fx.process(&[None, None], &mut outputs).unwrap();
        assert!(outputs[0].is_none());
    }

    #[test]
    fn num_channels_is_immutable() {
        let mut fx = Append::from_params(&ParamMap::new()).unwrap();
        let mut params = ParamMap::new();
        params.insert("num_channels".into(), 3.0_f64.into());
        assert!(matches!(
            fx.set_params(&params),
            Err(ParamError::Immutable(_))
        ));
    }
}
