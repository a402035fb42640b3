//! Strip mirroring with optional recursive subdivision.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};

use crate::context::EffectContext;

/// Builds the output-to-input index table for one mirror pass over `n`
/// pixels, folding `depth` times. Depth 0 is the identity.
fn mirror_table(n: usize, mirror_lower: bool, depth: usize) -> Vec<usize> {
    if depth == 0 || n <= 1 {
        return (0..n).collect();
    }
    if !mirror_lower {
        // Reflecting the upper half down is the lower-mirror of the
        // reversed strip.
        let lower = mirror_table(n, true, depth);
        return (0..n).map(|i| n - 1 - lower[n - 1 - i]).collect();
    }
    let half = n / 2;
    let inner = mirror_table(half, true, depth - 1);
    let mut table = vec![0; n];
    for i in 0..half {
        table[i] = inner[i];
        table[n - 1 - i] = inner[i];
    }
    if n % 2 == 1 {
        table[half] = if half > 0 { inner[half - 1] } else { 0 };
    }
    table
}

/// Reflects one half of the strip onto the other, optionally recursing so
/// the pattern tiles in ever smaller mirrored segments.
///
/// Stateless apart from a cached index table; the output is a pure
/// permutation (with duplication) of the input columns.
pub struct Mirror {
    ctx: EffectContext,
    mirror_lower: bool,
    recursion: usize,
    table: Vec<usize>,
}

impl Mirror {
    /// Registry class tag.
    pub const CLASS: &'static str = "mirror";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            mirror_lower: true,
            recursion: 1,
            table: Vec::new(),
        };
        effect.set_params(params)?;
        Ok(effect)
    }
}

impl Effect for Mirror {
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
            .boolean("mirror_lower", true)
            .number("recursion", 1.0, 0.0, 8.0, 1.0)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("mirror_lower".into(), self.mirror_lower.into());
        map.insert("recursion".into(), (self.recursion as f64).into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        if let Some(v) = params.get("mirror_lower").and_then(|v| v.as_bool()) {
            self.mirror_lower = v;
        }
        if let Some(v) = params.get("recursion").and_then(|v| v.as_f64()) {
            self.recursion = v as usize;
        }
        self.init_state();
        Ok(())
    }

    fn init_state(&mut self) {
        self.table = mirror_table(self.ctx.num_pixels, self.mirror_lower, self.recursion);
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
        if self.table.len() != frame.len() {
            self.table = mirror_table(frame.len(), self.mirror_lower, self.recursion);
        }
        let mut out = lumen_core::PixelFrame::new(frame.len());
        for channel in 0..3 {
            let src = frame.row(channel);
            for (dst, &idx) in out.row_mut(channel).iter_mut().zip(&self.table) {
                *dst = src[idx];
            }
        }
        outputs[0] = Some(ChannelValue::pixels(out));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::test_context;
    use lumen_core::PixelFrame;

    fn ramp(n: usize) -> PixelFrame {
        let r: Vec<f32> = (0..n).map(|i| i as f32).collect();
        PixelFrame::from_rows(&r, &vec![0.0; n], &vec![0.0; n])
    }

    #[test]
    fn recursion_zero_is_identity() {
        assert_eq!(mirror_table(6, true, 0), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn single_fold_is_symmetric() {
        let t = mirror_table(6, true, 1);
        assert_eq!(t, vec![0, 1, 2, 2, 1, 0]);
        let t = mirror_table(5, true, 1);
        assert_eq!(t, vec![0, 1, 1, 1, 0]);
    }

    #[test]
    fn upper_mirror_reflects_the_other_way() {
        let t = mirror_table(6, false, 1);
        assert_eq!(t, vec![5, 4, 3, 3, 4, 5]);
    }

    #[test]
    fn deeper_recursion_tiles_the_pattern() {
        let t = mirror_table(8, true, 2);
        // Quarter [0, 1] mirrored to a half, half mirrored to the whole.
        assert_eq!(t, vec![0, 1, 1, 0, 0, 1, 1, 0]);
    }

    #[test]
    fn output_is_a_column_permutation() {
        let ctx = test_context(10);
        let mut fx = Mirror::from_params(&ParamMap::new(), &ctx).unwrap();
        fx.init_state();
        let mut outputs = vec![None];
        fx.process(&[Some(ChannelValue::pixels(ramp(10)))], &mut outputs)
            .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert_eq!(frame.len(), 10);
        for i in 0..5 {
            assert_eq!(frame.get(0, i), frame.get(0, 9 - i));
        }
        assert_eq!(frame.get(0, 0), 0.0);
    }

    #[test]
    fn table_follows_input_width() {
        let ctx = test_context(10);
        let mut fx = Mirror::from_params(&ParamMap::new(), &ctx).unwrap();
        fx.init_state();
        let mut outputs = vec![None];
        fx.process(&[Some(ChannelValue::pixels(ramp(6)))], &mut outputs)
            .unwrap();
        let frame = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert_eq!(frame.len(), 6);
        assert_eq!(frame.get(0, 5), 0.0);
    }
}
