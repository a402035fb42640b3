//! Color sources and gradient generators.

use lumen_core::{ChannelKind, ChannelValue, Effect, ParamError, ParamMap, ParamSchema, TickError};

use crate::context::EffectContext;

/// HLS to RGB, all components in [0, 1].
fn hls_to_rgb(h: f32, l: f32, s: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (l, l, l);
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    let v = |hue: f32| {
        let hue = hue.rem_euclid(1.0);
        if hue < 1.0 / 6.0 {
            m1 + (m2 - m1) * hue * 6.0
        } else if hue < 0.5 {
            m2
        } else if hue < 2.0 / 3.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
        } else {
            m1
        }
    };
    (v(h + 1.0 / 3.0), v(h), v(h - 1.0 / 3.0))
}

/// RGB to HSV, all components in [0, 1].
fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    if (maxc - minc).abs() < f32::EPSILON {
        return (0.0, 0.0, maxc);
    }
    let s = (maxc - minc) / maxc;
    let rc = (maxc - r) / (maxc - minc);
    let gc = (maxc - g) / (maxc - minc);
    let bc = (maxc - b) / (maxc - minc);
    let h = if (r - maxc).abs() < f32::EPSILON {
        bc - gc
    } else if (g - maxc).abs() < f32::EPSILON {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    ((h / 6.0).rem_euclid(1.0), s, maxc)
}

/// HSV to RGB, all components in [0, 1].
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (v, v, v);
    }
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (i as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Constant color over the whole strip.
pub struct StaticColor {
    ctx: EffectContext,
    r: f64,
    g: f64,
    b: f64,
}

impl StaticColor {
    /// Registry class tag.
    pub const CLASS: &'static str = "static_color";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            r: 255.0,
            g: 255.0,
            b: 255.0,
        };
        effect.set_params(params)?;
        Ok(effect)
    }
}

impl Effect for StaticColor {
    fn class_name(&self) -> &'static str {
        Self::CLASS
    }

    fn input_kinds(&self) -> Vec<ChannelKind> {
        vec![]
    }

    fn output_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .number("r", 255.0, 0.0, 255.0, 1.0)
            .number("g", 255.0, 0.0, 255.0, 1.0)
            .number("b", 255.0, 0.0, 255.0, 1.0)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("r".into(), self.r.into());
        map.insert("g".into(), self.g.into());
        map.insert("b".into(), self.b.into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        if let Some(v) = params.get("r").and_then(|v| v.as_f64()) {
            self.r = v;
        }
        if let Some(v) = params.get("g").and_then(|v| v.as_f64()) {
            self.g = v;
        }
        if let Some(v) = params.get("b").and_then(|v| v.as_f64()) {
            self.b = v;
        }
        Ok(())
    }

    fn init_state(&mut self) {}

    fn process(
        &mut self,
        _inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        outputs[0] = Some(ChannelValue::pixels(lumen_core::PixelFrame::solid(
            self.ctx.num_pixels,
            self.r as f32,
            self.g as f32,
            self.b as f32,
        )));
        Ok(())
    }
}

/// Slowly rotating hue at full saturation.
///
/// The hue is `((t + offset) mod cycle_time) / cycle_time` through the HLS
/// wheel at half lightness, broadcast to every pixel.
pub struct ColorWheel {
    ctx: EffectContext,
    cycle_time: f64,
    offset: f64,
    t: f64,
}

impl ColorWheel {
    /// Registry class tag.
    pub const CLASS: &'static str = "color_wheel";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let mut effect = Self {
            ctx: ctx.clone(),
            cycle_time: 30.0,
            offset: 0.0,
            t: 0.0,
        };
        effect.set_params(params)?;
        Ok(effect)
    }

    fn current_rgb(&self) -> (f32, f32, f32) {
        let h = ((self.t + self.offset).rem_euclid(self.cycle_time) / self.cycle_time) as f32;
        let (r, g, b) = hls_to_rgb(h, 0.5, 1.0);
        (r * 255.0, g * 255.0, b * 255.0)
    }
}

impl Effect for ColorWheel {
    fn class_name(&self) -> &'static str {
        Self::CLASS
    }

    fn input_kinds(&self) -> Vec<ChannelKind> {
        vec![]
    }

    fn output_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .number("cycle_time", 30.0, 1.0, 600.0, 1.0)
            .number("offset", 0.0, 0.0, 600.0, 1.0)
    }

    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("cycle_time".into(), self.cycle_time.into());
        map.insert("offset".into(), self.offset.into());
        map
    }

    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        if let Some(v) = params.get("cycle_time").and_then(|v| v.as_f64()) {
            self.cycle_time = v;
        }
        if let Some(v) = params.get("offset").and_then(|v| v.as_f64()) {
            self.offset = v;
        }
        Ok(())
    }

    fn init_state(&mut self) {
        self.t = 0.0;
    }

    fn update(&mut self, dt: f64) -> Result<(), TickError> {
        self.t += dt;
        Ok(())
    }

    fn process(
        &mut self,
        _inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        let (r, g, b) = self.current_rgb();
        outputs[0] = Some(ChannelValue::pixels(lumen_core::PixelFrame::solid(
            self.ctx.num_pixels,
            r,
            g,
            b,
        )));
        Ok(())
    }
}

/// Per-channel linear gradient between two pixel inputs.
///
/// Pixel `i` mixes the two inputs at ratio `i / (N - 1)`, so the strip
/// fades from input 0 on the left to input 1 on the right.
pub struct InterpolateRgb;

impl InterpolateRgb {
    /// Registry class tag.
    pub const CLASS: &'static str = "interpolate_rgb";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        Self.schema().validate(params)?;
        Ok(Self)
    }
}

impl Effect for InterpolateRgb {
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
        let a = inputs[0].as_ref().and_then(ChannelValue::as_pixels);
        let b = inputs[1].as_ref().and_then(ChannelValue::as_pixels);
        outputs[0] = match (a, b) {
            (Some(a), Some(b)) => {
                let n = a.len().min(b.len());
                let mut out = lumen_core::PixelFrame::new(n);
                for channel in 0..3 {
                    let ra = a.row(channel);
                    let rb = b.row(channel);
                    for (i, v) in out.row_mut(channel).iter_mut().enumerate() {
                        let x = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };
                        *v = ra[i] * (1.0 - x) + rb[i] * x;
                    }
                }
                Some(ChannelValue::pixels(out))
            }
            (Some(one), None) | (None, Some(one)) => Some(ChannelValue::pixels(one.clone())),
            (None, None) => None,
        };
        Ok(())
    }
}

/// Hue-space gradient between the first pixels of two inputs.
///
/// Both endpoint colors go through HSV; hue, saturation and value are
/// interpolated independently across the strip, so a red-to-blue fade
/// passes through purple instead of gray.
pub struct InterpolateHsv {
    ctx: EffectContext,
}

impl InterpolateHsv {
    /// Registry class tag.
    pub const CLASS: &'static str = "interpolate_hsv";

    /// Creates the effect from serialized parameters.
    pub fn from_params(params: &ParamMap, ctx: &EffectContext) -> Result<Self, ParamError> {
        let effect = Self { ctx: ctx.clone() };
        effect.schema().validate(params)?;
        Ok(effect)
    }
}

impl Effect for InterpolateHsv {
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
        let a = inputs[0].as_ref().and_then(ChannelValue::as_pixels);
        let b = inputs[1].as_ref().and_then(ChannelValue::as_pixels);
        outputs[0] = match (a, b) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
                let from = rgb_to_hsv(
                    a.get(0, 0) / 255.0,
                    a.get(1, 0) / 255.0,
                    a.get(2, 0) / 255.0,
                );
                let to = rgb_to_hsv(
                    b.get(0, 0) / 255.0,
                    b.get(1, 0) / 255.0,
                    b.get(2, 0) / 255.0,
                );
                let n = self.ctx.num_pixels;
                let mut out = lumen_core::PixelFrame::new(n);
                for i in 0..n {
                    let x = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };
                    let h = from.0 * (1.0 - x) + to.0 * x;
                    let s = from.1 * (1.0 - x) + to.1 * x;
                    let v = from.2 * (1.0 - x) + to.2 * x;
                    let (r, g, b) = hsv_to_rgb(h, s, v);
                    out.set(0, i, r * 255.0);
                    out.set(1, i, g * 255.0);
                    out.set(2, i, b * 255.0);
                }
                Some(ChannelValue::pixels(out))
            }
            (Some(one), None) | (None, Some(one)) => Some(ChannelValue::pixels(one.clone())),
            _ => None,
        };
        Ok(())
    }
}
