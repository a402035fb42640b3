//! Pixel blend modes shared by [`Combine`](crate::Combine) and
//! [`Spectrum`](crate::Spectrum).

use lumen_core::PixelFrame;

/// Element-wise reduction of two equal-width pixel buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Per-channel maximum.
    LightenOnly,
    /// Per-channel minimum.
    DarkenOnly,
    /// Saturating sum.
    Add,
    /// `255 - (255-a)(255-b)/255`.
    Screen,
    /// `a*b/255`.
    Multiply,
}

impl BlendMode {
    /// Choice names, in schema order. The first entry is the default.
    pub const CHOICES: &'static [&'static str] =
        &["lighten_only", "darken_only", "add", "screen", "multiply"];

    /// Default blend mode.
    pub const DEFAULT: BlendMode = BlendMode::LightenOnly;

    /// Parses a schema choice name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lighten_only" => Some(BlendMode::LightenOnly),
            "darken_only" => Some(BlendMode::DarkenOnly),
            "add" => Some(BlendMode::Add),
            "screen" => Some(BlendMode::Screen),
            "multiply" => Some(BlendMode::Multiply),
            _ => None,
        }
    }

    /// The schema choice name.
    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::LightenOnly => "lighten_only",
            BlendMode::DarkenOnly => "darken_only",
            BlendMode::Add => "add",
            BlendMode::Screen => "screen",
            BlendMode::Multiply => "multiply",
        }
    }

    /// Blends two equal-length frames.
    pub fn blend(&self, a: &PixelFrame, b: &PixelFrame) -> PixelFrame {
        debug_assert_eq!(a.len(), b.len());
        let mut out = PixelFrame::new(a.len());
        for channel in 0..3 {
            let ra = a.row(channel);
            let rb = b.row(channel);
            let ro = out.row_mut(channel);
            for ((o, &x), &y) in ro.iter_mut().zip(ra).zip(rb) {
                *o = match self {
                    BlendMode::LightenOnly => x.max(y),
                    BlendMode::DarkenOnly => x.min(y),
                    BlendMode::Add => (x + y).min(255.0),
                    BlendMode::Screen => 255.0 - (255.0 - x) * (255.0 - y) / 255.0,
                    BlendMode::Multiply => x * y / 255.0,
                };
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (PixelFrame, PixelFrame) {
        (
            PixelFrame::from_rows(&[100.0, 255.0], &[0.0, 0.0], &[0.0, 0.0]),
            PixelFrame::from_rows(&[200.0, 255.0], &[0.0, 0.0], &[0.0, 0.0]),
        )
    }

    #[test]
    fn lighten_takes_max() {
        let (a, b) = pair();
        assert_eq!(BlendMode::LightenOnly.blend(&a, &b).row(0), &[200.0, 255.0]);
    }

    #[test]
    fn add_saturates() {
        let (a, b) = pair();
        assert_eq!(BlendMode::Add.blend(&a, &b).row(0), &[255.0, 255.0]);
    }

    #[test]
    fn multiply_and_screen_stay_in_range() {
        let (a, b) = pair();
        let m = BlendMode::Multiply.blend(&a, &b);
        let s = BlendMode::Screen.blend(&a, &b);
        assert!((m.get(0, 0) - 100.0 * 200.0 / 255.0).abs() < 1e-3);
        assert_eq!(s.get(0, 1), 255.0);
        for frame in [m, s] {
            assert!(frame.as_slice().iter().all(|&v| (0.0..=255.0).contains(&v)));
        }
    }

    proptest::proptest! {
        #[test]
        fn every_mode_stays_in_byte_range(
            a in proptest::collection::vec(0.0_f32..=255.0, 16),
            b in proptest::collection::vec(0.0_f32..=255.0, 16),
        ) {
            let fa = PixelFrame::from_rows(&a, &a, &a);
            let fb = PixelFrame::from_rows(&b, &b, &b);
            for name in BlendMode::CHOICES {
                let mode = BlendMode::from_name(name).unwrap();
                let out = mode.blend(&fa, &fb);
                for &v in out.as_slice() {
                    proptest::prop_assert!((0.0..=255.0).contains(&v));
                }
            }
        }
    }

    #[test]
    fn names_round_trip() {
        for name in BlendMode::CHOICES {
            assert_eq!(BlendMode::from_name(name).unwrap().name(), *name);
        }
        assert!(BlendMode::from_name("subtract").is_none());
    }
}
