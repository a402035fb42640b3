//! Effect class registry and factory for the lumen graph.
//!
//! The registry is the closed allow-list of node classes a graph document
//! may name. Construction always goes through it: a class tag plus a
//! parameter map (validated against the class schema) plus the shared
//! [`EffectContext`] yields a boxed [`Effect`]. Unknown tags are rejected,
//! which is what keeps persisted documents from instantiating arbitrary
//! code paths.
//!
//! Descriptors carry enough metadata (category, description, parameter
//! schema) for a CLI or a control surface to list and document the
//! available classes without instantiating them.

use lumen_core::{Effect, EffectFactory, GraphError, ParamError, ParamMap, ParamSchema};
use lumen_effects::{
    AfterGlow, Append, AudioInput, BeatFlash, ColorWheel, Combine, EffectContext, InterpolateHsv,
    InterpolateRgb, LedOutput, Mirror, MovingLight, Shift, Spectrum, StaticColor, VuMeterPeak,
    VuMeterRms,
};

/// Category of effect class, for listing and documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Audio sources (device capture).
    Source,
    /// Audio-to-pixels visualizers.
    Analysis,
    /// Pixel-to-pixel post-processing.
    Pixel,
    /// Color generators and gradients.
    Color,
    /// Terminal sinks driving hardware.
    Output,
}

impl EffectCategory {
    /// Human-readable category name.
    pub const fn name(&self) -> &'static str {
        match self {
            EffectCategory::Source => "Source",
            EffectCategory::Analysis => "Analysis",
            EffectCategory::Pixel => "Pixel",
            EffectCategory::Color => "Color",
            EffectCategory::Output => "Output",
        }
    }
}

/// Describes one registered effect class.
#[derive(Debug, Clone)]
pub struct EffectDescriptor {
    /// Stable class tag used in graph documents.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Category for organization.
    pub category: EffectCategory,
}

type FactoryFn = fn(&ParamMap, &EffectContext) -> Result<Box<dyn Effect>, ParamError>;

struct RegistryEntry {
    descriptor: EffectDescriptor,
    factory: FactoryFn,
}

/// The closed set of effect classes, bound to one [`EffectContext`].
pub struct Registry {
    ctx: EffectContext,
    entries: Vec<RegistryEntry>,
}

impl Registry {
    /// Creates a registry over `ctx` with every built-in class registered.
    pub fn new(ctx: EffectContext) -> Self {
        let mut registry = Self {
            ctx,
            entries: Vec::with_capacity(16),
        };
        registry.register_builtin_classes();
        registry
    }

    fn register_builtin_classes(&mut self) {
        self.register(
            EffectDescriptor {
                id: AudioInput::CLASS,
                name: "Audio Input",
                description: "Device capture with optional auto-gain",
                category: EffectCategory::Source,
            },
            |p, ctx| Ok(Box::new(AudioInput::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: Spectrum::CLASS,
                name: "Spectrum",
                description: "Bass and melody band energies across the strip",
                category: EffectCategory::Analysis,
            },
            |p, ctx| Ok(Box::new(Spectrum::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: VuMeterRms::CLASS,
                name: "VU Meter (RMS)",
                description: "Bar graph of chunk RMS level",
                category: EffectCategory::Analysis,
            },
            |p, ctx| Ok(Box::new(VuMeterRms::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: VuMeterPeak::CLASS,
                name: "VU Meter (Peak)",
                description: "Bar graph of chunk peak on a dB scale",
                category: EffectCategory::Analysis,
            },
            |p, ctx| Ok(Box::new(VuMeterPeak::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: MovingLight::CLASS,
                name: "Moving Light",
                description: "Bass pulse traveling along the strip",
                category: EffectCategory::Analysis,
            },
            |p, ctx| Ok(Box::new(MovingLight::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: BeatFlash::CLASS,
                name: "Beat Flash",
                description: "Full-strip flash on detected onsets",
                category: EffectCategory::Analysis,
            },
            |p, ctx| Ok(Box::new(BeatFlash::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: AfterGlow::CLASS,
                name: "After Glow",
                description: "Phosphor-style decay over a pixel stream",
                category: EffectCategory::Pixel,
            },
            |p, ctx| Ok(Box::new(AfterGlow::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: Shift::CLASS,
                name: "Shift",
                description: "Scrolling trail with additive input",
                category: EffectCategory::Pixel,
            },
            |p, ctx| Ok(Box::new(Shift::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: Mirror::CLASS,
                name: "Mirror",
                description: "Half-strip reflection with recursion",
                category: EffectCategory::Pixel,
            },
            |p, ctx| Ok(Box::new(Mirror::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: Append::CLASS,
                name: "Append",
                description: "Concatenate up to eight strips, each flippable",
                category: EffectCategory::Pixel,
            },
            |p, _| Ok(Box::new(Append::from_params(p)?)),
        );
        self.register(
            EffectDescriptor {
                id: Combine::CLASS,
                name: "Combine",
                description: "Blend two pixel streams",
                category: EffectCategory::Pixel,
            },
            |p, _| Ok(Box::new(Combine::from_params(p)?)),
        );
        self.register(
            EffectDescriptor {
                id: StaticColor::CLASS,
                name: "Static Color",
                description: "Constant color across the strip",
                category: EffectCategory::Color,
            },
            |p, ctx| Ok(Box::new(StaticColor::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: ColorWheel::CLASS,
                name: "Color Wheel",
                description: "Slowly rotating hue at full saturation",
                category: EffectCategory::Color,
            },
            |p, ctx| Ok(Box::new(ColorWheel::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: InterpolateRgb::CLASS,
                name: "Interpolate (RGB)",
                description: "Per-channel gradient between two inputs",
                category: EffectCategory::Color,
            },
            |p, _| Ok(Box::new(InterpolateRgb::from_params(p)?)),
        );
        self.register(
            EffectDescriptor {
                id: InterpolateHsv::CLASS,
                name: "Interpolate (HSV)",
                description: "Hue-space gradient between two input colors",
                category: EffectCategory::Color,
            },
            |p, ctx| Ok(Box::new(InterpolateHsv::from_params(p, ctx)?)),
        );
        self.register(
            EffectDescriptor {
                id: LedOutput::CLASS,
                name: "LED Output",
                description: "Clamp, optionally gamma-correct, and show frames",
                category: EffectCategory::Output,
            },
            |p, ctx| Ok(Box::new(LedOutput::from_params(p, ctx)?)),
        );
    }

    fn register(&mut self, descriptor: EffectDescriptor, factory: FactoryFn) {
        self.entries.push(RegistryEntry {
            descriptor,
            factory,
        });
    }

    /// Descriptors of every registered class, in registration order.
    pub fn all_classes(&self) -> Vec<&EffectDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Descriptors of classes in one category.
    pub fn classes_in_category(&self, category: EffectCategory) -> Vec<&EffectDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Looks up a descriptor by class tag.
    pub fn get(&self, id: &str) -> Option<&EffectDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.descriptor)
    }

    /// Parameter schema of a class, instantiated with defaults.
    ///
    /// Returns `None` for unknown tags.
    pub fn schema(&self, id: &str) -> Option<ParamSchema> {
        let entry = self.entries.iter().find(|e| e.descriptor.id == id)?;
        (entry.factory)(&ParamMap::new(), &self.ctx)
            .ok()
            .map(|effect| effect.schema())
    }

    /// The context this registry constructs effects against.
    pub fn context(&self) -> &EffectContext {
        &self.ctx
    }
}

impl EffectFactory for Registry {
    fn create(&self, class: &str, params: &ParamMap) -> Result<Box<dyn Effect>, GraphError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.descriptor.id == class)
            .ok_or_else(|| GraphError::UnknownEffectClass(class.to_string()))?;
        Ok((entry.factory)(params, &self.ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_io::{LedTransport, MockBackend, NullTransport};
    use std::sync::{Arc, Mutex};

    fn registry() -> Registry {
        Registry::new(EffectContext {
            sample_rate: 44100.0,
            num_pixels: 30,
            chunk_rate: 60.0,
            capture: Arc::new(MockBackend::silent()),
            transport: Arc::new(Mutex::new(
                Box::new(NullTransport) as Box<dyn LedTransport>
            )),
        })
    }

    #[test]
    fn every_class_constructs_with_defaults() {
        let reg = registry();
        for desc in reg.all_classes() {
            let effect = reg.create(desc.id, &ParamMap::new()).unwrap();
            assert_eq!(effect.class_name(), desc.id);
        }
    }

    #[test]
    fn unknown_class_is_rejected() {
        let reg = registry();
        assert!(matches!(
            reg.create("strobe", &ParamMap::new()),
            Err(GraphError::UnknownEffectClass(_))
        ));
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let reg = registry();
        let mut params = ParamMap::new();
        params.insert("glow_time".into(), 99.0_f64.into());
        assert!(matches!(
            reg.create("afterglow", &params),
            Err(GraphError::Param(_))
        ));
    }

    #[test]
    fn narrowband_capture_rejects_spectrum_without_panicking() {
        let reg = Registry::new(EffectContext {
            sample_rate: 8000.0,
            num_pixels: 30,
            chunk_rate: 60.0,
            capture: Arc::new(MockBackend::silent()),
            transport: Arc::new(Mutex::new(
                Box::new(NullTransport) as Box<dyn LedTransport>
            )),
        });
        // Default fmax sits above the 4 kHz Nyquist limit.
        assert!(matches!(
            reg.create("spectrum", &ParamMap::new()),
            Err(GraphError::Param(_))
        ));
    }

    #[test]
    fn descriptors_cover_all_categories() {
        let reg = registry();
        for cat in [
            EffectCategory::Source,
            EffectCategory::Analysis,
            EffectCategory::Pixel,
            EffectCategory::Color,
            EffectCategory::Output,
        ] {
            assert!(!reg.classes_in_category(cat).is_empty(), "{}", cat.name());
        }
    }

    #[test]
    fn schema_is_available_without_construction_params() {
        let reg = registry();
        let schema = reg.schema("moving_light").unwrap();
        assert!(schema.get("speed").is_some());
        assert!(reg.schema("strobe").is_none());
    }

    #[test]
    fn params_round_trip_through_the_factory() {
        let reg = registry();
        let mut params = ParamMap::new();
        params.insert("speed".into(), 42.0_f64.into());
        let effect = reg.create("moving_light", &params).unwrap();
        assert_eq!(effect.params()["speed"].as_f64(), Some(42.0));
    }
}
