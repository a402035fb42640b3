//! Parameter schema system for discoverable effect parameters.
//!
//! Every effect class declares a static [`ParamSchema`] mapping parameter
//! names to a [`ParamSpec`]: a numeric range, an enumeration of string
//! choices, or a boolean. The current values travel as a [`ParamMap`], a
//! plain name→value dictionary that serializes into the persisted graph
//! document and binds directly to a control surface.
//!
//! Parameter updates are validated against the schema before any state is
//! touched: unknown names, out-of-range numbers and unknown choices are
//! rejected with a [`ParamError`] and the effect is left unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single parameter value.
///
/// Serializes untagged, so a parameter map reads as a flat JSON object:
/// `{ "speed": 2.0, "mode": "lighten_only", "flip0": false }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean toggle.
    Bool(bool),
    /// Numeric value (integers included).
    Number(f64),
    /// One choice out of an enumerated set.
    Choice(String),
}

impl ParamValue {
    /// Returns the numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the numeric value as `f32`, if this is a number.
    pub fn as_f32(&self) -> Option<f32> {
        self.as_f64().map(|v| v as f32)
    }

    /// Returns the boolean value, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the choice string, if this is a choice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Choice(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Number(f64::from(v))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Choice(v.to_string())
    }
}

/// Current parameter values of an effect, keyed by parameter name.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Static description of a single parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSpec {
    /// Numeric range with a default and a UI step size.
    Number {
        /// Default value.
        default: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
        /// Step size for stepped controls.
        step: f64,
    },
    /// Enumerated string choices; the first entry need not be the default.
    Choice {
        /// The closed set of valid values.
        choices: &'static [&'static str],
        /// Default choice.
        default: &'static str,
    },
    /// Boolean toggle.
    Bool {
        /// Default value.
        default: bool,
    },
}

impl ParamSpec {
    /// Returns the default value for this spec.
    pub fn default_value(&self) -> ParamValue {
        match self {
            ParamSpec::Number { default, .. } => ParamValue::Number(*default),
            ParamSpec::Choice { default, .. } => ParamValue::Choice((*default).to_string()),
            ParamSpec::Bool { default } => ParamValue::Bool(*default),
        }
    }

    /// Validates a value against this spec.
    fn validate(&self, name: &str, value: &ParamValue) -> Result<(), ParamError> {
        match (self, value) {
            (ParamSpec::Number { min, max, .. }, ParamValue::Number(v)) => {
                if *v < *min || *v > *max {
                    Err(ParamError::OutOfRange {
                        name: name.to_string(),
                        value: *v,
                        min: *min,
                        max: *max,
                    })
                } else {
                    Ok(())
                }
            }
            (ParamSpec::Choice { choices, .. }, ParamValue::Choice(v)) => {
                if choices.contains(&v.as_str()) {
                    Ok(())
                } else {
                    Err(ParamError::UnknownChoice {
                        name: name.to_string(),
                        value: v.clone(),
                    })
                }
            }
            (ParamSpec::Bool { .. }, ParamValue::Bool(_)) => Ok(()),
            (spec, _) => Err(ParamError::WrongType {
                name: name.to_string(),
                expected: spec.type_name(),
            }),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ParamSpec::Number { .. } => "number",
            ParamSpec::Choice { .. } => "choice",
            ParamSpec::Bool { .. } => "bool",
        }
    }
}

/// Ordered parameter schema for one effect class.
#[derive(Debug, Clone, Default)]
pub struct ParamSchema {
    entries: Vec<(&'static str, ParamSpec)>,
}

impl ParamSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a parameter to the schema (builder style).
    pub fn with(mut self, name: &'static str, spec: ParamSpec) -> Self {
        self.entries.push((name, spec));
        self
    }

    /// Shorthand for a numeric parameter.
    pub fn number(self, name: &'static str, default: f64, min: f64, max: f64, step: f64) -> Self {
        self.with(
            name,
            ParamSpec::Number {
                default,
                min,
                max,
                step,
            },
        )
    }

    /// Shorthand for a choice parameter.
    pub fn choice(
        self,
        name: &'static str,
        choices: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        self.with(name, ParamSpec::Choice { choices, default })
    }

    /// Shorthand for a boolean parameter.
    pub fn boolean(self, name: &'static str, default: bool) -> Self {
        self.with(name, ParamSpec::Bool { default })
    }

    /// Looks up a spec by name.
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, s)| s)
    }

    /// Iterates over `(name, spec)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ParamSpec)> {
        self.entries.iter().map(|(n, s)| (*n, s))
    }

    /// Number of parameters in the schema.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the schema has no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a map of every parameter set to its default.
    pub fn defaults(&self) -> ParamMap {
        self.entries
            .iter()
            .map(|(n, s)| ((*n).to_string(), s.default_value()))
            .collect()
    }

    /// Validates a partial parameter map against this schema.
    ///
    /// Unknown names are rejected; present values must match the declared
    /// type, range and choice set. Missing parameters are fine; updates
    /// may be partial.
    pub fn validate(&self, params: &ParamMap) -> Result<(), ParamError> {
        for (name, value) in params {
            let spec = self
                .get(name)
                .ok_or_else(|| ParamError::UnknownParameter(name.clone()))?;
            spec.validate(name, value)?;
        }
        Ok(())
    }
}

/// Errors raised while validating or applying parameter updates.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParamError {
    /// The parameter name is not in the effect's schema.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// A numeric value fell outside the declared range.
    #[error("parameter '{name}' value {value} outside [{min}, {max}]")]
    OutOfRange {
        /// Parameter name.
        name: String,
        /// Rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A choice value is not in the enumerated set.
    #[error("parameter '{name}' has no choice '{value}'")]
    UnknownChoice {
        /// Parameter name.
        name: String,
        /// Rejected value.
        value: String,
    },

    /// The value's type does not match the schema.
    #[error("parameter '{name}' expects a {expected}")]
    WrongType {
        /// Parameter name.
        name: String,
        /// Expected type name.
        expected: &'static str,
    },

    /// The parameter is fixed at construction (it determines channel
    /// arity) and cannot be changed on a live node.
    #[error("parameter '{0}' cannot be changed after construction")]
    Immutable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ParamSchema {
        ParamSchema::new()
            .number("speed", 2.0, 0.0, 100.0, 0.1)
            .choice("mode", &["lighten_only", "multiply"], "lighten_only")
            .boolean("flip", false)
    }

    #[test]
    fn defaults_cover_every_entry() {
        let defaults = schema().defaults();
        assert_eq!(defaults.len(), 3);
        assert_eq!(defaults["speed"], ParamValue::Number(2.0));
        assert_eq!(defaults["mode"], ParamValue::Choice("lighten_only".into()));
        assert_eq!(defaults["flip"], ParamValue::Bool(false));
    }

    #[test]
    fn validate_accepts_partial_updates() {
        let mut map = ParamMap::new();
        map.insert("speed".into(), ParamValue::Number(50.0));
        assert!(schema().validate(&map).is_ok());
    }

    #[test]
    fn validate_rejects_unknown_name() {
        let mut map = ParamMap::new();
        map.insert("velocity".into(), ParamValue::Number(1.0));
        assert_eq!(
            schema().validate(&map),
            Err(ParamError::UnknownParameter("velocity".into()))
        );
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut map = ParamMap::new();
        map.insert("speed".into(), ParamValue::Number(1000.0));
        assert!(matches!(
            schema().validate(&map),
            Err(ParamError::OutOfRange { .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_choice() {
        let mut map = ParamMap::new();
        map.insert("mode".into(), ParamValue::Choice("subtract".into()));
        assert!(matches!(
            schema().validate(&map),
            Err(ParamError::UnknownChoice { .. })
        ));
    }

    #[test]
    fn validate_rejects_type_mismatch() {
        let mut map = ParamMap::new();
        map.insert("flip".into(), ParamValue::Number(1.0));
        assert!(matches!(
            schema().validate(&map),
            Err(ParamError::WrongType { .. })
        ));
    }

    #[test]
    fn param_value_json_is_flat() {
        let mut map = ParamMap::new();
        map.insert("speed".into(), ParamValue::Number(2.5));
        map.insert("flip".into(), ParamValue::Bool(true));
        map.insert("mode".into(), ParamValue::Choice("multiply".into()));
        let json = serde_json::to_string(&map).unwrap();
        let back: ParamMap = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }
}
