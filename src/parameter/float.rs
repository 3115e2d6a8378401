use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{Parameter, ParameterType, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// A continuous (float) parameter descriptor.
///
/// The range only applies to normalized values and string conversions: raw plain values are
/// passed through as they are, so the engine can apply its own, variant dependent bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<f32>,
    default: f32,
    unit: &'static str,
}

impl FloatParameter {
    /// Create a new float parameter descriptor.
    pub const fn new(
        id: FourCC,
        name: &'static str,
        range: RangeInclusive<f32>,
        default: f32,
    ) -> Self {
        assert!(
            default >= *range.start() && default <= *range.end(),
            "Invalid parameter default value"
        );
        Self {
            id,
            name,
            range,
            default,
            unit: "",
        }
    }

    /// Optional unit for string displays.
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// The parameter's identifier.
    pub const fn id(&self) -> FourCC {
        self.id
    }

    /// The parameter's value range.
    pub const fn range(&self) -> &RangeInclusive<f32> {
        &self.range
    }

    /// The parameter's plain default value.
    pub const fn default_value(&self) -> f32 {
        self.default
    }

    /// Clamp the given plain value to the parameter's range.
    pub fn clamp_value(&self, value: f32) -> f32 {
        value.clamp(*self.range.start(), *self.range.end())
    }

    /// Normalize the given plain value to a 0.0-1.0 range.
    pub fn normalize_value(&self, value: f32) -> f32 {
        (self.clamp_value(value) - *self.range.start())
            / (*self.range.end() - *self.range.start())
    }

    /// Denormalize a 0.0-1.0 ranged value to the corresponding plain value.
    pub fn denormalize_value(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);
        *self.range.start() + normalized * (*self.range.end() - *self.range.start())
    }

    /// Convert the given plain value to a string.
    pub fn value_to_string(&self, value: f32, include_unit: bool) -> String {
        if include_unit && !self.unit.is_empty() {
            format!("{:.2} {}", value, self.unit)
        } else {
            format!("{:.2}", value)
        }
    }

    /// Convert the given string to a plain, clamped value.
    pub fn string_to_value(&self, string: &str) -> Option<f32> {
        let value = string
            .trim()
            .trim_end_matches(self.unit)
            .trim()
            .parse::<f32>()
            .ok()?;
        Some(self.clamp_value(value))
    }

    /// Resolve a plain value from the given update. Returns `None` for raw values of an
    /// unexpected type.
    pub fn value_from_update(&self, update: &ParameterValueUpdate) -> Option<f32> {
        match update {
            ParameterValueUpdate::Raw(raw) => {
                if let Some(value) = raw.downcast_ref::<f32>() {
                    Some(*value)
                } else if let Some(value) = raw.downcast_ref::<f64>() {
                    Some(*value as f32)
                } else {
                    log::warn!("Invalid value type for float parameter '{}'", self.id);
                    None
                }
            }
            ParameterValueUpdate::Normalized(normalized) => {
                Some(self.denormalize_value(*normalized))
            }
        }
    }
}

impl Parameter for FloatParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Float {
            range: self.range.clone(),
            default: self.default,
        }
    }

    fn default_normalized_value(&self) -> f32 {
        self.normalize_value(self.default)
    }

    fn normalized_value_to_string(&self, normalized: f32, include_unit: bool) -> String {
        self.value_to_string(self.denormalize_value(normalized), include_unit)
    }

    fn string_to_normalized_value(&self, string: &str) -> Option<f32> {
        let value = self.string_to_value(string)?;
        Some(self.normalize_value(value))
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LENGTH: FloatParameter =
        FloatParameter::new(FourCC(*b"TLEN"), "Length", 1.0..=1001.0, 51.0).with_unit("ms");

    #[test]
    fn normalization() {
        assert_eq!(LENGTH.default_normalized_value(), 0.05);
        assert_eq!(LENGTH.denormalize_value(0.5), 501.0);
        assert_eq!(LENGTH.denormalize_value(2.0), 1001.0);
        assert_eq!(LENGTH.normalize_value(-10.0), 0.0);
    }

    #[test]
    fn strings() {
        assert_eq!(LENGTH.value_to_string(25.0, true), "25.00 ms");
        assert_eq!(LENGTH.value_to_string(25.0, false), "25.00");
        assert_eq!(LENGTH.string_to_value(" 25 ms "), Some(25.0));
        assert_eq!(LENGTH.string_to_value("5000"), Some(1001.0));
        assert_eq!(LENGTH.string_to_value("fast"), None);
        assert_eq!(LENGTH.string_to_normalized_value("1"), Some(0.0));
    }

    #[test]
    fn updates() {
        assert_eq!(
            LENGTH.value_from_update(&ParameterValueUpdate::raw(2000.0f32)),
            Some(2000.0)
        );
        assert_eq!(
            LENGTH.value_from_update(&ParameterValueUpdate::raw(-1.0f64)),
            Some(-1.0)
        );
        assert_eq!(
            LENGTH.value_from_update(&ParameterValueUpdate::Normalized(1.0)),
            Some(1001.0)
        );
        assert_eq!(LENGTH.value_from_update(&ParameterValueUpdate::raw(true)), None);
    }
}
