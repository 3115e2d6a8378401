use four_cc::FourCC;

use super::{Parameter, ParameterType, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// A boolean parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanParameter {
    id: FourCC,
    name: &'static str,
    default: bool,
}

impl BooleanParameter {
    /// Create a new boolean parameter descriptor.
    pub const fn new(id: FourCC, name: &'static str, default: bool) -> Self {
        Self { id, name, default }
    }

    /// The parameter's identifier.
    pub const fn id(&self) -> FourCC {
        self.id
    }

    /// The parameter's plain default value.
    pub const fn default_value(&self) -> bool {
        self.default
    }

    /// Normalize the given plain value to a 0.0-1.0 range.
    pub const fn normalize_value(&self, value: bool) -> f32 {
        if value {
            1.0
        } else {
            0.0
        }
    }

    /// Denormalize a 0.0-1.0 ranged value to the corresponding plain value.
    pub fn denormalize_value(&self, normalized: f32) -> bool {
        normalized.clamp(0.0, 1.0) >= 0.5
    }

    /// Convert the given plain value to a string.
    pub fn value_to_string(&self, value: bool) -> String {
        if value {
            "ON".to_string()
        } else {
            "OFF".to_string()
        }
    }

    /// Convert the given string to a plain value.
    pub fn string_to_value(&self, string: &str) -> Option<bool> {
        let string = string.trim();
        if string.eq_ignore_ascii_case("ON") {
            Some(true)
        } else if string.eq_ignore_ascii_case("OFF") {
            Some(false)
        } else {
            string.parse::<bool>().ok()
        }
    }

    /// Resolve a plain value from the given update. Returns `None` for raw values of an
    /// unexpected type.
    pub fn value_from_update(&self, update: &ParameterValueUpdate) -> Option<bool> {
        match update {
            ParameterValueUpdate::Raw(raw) => {
                let value = raw.downcast_ref::<bool>().copied();
                if value.is_none() {
                    log::warn!("Invalid value type for boolean parameter '{}'", self.id);
                }
                value
            }
            ParameterValueUpdate::Normalized(normalized) => {
                Some(self.denormalize_value(*normalized))
            }
        }
    }
}

impl Parameter for BooleanParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Boolean {
            default: self.default,
        }
    }

    fn default_normalized_value(&self) -> f32 {
        self.normalize_value(self.default)
    }

    fn normalized_value_to_string(&self, normalized: f32, _include_unit: bool) -> String {
        self.value_to_string(self.denormalize_value(normalized))
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

    #[test]
    fn conversions() {
        let param = BooleanParameter::new(FourCC(*b"TBOL"), "Toggle", true);
        assert_eq!(param.default_normalized_value(), 1.0);
        assert_eq!(param.string_to_value("off"), Some(false));
        assert_eq!(param.string_to_value(" true "), Some(true));
        assert_eq!(param.string_to_value("maybe"), None);
        assert_eq!(param.normalized_value_to_string(0.2, true), "OFF");
        assert_eq!(
            param.value_from_update(&ParameterValueUpdate::Normalized(0.7)),
            Some(true)
        );
        assert_eq!(
            param.value_from_update(&ParameterValueUpdate::raw(false)),
            Some(false)
        );
        assert_eq!(param.value_from_update(&ParameterValueUpdate::raw(1.0f32)), None);
    }
}
