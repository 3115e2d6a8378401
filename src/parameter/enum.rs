use std::str::FromStr;

use four_cc::FourCC;

use super::{Parameter, ParameterType, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// An enum parameter descriptor.
///
/// Values are the enum's variant names, as provided by [`strum::VariantNames`]. Enums used as
/// parameter values also need to implement `FromStr` with the same names, e.g. by deriving
/// [`strum::EnumString`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnumParameter {
    id: FourCC,
    name: &'static str,
    values: &'static [&'static str],
    default_index: usize,
}

impl EnumParameter {
    /// Create a new enum parameter descriptor from the given variant names.
    pub const fn new(
        id: FourCC,
        name: &'static str,
        values: &'static [&'static str],
        default_index: usize,
    ) -> Self {
        assert!(
            !values.is_empty() && default_index < values.len(),
            "Invalid enum parameter values"
        );
        Self {
            id,
            name,
            values,
            default_index,
        }
    }

    /// The parameter's identifier.
    pub const fn id(&self) -> FourCC {
        self.id
    }

    /// The parameter's possible values.
    pub const fn values(&self) -> &'static [&'static str] {
        self.values
    }

    /// The parameter's default value.
    pub const fn default_value(&self) -> &'static str {
        self.values[self.default_index]
    }

    /// Normalize the given value to a 0.0-1.0 range.
    pub fn normalize_value(&self, value: &str) -> f32 {
        if self.values.len() < 2 {
            return 0.0;
        }
        match self.values.iter().position(|v| *v == value) {
            Some(index) => index as f32 / (self.values.len() - 1) as f32,
            None => 0.0,
        }
    }

    /// Denormalize a 0.0-1.0 ranged value to the corresponding value.
    pub fn denormalize_value(&self, normalized: f32) -> &'static str {
        let normalized = normalized.clamp(0.0, 1.0);
        let index = (normalized * (self.values.len() - 1) as f32).round() as usize;
        self.values[index.min(self.values.len() - 1)]
    }

    /// Resolve a plain enum value from the given update. Raw updates may either pass the enum
    /// value itself or its name as `String` or `&'static str`.
    pub fn value_from_update<T: FromStr + Clone + 'static>(
        &self,
        update: &ParameterValueUpdate,
    ) -> Option<T> {
        let value = match update {
            ParameterValueUpdate::Raw(raw) => {
                if let Some(value) = raw.downcast_ref::<T>() {
                    Some(value.clone())
                } else if let Some(string) = raw.downcast_ref::<String>() {
                    T::from_str(string).ok()
                } else if let Some(string) = raw.downcast_ref::<&'static str>() {
                    T::from_str(string).ok()
                } else {
                    None
                }
            }
            ParameterValueUpdate::Normalized(normalized) => {
                T::from_str(self.denormalize_value(*normalized)).ok()
            }
        };
        if value.is_none() {
            log::warn!("Invalid value for enum parameter '{}'", self.id);
        }
        value
    }
}

impl Parameter for EnumParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Enum {
            values: self.values.iter().map(|v| v.to_string()).collect(),
            default_index: self.default_index,
        }
    }

    fn default_normalized_value(&self) -> f32 {
        self.normalize_value(self.default_value())
    }

    fn normalized_value_to_string(&self, normalized: f32, _include_unit: bool) -> String {
        self.denormalize_value(normalized).to_string()
    }

    fn string_to_normalized_value(&self, string: &str) -> Option<f32> {
        let string = string.trim();
        let value = self
            .values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(string))?;
        Some(self.normalize_value(value))
    }
}

// -------------------------------------------------------------------------------------------------
