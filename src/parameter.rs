//! Engine parameter descriptors and value updates.

use std::{any::Any, fmt::Debug, ops::RangeInclusive};

use four_cc::FourCC;

// -------------------------------------------------------------------------------------------------

/// Describes the type of a [`Parameter`] to e.g. select a proper visual representation in a UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    /// A continuous floating-point value.
    Float {
        range: RangeInclusive<f32>,
        default: f32,
    },
    /// A choice from a list of strings (an enum).
    Enum {
        values: Vec<String>,
        default_index: usize,
    },
    /// A boolean toggle.
    Boolean { default: bool },
}

// -------------------------------------------------------------------------------------------------

/// Describes a single parameter of a [`GrainEngine`](crate::GrainEngine) for use in UIs or for
/// automation.
pub trait Parameter: Debug + Send + Sync {
    /// The unique id of the parameter.
    fn id(&self) -> FourCC;

    /// The name of the parameter.
    fn name(&self) -> &'static str;

    /// The parameter type.
    fn parameter_type(&self) -> ParameterType;

    /// Default value of parameter, expressed as normalized floating point value in range \[0,1\].
    fn default_normalized_value(&self) -> f32;

    /// Convert the given normalized floating point value to a string value.
    fn normalized_value_to_string(&self, normalized: f32, include_unit: bool) -> String;

    /// Convert the given string value to a normalized floating point value.
    /// Returns `None` when conversion failed, else a valid normalized value.
    fn string_to_normalized_value(&self, string: &str) -> Option<f32>;
}

// -------------------------------------------------------------------------------------------------

/// An update for a [`Parameter`]'s value, passed to
/// [`GrainEngineHandle::set_parameter`](crate::GrainEngineHandle::set_parameter).
#[derive(Debug)]
pub enum ParameterValueUpdate {
    /// Raw, type-erased plain value (f32 or f64, bool, some Enum or its string name).
    Raw(Box<dyn Any + Send + Sync>),
    /// A float value in range `0.0..=1.0`.
    Normalized(f32),
}

impl ParameterValueUpdate {
    /// Create a new raw value update.
    pub fn raw<T: Any + Send + Sync>(value: T) -> Self {
        Self::Raw(Box::new(value))
    }
}

// -------------------------------------------------------------------------------------------------

mod float;
pub use float::FloatParameter;

mod r#enum;
pub use r#enum::EnumParameter;

mod boolean;
pub use boolean::BooleanParameter;
