//! Buffer, interpolation and file helpers, shared by the engines and demos.

pub mod buffer;
pub mod interpolation;

#[cfg(feature = "wav-output")]
pub mod wav;
