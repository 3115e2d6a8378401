#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod buffer;
mod engine;
mod error;
mod parameter;

// public, flat re-exports
pub use error::Error;

pub use buffer::{BufferStorage, SampleBuffer, SampleData, SampleReadGuard};

pub use engine::{
    GrainDirection, GrainEngine, GrainEngineHandle, GrainEngineOptions, GrainEvent, PlaybackMode,
    SignalConnections, SignalInputs, SignalOutputs, TriggerMode,
};

// public mods
pub mod utils;

pub mod parameters {
    //! Engine parameter descriptors, as listed by
    //! [`GrainEngineHandle::parameters`](crate::GrainEngineHandle::parameters).

    pub use super::parameter::{
        BooleanParameter, EnumParameter, FloatParameter, Parameter, ParameterType,
        ParameterValueUpdate,
    };
}

// -------------------------------------------------------------------------------------------------

// Disallow allocations in real-time code in tests.
#[cfg(all(test, debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;
