use basedrop::Shared;

use super::GrainDirection;
use crate::buffer::SampleBuffer;

// -------------------------------------------------------------------------------------------------

/// Buffer slots of a grain engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum BufferSlot {
    Sound,
    Window,
}

// -------------------------------------------------------------------------------------------------

/// Control messages, sent from a [`GrainEngineHandle`](crate::GrainEngineHandle) to its engine
/// and applied at the start of the engine's next audio block.
pub(crate) enum GrainEngineMessage {
    /// Bind a resolved and validated buffer.
    Bind(BufferSlot, Shared<SampleBuffer>),
    /// Forget a staged buffer after a failed bind.
    ClearNext(BufferSlot),
    Trigger,
    SetStart(f64),
    SetLength(f64),
    SetPitch(f64),
    SetGain(f64),
    SetEnd(f64),
    SetDirection(GrainDirection),
    SetSoundInterpolation(bool),
    SetWindowInterpolation(bool),
}
