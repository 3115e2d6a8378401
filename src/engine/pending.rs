use super::{
    io::{sample_at, SignalConnections, SignalInputs},
    GrainDirection,
};

// -------------------------------------------------------------------------------------------------

/// Control-rate grain settings which get applied when the next grain starts.
///
/// Only the engine's render thread reads and writes pending values: control threads send
/// updates via the engine's message queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PendingParameters {
    pub start: f64,
    pub length: f64,
    pub pitch: f64,
    pub gain: f64,
    pub end: f64,
    pub direction: GrainDirection,
    pub sound_interpolation: bool,
    pub window_interpolation: bool,
}

impl Default for PendingParameters {
    fn default() -> Self {
        Self {
            start: Self::DEFAULT_START,
            length: Self::DEFAULT_LENGTH,
            pitch: Self::DEFAULT_PITCH,
            gain: Self::DEFAULT_GAIN,
            end: Self::DEFAULT_END,
            direction: GrainDirection::Forward,
            sound_interpolation: true,
            window_interpolation: true,
        }
    }
}

impl PendingParameters {
    pub const DEFAULT_START: f64 = 0.0;
    pub const DEFAULT_LENGTH: f64 = 50.0;
    pub const DEFAULT_PITCH: f64 = 1.0;
    pub const DEFAULT_GAIN: f64 = 1.0;
    /// Negative end positions select the end of the sound buffer.
    pub const DEFAULT_END: f64 = -1.0;

    /// Snapshot the values for a grain which starts at the given frame of the current block.
    ///
    /// Connected parameters use their signal input's sample at `frame`, falling back to the
    /// pending value when the signal is missing or not finite. Audio-rate lengths must be
    /// positive too.
    pub fn resolve(
        &self,
        connections: &SignalConnections,
        inputs: &SignalInputs,
        frame: usize,
        gain_enabled: bool,
    ) -> GrainParameters {
        let signal = |connected: bool, signal: Option<&[f32]>| {
            if connected {
                sample_at(signal, frame)
                    .map(f64::from)
                    .filter(|value| value.is_finite())
            } else {
                None
            }
        };
        let gain = if gain_enabled {
            signal(connections.gain, inputs.gain).unwrap_or(self.gain)
        } else {
            1.0
        };
        GrainParameters {
            start: signal(connections.start, inputs.start).unwrap_or(self.start),
            length: signal(connections.length, inputs.length)
                .filter(|length| *length > 0.0)
                .unwrap_or(self.length),
            pitch: signal(connections.pitch, inputs.pitch).unwrap_or(self.pitch),
            gain,
            end: signal(connections.end, inputs.end).unwrap_or(self.end),
            direction: self.direction,
            sound_interpolation: self.sound_interpolation,
            window_interpolation: self.window_interpolation,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Grain settings, resolved from [`PendingParameters`] and signal inputs when a grain starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GrainParameters {
    /// Start position in ms.
    pub start: f64,
    /// Grain length in ms.
    pub length: f64,
    /// Pitch multiplier or segment sample increment.
    pub pitch: f64,
    pub gain: f64,
    /// Segment end position in ms.
    pub end: f64,
    pub direction: GrainDirection,
    pub sound_interpolation: bool,
    pub window_interpolation: bool,
}

// -------------------------------------------------------------------------------------------------
