//! Per-block signal inputs and outputs of a [`GrainEngine`](crate::GrainEngine).

use std::ops::Range;

use crate::utils::buffer::{clear_buffer, fill_optional_buffer};

// -------------------------------------------------------------------------------------------------

/// Selects which grain parameters are driven by audio-rate signal inputs instead of the
/// control-rate values set via the engine's handle.
///
/// Fixed when preparing the engine for rendering. Connected parameters sample their signal
/// input at the tick a grain starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalConnections {
    pub start: bool,
    pub length: bool,
    pub pitch: bool,
    pub gain: bool,
    pub end: bool,
}

impl SignalConnections {
    /// All parameters are control-rate values.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn start(mut self, connected: bool) -> Self {
        self.start = connected;
        self
    }

    pub fn length(mut self, connected: bool) -> Self {
        self.length = connected;
        self
    }

    pub fn pitch(mut self, connected: bool) -> Self {
        self.pitch = connected;
        self
    }

    pub fn gain(mut self, connected: bool) -> Self {
        self.gain = connected;
        self
    }

    pub fn end(mut self, connected: bool) -> Self {
        self.end = connected;
        self
    }
}

// -------------------------------------------------------------------------------------------------

/// Signal inputs for one audio block. Missing inputs, or inputs shorter than the block, read
/// as `0.0` for the trigger and as "not connected" for parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalInputs<'a> {
    /// Pulse trigger signal. Ignored in bang trigger mode.
    pub trigger: Option<&'a [f32]>,
    /// Start position in ms.
    pub start: Option<&'a [f32]>,
    /// Grain length in ms.
    pub length: Option<&'a [f32]>,
    /// Pitch multiplier, or the sample increment for segments.
    pub pitch: Option<&'a [f32]>,
    /// Gain multiplier.
    pub gain: Option<&'a [f32]>,
    /// Segment end position in ms.
    pub end: Option<&'a [f32]>,
}

impl<'a> SignalInputs<'a> {
    /// No signal inputs.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn trigger(mut self, signal: &'a [f32]) -> Self {
        self.trigger = Some(signal);
        self
    }

    pub fn start(mut self, signal: &'a [f32]) -> Self {
        self.start = Some(signal);
        self
    }

    pub fn length(mut self, signal: &'a [f32]) -> Self {
        self.length = Some(signal);
        self
    }

    pub fn pitch(mut self, signal: &'a [f32]) -> Self {
        self.pitch = Some(signal);
        self
    }

    pub fn gain(mut self, signal: &'a [f32]) -> Self {
        self.gain = Some(signal);
        self
    }

    pub fn end(mut self, signal: &'a [f32]) -> Self {
        self.end = Some(signal);
        self
    }

    #[inline]
    pub(crate) fn trigger_at(&self, frame: usize) -> f32 {
        sample_at(self.trigger, frame).unwrap_or(0.0)
    }
}

/// Read a single sample from an optional signal.
#[inline]
pub(crate) fn sample_at(signal: Option<&[f32]>, frame: usize) -> Option<f32> {
    signal.and_then(|signal| signal.get(frame).copied())
}

// -------------------------------------------------------------------------------------------------

/// Signal outputs for one audio block. The main output's length defines the block size.
/// Optional outputs should be at least as long as the main output.
#[derive(Debug)]
pub struct SignalOutputs<'a> {
    /// Grain audio signal, or the left channel of stereo segments.
    pub main: &'a mut [f32],
    /// Right channel: a copy of the main output for mono sound buffers.
    pub right: Option<&'a mut [f32]>,
    /// Rendered samples of the current grain, counting from `0`, or `-1` between grains.
    pub sample_count: Option<&'a mut [f32]>,
    /// Pulse overflow signal: `0` normally, the trigger input after a pulse ended while a
    /// grain is sounding, `-1` while no buffer can be read.
    pub overflow: Option<&'a mut [f32]>,
}

impl<'a> SignalOutputs<'a> {
    /// Create new outputs with the main output only.
    pub fn new(main: &'a mut [f32]) -> Self {
        Self {
            main,
            right: None,
            sample_count: None,
            overflow: None,
        }
    }

    pub fn right(mut self, signal: &'a mut [f32]) -> Self {
        self.right = Some(signal);
        self
    }

    pub fn sample_count(mut self, signal: &'a mut [f32]) -> Self {
        self.sample_count = Some(signal);
        self
    }

    pub fn overflow(mut self, signal: &'a mut [f32]) -> Self {
        self.overflow = Some(signal);
        self
    }

    /// Number of frames in this block.
    #[inline]
    pub fn len(&self) -> usize {
        self.main.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.main.is_empty()
    }

    /// Write a single frame.
    #[inline]
    pub(crate) fn write(
        &mut self,
        frame: usize,
        left: f32,
        right: f32,
        sample_count: f32,
        overflow: f32,
    ) {
        self.main[frame] = left;
        write_optional(self.right.as_deref_mut(), frame, right);
        write_optional(self.sample_count.as_deref_mut(), frame, sample_count);
        write_optional(self.overflow.as_deref_mut(), frame, overflow);
    }

    /// Write silence with `-1` sample count and overflow markers, starting at the given frame.
    pub(crate) fn write_unavailable(&mut self, from_frame: usize) {
        let range = from_frame.min(self.len())..self.len();
        clear_buffer(&mut self.main[range.clone()]);
        fill_optional_buffer(sub_range(self.right.as_deref_mut(), &range), 0.0);
        fill_optional_buffer(sub_range(self.sample_count.as_deref_mut(), &range), -1.0);
        fill_optional_buffer(sub_range(self.overflow.as_deref_mut(), &range), -1.0);
    }
}

#[inline]
fn sub_range<'s>(signal: Option<&'s mut [f32]>, range: &Range<usize>) -> Option<&'s mut [f32]> {
    signal.map(|signal| {
        let end = range.end.min(signal.len());
        &mut signal[range.start.min(end)..end]
    })
}

#[inline]
fn write_optional(signal: Option<&mut [f32]>, frame: usize, value: f32) {
    if let Some(sample) = signal.and_then(|signal| signal.get_mut(frame)) {
        *sample = value;
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_inputs() {
        let trigger = [0.0, 1.0];
        let inputs = SignalInputs::none().trigger(&trigger);
        assert_eq!(inputs.trigger_at(1), 1.0);
        assert_eq!(inputs.trigger_at(2), 0.0);
        assert_eq!(sample_at(inputs.start, 0), None);
    }

    #[test]
    fn optional_outputs() {
        let mut main = [0.0; 3];
        let mut overflow = [0.0; 2];
        let mut outputs = SignalOutputs::new(&mut main).overflow(&mut overflow);
        outputs.write(2, 0.5, 0.25, -1.0, 1.0);
        outputs.write(1, 0.5, 0.25, -1.0, 1.0);
        assert_eq!(outputs.len(), 3);
        assert_eq!(main, [0.0, 0.5, 0.5]);
        assert_eq!(overflow, [0.0, 1.0]);
    }

    #[test]
    fn unavailable_outputs() {
        let mut main = [0.5; 4];
        let mut sample_count = [3.0; 4];
        let mut overflow = [1.0; 6];
        let mut outputs = SignalOutputs::new(&mut main)
            .sample_count(&mut sample_count)
            .overflow(&mut overflow);
        outputs.write_unavailable(2);
        assert_eq!(main, [0.5, 0.5, 0.0, 0.0]);
        assert_eq!(sample_count, [3.0, 3.0, -1.0, -1.0]);
        // frames past the block stay untouched
        assert_eq!(overflow, [1.0, 1.0, -1.0, -1.0, 1.0, 1.0]);
    }
}
