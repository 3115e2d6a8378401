//! Grain state: resolved settings, read positions and per tick rendering of a single grain.

use crate::{
    buffer::SampleData,
    utils::interpolation::{interpolate_linear, interpolate_none, split_position, wrap_position},
};

use super::{pending::GrainParameters, GrainDirection, GrainEvent, PlaybackMode};

// -------------------------------------------------------------------------------------------------

/// Lifecycle of the grain stream of an engine.
#[derive(Debug, Clone, Copy)]
pub(crate) enum GrainStage {
    /// No grain is sounding.
    Idle,
    /// A bang got received: the grain starts with the next rendered tick.
    Triggered,
    /// A grain is sounding.
    Active(Grain),
}

// -------------------------------------------------------------------------------------------------

/// The currently sounding grain.
///
/// Read positions are placed one step before the grain's first frame when the grain starts,
/// so that the first [`advance`](Self::advance) lands exactly on it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Grain {
    playback: PlaybackMode,
    parameters: GrainParameters,
    /// Window frames per output sample.
    window_step: f64,
    /// Sound frames per output sample, always positive.
    sound_step: f64,
    window_position: f64,
    sound_position: f64,
    /// Segment bounds in sound frames.
    segment_start: f64,
    segment_end: f64,
    /// Sound buffer samples per ms.
    milli_sample_rate: f64,
    /// Number of rendered ticks - 1.
    sample_count: i64,
}

impl Grain {
    /// Start a new windowed grain which reads `length * pitch` ms of the mono sound buffer,
    /// shaped by the mono window buffer.
    pub fn windowed(
        parameters: GrainParameters,
        sound: &SampleData,
        window: &SampleData,
        output_sample_rate: u32,
    ) -> Self {
        debug_assert!(parameters.length > 0.0, "Invalid grain length");
        let output_sample_rate = output_sample_rate as f64;
        let milli_sample_rate = sound.milli_sample_rate();

        let window_step =
            window.frame_count() as f64 / (parameters.length * output_sample_rate * 0.001);
        let sound_step = parameters.pitch * sound.sample_rate() as f64 / output_sample_rate;

        let sound_position = match parameters.direction {
            GrainDirection::Forward => parameters.start * milli_sample_rate - sound_step,
            GrainDirection::Reverse => {
                // reversed grains cover the same sound region as forward ones
                let sound_length = parameters.length * parameters.pitch;
                (parameters.start + sound_length) * milli_sample_rate + sound_step
            }
        };

        Self {
            playback: PlaybackMode::Windowed,
            parameters,
            window_step,
            sound_step,
            window_position: -window_step,
            sound_position,
            segment_start: 0.0,
            segment_end: sound.frame_count() as f64,
            milli_sample_rate,
            sample_count: -1,
        }
    }

    /// Start a new raw segment which reads the mono or stereo sound buffer from `start` to
    /// `end` ms, using the grain's pitch as sample increment.
    pub fn segment(parameters: GrainParameters, sound: &SampleData, output_sample_rate: u32) -> Self {
        let milli_sample_rate = sound.milli_sample_rate();
        let frame_count = sound.frame_count() as f64;

        let sound_step = (parameters.pitch * sound.sample_rate() as f64
            / output_sample_rate as f64)
            .abs();

        // round ms positions to the nearest frame
        let mut segment_end = (parameters.end * milli_sample_rate + 0.5).trunc();
        if parameters.end < 0.0 || segment_end < 0.0 || segment_end > frame_count {
            segment_end = frame_count;
        }
        let mut segment_start = (parameters.start * milli_sample_rate + 0.5).trunc();
        if parameters.start < 0.0 || segment_start < 0.0 || segment_start > segment_end {
            segment_start = 0.0;
        }

        let sound_position = match parameters.direction {
            GrainDirection::Forward => segment_start - sound_step,
            GrainDirection::Reverse => segment_end + sound_step,
        };

        Self {
            playback: PlaybackMode::Segment,
            parameters,
            window_step: 0.0,
            sound_step,
            window_position: 0.0,
            sound_position,
            segment_start,
            segment_end,
            milli_sample_rate,
            sample_count: -1,
        }
    }

    #[cfg(test)]
    pub fn window_step(&self) -> f64 {
        self.window_step
    }

    #[cfg(test)]
    pub fn sound_step(&self) -> f64 {
        self.sound_step
    }

    #[cfg(test)]
    pub fn sound_position(&self) -> f64 {
        self.sound_position
    }

    #[cfg(test)]
    pub fn window_position(&self) -> f64 {
        self.window_position
    }

    /// Segment start and end frames.
    #[cfg(test)]
    pub fn segment_bounds(&self) -> (f64, f64) {
        (self.segment_start, self.segment_end)
    }

    /// Rendered ticks of this grain, counting from 0, or -1 before the first tick.
    #[inline]
    pub fn sample_count(&self) -> i64 {
        self.sample_count
    }

    /// Report event for the grain's resolved settings.
    pub fn started_event(&self) -> GrainEvent {
        match self.playback {
            PlaybackMode::Windowed => GrainEvent::Started {
                start: self.parameters.start,
                length: self.parameters.length,
                pitch: self.parameters.pitch,
            },
            PlaybackMode::Segment => GrainEvent::Started {
                start: self.segment_start / self.milli_sample_rate,
                length: (self.segment_end - self.segment_start) / self.milli_sample_rate,
                pitch: self.parameters.pitch,
            },
        }
    }

    /// Move read positions to the next tick. Windowed sound positions wrap around at the
    /// sound buffer's boundaries.
    #[inline]
    pub fn advance(&mut self, sound_frame_count: usize) {
        self.window_position += self.window_step;
        match self.parameters.direction {
            GrainDirection::Forward => self.sound_position += self.sound_step,
            GrainDirection::Reverse => self.sound_position -= self.sound_step,
        }
        if self.playback == PlaybackMode::Windowed {
            self.sound_position = wrap_position(self.sound_position, sound_frame_count as f64);
        }
        self.sample_count += 1;
    }

    /// Render the left and right output of the current tick.
    #[inline]
    pub fn render(&self, sound: &SampleData, window: Option<&SampleData>) -> (f32, f32) {
        match (self.playback, window) {
            (PlaybackMode::Windowed, Some(window)) => {
                let window_value = fetch(
                    window.samples(),
                    self.window_position,
                    window.frame_count(),
                    1,
                    0,
                    self.parameters.window_interpolation,
                );
                let sound_value = fetch(
                    sound.samples(),
                    self.sound_position,
                    sound.frame_count(),
                    1,
                    0,
                    self.parameters.sound_interpolation,
                );
                let output =
                    (sound_value as f64 * window_value as f64 * self.parameters.gain) as f32;
                (output, output)
            }
            (PlaybackMode::Windowed, None) => (0.0, 0.0),
            (PlaybackMode::Segment, _) => {
                let frame_count = sound.frame_count();
                let channel_count = sound.channel_count();
                // segments may end exactly at the buffer's end
                let position = if self.sound_position >= frame_count as f64 {
                    (frame_count - 1) as f64
                } else {
                    self.sound_position
                };
                let interpolate = self.parameters.sound_interpolation;
                let left = fetch(
                    sound.samples(),
                    position,
                    frame_count,
                    channel_count,
                    0,
                    interpolate,
                );
                let right = if channel_count > 1 {
                    fetch(
                        sound.samples(),
                        position,
                        frame_count,
                        channel_count,
                        1,
                        interpolate,
                    )
                } else {
                    left
                };
                let gain = self.parameters.gain;
                (
                    (left as f64 * gain) as f32,
                    (right as f64 * gain) as f32,
                )
            }
        }
    }

    /// Returns true if the grain has no more ticks to render after the current one.
    #[inline]
    pub fn is_exhausted(&self, window_frame_count: usize) -> bool {
        match self.playback {
            PlaybackMode::Windowed => {
                self.window_position + self.window_step >= window_frame_count as f64
            }
            PlaybackMode::Segment => match self.parameters.direction {
                GrainDirection::Forward => self.sound_position + self.sound_step > self.segment_end,
                GrainDirection::Reverse => {
                    self.sound_position - self.sound_step < self.segment_start
                }
            },
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[inline]
fn fetch(
    samples: &[f32],
    position: f64,
    frame_count: usize,
    channel_count: usize,
    channel: usize,
    interpolate: bool,
) -> f32 {
    let (index, fraction) = split_position(position.max(0.0));
    let sample_index = index * channel_count + channel;
    if interpolate {
        interpolate_linear(samples, sample_index, fraction, frame_count, channel_count)
    } else {
        interpolate_none(samples, sample_index, frame_count, channel_count)
    }
}

// -------------------------------------------------------------------------------------------------
