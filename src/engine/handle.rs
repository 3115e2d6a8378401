use std::sync::Arc;

use crossbeam_channel::Receiver;
use crossbeam_queue::ArrayQueue;
use four_cc::FourCC;

use super::{
    message::{BufferSlot, GrainEngineMessage},
    GrainDirection, GrainEngine, GrainEngineOptions, GrainEvent, PlaybackMode, TriggerMode,
};
use crate::{
    buffer::BufferStorage,
    parameter::{Parameter, ParameterValueUpdate},
    Error,
};

// -------------------------------------------------------------------------------------------------

/// A handle to control a [`GrainEngine`] from non real-time threads.
///
/// All setters only validate and enqueue their values: the engine applies them with its next
/// processed block. Control values are then used by the next grain which starts.
#[derive(Clone)]
pub struct GrainEngineHandle {
    options: GrainEngineOptions,
    storage: BufferStorage,
    message_queue: Arc<ArrayQueue<GrainEngineMessage>>,
    event_receiver: Receiver<GrainEvent>,
}

impl GrainEngineHandle {
    pub(crate) fn new(
        options: GrainEngineOptions,
        storage: BufferStorage,
        message_queue: Arc<ArrayQueue<GrainEngineMessage>>,
        event_receiver: Receiver<GrainEvent>,
    ) -> Self {
        Self {
            options,
            storage,
            message_queue,
            event_receiver,
        }
    }

    /// The options the engine got created with.
    pub fn options(&self) -> &GrainEngineOptions {
        &self.options
    }

    /// Human readable description of the engine variant.
    pub fn info(&self) -> String {
        let mut info = format!(
            "{} v{}: {} triggered {} grains",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            self.options.trigger.to_string().to_lowercase(),
            self.options.playback.to_string().to_lowercase(),
        );
        if self.options.gain {
            info.push_str(", with gain");
        }
        if self.options.report_grains {
            info.push_str(", reporting grains");
        }
        info
    }

    /// Bind the sound buffer with the given name. Windowed grains need a mono buffer, segments
    /// a mono or stereo one.
    ///
    /// When the engine has no sound buffer yet, it's used immediately. Else it replaces the
    /// current buffer when the next grain starts. On errors, a previously staged buffer gets
    /// dropped and the current buffer is kept.
    pub fn set_sound_buffer(&self, name: &str) -> Result<(), Error> {
        self.bind_buffer(BufferSlot::Sound, name, self.options.max_sound_channels())
    }

    /// Bind the mono window buffer with the given name, which shapes windowed grains.
    /// See [`set_sound_buffer`](Self::set_sound_buffer) for details.
    pub fn set_window_buffer(&self, name: &str) -> Result<(), Error> {
        if self.options.playback != PlaybackMode::Windowed {
            return Err(Error::ParameterError(
                "Segment engines have no window buffer".to_string(),
            ));
        }
        self.bind_buffer(BufferSlot::Window, name, 1)
    }

    /// Request a new grain. Only available for bang triggered engines.
    ///
    /// Bangs which arrive while a grain is pending or sounding get ignored and reported as
    /// [`GrainEvent::Overflow`].
    pub fn trigger(&self) -> Result<(), Error> {
        if self.options.trigger != TriggerMode::Bang {
            return Err(Error::ParameterError(
                "Pulse engines get triggered by their trigger signal".to_string(),
            ));
        }
        self.send(GrainEngineMessage::Trigger, "trigger")
    }

    /// Set the grain or segment start position in ms.
    pub fn set_start(&self, start: f64) -> Result<(), Error> {
        Self::check_finite("start", start)?;
        self.send(GrainEngineMessage::SetStart(start), "set_start")
    }

    /// Set the length of windowed grains in ms. Must be > 0.
    pub fn set_length(&self, length: f64) -> Result<(), Error> {
        if self.options.playback != PlaybackMode::Windowed {
            return Err(Error::ParameterError(
                "Segment lengths are set via their start and end".to_string(),
            ));
        }
        if !(length.is_finite() && length > 0.0) {
            log::warn!("Ignoring invalid grain length: {length}");
            return Err(Error::InvalidParameter(format!(
                "Grain length must be > 0, but is {length}"
            )));
        }
        self.send(GrainEngineMessage::SetLength(length), "set_length")
    }

    /// Set the pitch multiplier of windowed grains or the sample increment of segments.
    pub fn set_pitch(&self, pitch: f64) -> Result<(), Error> {
        Self::check_finite("pitch", pitch)?;
        self.send(GrainEngineMessage::SetPitch(pitch), "set_pitch")
    }

    /// Set the output gain of grains. Only available when gain is enabled in the engine options.
    pub fn set_gain(&self, gain: f64) -> Result<(), Error> {
        if !self.options.gain {
            return Err(Error::ParameterError(
                "Gain is not enabled for this engine".to_string(),
            ));
        }
        Self::check_finite("gain", gain)?;
        self.send(GrainEngineMessage::SetGain(gain), "set_gain")
    }

    /// Set the segment end position in ms. Negative values select the end of the sound buffer.
    pub fn set_end(&self, end: f64) -> Result<(), Error> {
        if self.options.playback != PlaybackMode::Segment {
            return Err(Error::ParameterError(
                "Only segment engines have an end position".to_string(),
            ));
        }
        Self::check_finite("end", end)?;
        self.send(GrainEngineMessage::SetEnd(end), "set_end")
    }

    pub fn set_direction(&self, direction: GrainDirection) -> Result<(), Error> {
        self.send(GrainEngineMessage::SetDirection(direction), "set_direction")
    }

    /// Enable or disable linear interpolation of sound buffer reads.
    pub fn set_sound_interpolation(&self, enabled: bool) -> Result<(), Error> {
        self.send(
            GrainEngineMessage::SetSoundInterpolation(enabled),
            "set_sound_interpolation",
        )
    }

    /// Enable or disable linear interpolation of window buffer reads.
    pub fn set_window_interpolation(&self, enabled: bool) -> Result<(), Error> {
        if self.options.playback != PlaybackMode::Windowed {
            return Err(Error::ParameterError(
                "Segment engines have no window buffer".to_string(),
            ));
        }
        self.send(
            GrainEngineMessage::SetWindowInterpolation(enabled),
            "set_window_interpolation",
        )
    }

    /// Descriptors of all parameters the engine variant supports.
    pub fn parameters(&self) -> Vec<Box<dyn Parameter>> {
        let mut parameters: Vec<Box<dyn Parameter>> = vec![Box::new(GrainEngine::START)];
        match self.options.playback {
            PlaybackMode::Windowed => parameters.push(Box::new(GrainEngine::LENGTH)),
            PlaybackMode::Segment => parameters.push(Box::new(GrainEngine::END)),
        }
        parameters.push(Box::new(GrainEngine::PITCH));
        if self.options.gain {
            parameters.push(Box::new(GrainEngine::GAIN));
        }
        parameters.push(Box::new(GrainEngine::DIRECTION));
        parameters.push(Box::new(GrainEngine::SOUND_INTERPOLATION));
        if self.options.playback == PlaybackMode::Windowed {
            parameters.push(Box::new(GrainEngine::WINDOW_INTERPOLATION));
        }
        parameters
    }

    /// Set a parameter by its id, using a raw plain or normalized value.
    pub fn set_parameter(&self, id: FourCC, value: ParameterValueUpdate) -> Result<(), Error> {
        if !self.parameters().iter().any(|parameter| parameter.id() == id) {
            return Err(Error::ParameterError(format!(
                "Unknown or unsupported parameter: '{id}'"
            )));
        }
        let invalid_value =
            || Error::InvalidParameter(format!("Invalid value update for parameter '{id}'"));

        if id == GrainEngine::START.id() {
            let start = GrainEngine::START.value_from_update(&value);
            self.set_start(start.ok_or_else(invalid_value)? as f64)
        } else if id == GrainEngine::LENGTH.id() {
            let length = GrainEngine::LENGTH.value_from_update(&value);
            self.set_length(length.ok_or_else(invalid_value)? as f64)
        } else if id == GrainEngine::PITCH.id() {
            let pitch = GrainEngine::PITCH.value_from_update(&value);
            self.set_pitch(pitch.ok_or_else(invalid_value)? as f64)
        } else if id == GrainEngine::GAIN.id() {
            let gain = GrainEngine::GAIN.value_from_update(&value);
            self.set_gain(gain.ok_or_else(invalid_value)? as f64)
        } else if id == GrainEngine::END.id() {
            let end = GrainEngine::END.value_from_update(&value);
            self.set_end(end.ok_or_else(invalid_value)? as f64)
        } else if id == GrainEngine::DIRECTION.id() {
            let direction = GrainEngine::DIRECTION.value_from_update::<GrainDirection>(&value);
            self.set_direction(direction.ok_or_else(invalid_value)?)
        } else if id == GrainEngine::SOUND_INTERPOLATION.id() {
            let enabled = GrainEngine::SOUND_INTERPOLATION.value_from_update(&value);
            self.set_sound_interpolation(enabled.ok_or_else(invalid_value)?)
        } else {
            let enabled = GrainEngine::WINDOW_INTERPOLATION.value_from_update(&value);
            self.set_window_interpolation(enabled.ok_or_else(invalid_value)?)
        }
    }

    /// Receive a pending engine event, if any.
    pub fn try_recv_event(&self) -> Option<GrainEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Drain all pending engine events.
    pub fn events(&self) -> impl Iterator<Item = GrainEvent> + '_ {
        self.event_receiver.try_iter()
    }

    fn bind_buffer(&self, slot: BufferSlot, name: &str, max_channels: usize) -> Result<(), Error> {
        let buffer = self
            .storage
            .get(name)
            .ok_or_else(|| Error::InvalidBufferReference(name.to_string()))
            .and_then(|buffer| {
                if !buffer.is_valid() {
                    Err(Error::BufferUnavailable(name.to_string()))
                } else if buffer.channel_count() > max_channels {
                    Err(Error::UnsupportedChannelCount {
                        name: name.to_string(),
                        channel_count: buffer.channel_count(),
                    })
                } else {
                    Ok(buffer)
                }
            });
        match buffer {
            Ok(buffer) => {
                log::debug!("Binding {slot} buffer '{name}'");
                self.send(GrainEngineMessage::Bind(slot, buffer), "bind")
            }
            Err(err) => {
                log::error!("Failed to bind {slot} buffer: {err}");
                self.send(GrainEngineMessage::ClearNext(slot), "clear_next")?;
                Err(err)
            }
        }
    }

    fn send(&self, message: GrainEngineMessage, message_name: &str) -> Result<(), Error> {
        if self.message_queue.push(message).is_err() {
            log::warn!("Grain engine's message queue is full. Failed to send a {message_name} message.");
            log::warn!("Increase the engine's message queue size to prevent this from happening...");
            return Err(Error::SendError("Grain engine queue is full".to_string()));
        }
        Ok(())
    }

    fn check_finite(name: &str, value: f64) -> Result<(), Error> {
        if !value.is_finite() {
            log::warn!("Ignoring invalid grain {name}: {value}");
            return Err(Error::InvalidParameter(format!(
                "Grain {name} must be a finite number, but is {value}"
            )));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
