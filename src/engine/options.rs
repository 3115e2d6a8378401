use crate::Error;

// -------------------------------------------------------------------------------------------------

/// How grains get started.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
    strum::EnumIter,
)]
pub enum TriggerMode {
    /// Grains start on [`GrainEngineHandle::trigger`](crate::GrainEngineHandle::trigger) calls.
    #[default]
    Bang,
    /// Grains start on rising edges (`0.0` followed by `1.0`) of the trigger signal input.
    Pulse,
}

/// How grains read from the sound buffer.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
    strum::EnumIter,
)]
pub enum PlaybackMode {
    /// Mono sound grains with a given length, shaped by a mono window buffer. Sound positions
    /// wrap around at the buffer boundaries.
    #[default]
    Windowed,
    /// Raw, unshaped mono or stereo sound segments between a start and end position.
    Segment,
}

/// Playback direction of grains through the sound buffer.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    strum::VariantNames,
    strum::EnumIter,
)]
pub enum GrainDirection {
    #[default]
    Forward,
    Reverse,
}

// -------------------------------------------------------------------------------------------------

/// Options to configure a [`GrainEngine`](crate::GrainEngine) variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrainEngineOptions {
    /// By default [`TriggerMode::Bang`].
    pub trigger: TriggerMode,

    /// By default [`PlaybackMode::Windowed`].
    pub playback: PlaybackMode,

    /// By default false. When true, grains get scaled by a gain parameter.
    pub gain: bool,

    /// By default false. When true, a [`GrainEvent::Started`](crate::GrainEvent::Started) event
    /// is sent for each new grain.
    pub report_grains: bool,

    /// Number of control messages which can be queued between two audio blocks.
    /// When exceeded, handle setters fail with [`Error::SendError`](crate::Error::SendError) and
    /// already queued messages are kept.
    pub message_queue_size: usize,

    /// Number of grain events which can be queued until they get consumed.
    /// When exceeded, new events get dropped.
    pub event_queue_size: usize,
}

impl Default for GrainEngineOptions {
    fn default() -> Self {
        Self::bang_grains()
    }
}

impl GrainEngineOptions {
    pub const DEFAULT_MESSAGE_QUEUE_SIZE: usize = 64;
    pub const DEFAULT_EVENT_QUEUE_SIZE: usize = 32;

    /// Bang triggered, windowed mono grains without gain.
    pub fn bang_grains() -> Self {
        Self {
            trigger: TriggerMode::Bang,
            playback: PlaybackMode::Windowed,
            gain: false,
            report_grains: false,
            message_queue_size: Self::DEFAULT_MESSAGE_QUEUE_SIZE,
            event_queue_size: Self::DEFAULT_EVENT_QUEUE_SIZE,
        }
    }

    /// Pulse triggered, windowed mono grains with gain, reporting each new grain.
    pub fn pulse_grains() -> Self {
        Self {
            trigger: TriggerMode::Pulse,
            playback: PlaybackMode::Windowed,
            gain: true,
            report_grains: true,
            ..Self::bang_grains()
        }
    }

    /// Pulse triggered, raw mono or stereo sample segments with gain.
    pub fn pulse_segments() -> Self {
        Self {
            trigger: TriggerMode::Pulse,
            playback: PlaybackMode::Segment,
            gain: true,
            report_grains: false,
            ..Self::bang_grains()
        }
    }

    pub fn trigger(mut self, trigger: TriggerMode) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn playback(mut self, playback: PlaybackMode) -> Self {
        self.playback = playback;
        self
    }

    pub fn gain(mut self, gain: bool) -> Self {
        self.gain = gain;
        self
    }

    pub fn report_grains(mut self, report: bool) -> Self {
        self.report_grains = report;
        self
    }

    pub fn message_queue_size(mut self, size: usize) -> Self {
        self.message_queue_size = size;
        self
    }

    pub fn event_queue_size(mut self, size: usize) -> Self {
        self.event_queue_size = size;
        self
    }

    /// Maximum number of sound buffer channels the playback mode can read.
    pub fn max_sound_channels(&self) -> usize {
        match self.playback {
            PlaybackMode::Windowed => 1,
            PlaybackMode::Segment => 2,
        }
    }

    /// Validate all options. Returns Error::ParameterError on errors.
    pub fn validate(&self) -> Result<(), Error> {
        if self.message_queue_size == 0 {
            return Err(Error::ParameterError(
                "engine options 'message_queue_size' must be > 0".to_string(),
            ));
        }
        if self.event_queue_size == 0 {
            return Err(Error::ParameterError(
                "engine options 'event_queue_size' must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    #[test]
    fn presets() {
        let options = GrainEngineOptions::default();
        assert_eq!(options, GrainEngineOptions::bang_grains());
        assert_eq!(options.max_sound_channels(), 1);
        assert!(!options.gain);

        let options = GrainEngineOptions::pulse_grains();
        assert_eq!(options.trigger, TriggerMode::Pulse);
        assert!(options.gain && options.report_grains);

        let options = GrainEngineOptions::pulse_segments();
        assert_eq!(options.playback, PlaybackMode::Segment);
        assert_eq!(options.max_sound_channels(), 2);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validation() {
        assert!(GrainEngineOptions::default()
            .message_queue_size(0)
            .validate()
            .is_err());
        assert!(GrainEngineOptions::default()
            .event_queue_size(0)
            .validate()
            .is_err());
    }

    #[test]
    fn enum_names() {
        assert_eq!(GrainDirection::from_str("Reverse").unwrap(), GrainDirection::Reverse);
        assert_eq!(PlaybackMode::Segment.to_string(), "Segment");
        assert!(TriggerMode::from_str("Sometimes").is_err());
    }
}
