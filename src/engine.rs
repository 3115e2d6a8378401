//! Real-time grain engines, which render one grain stream at a time from shared sample buffers.

use std::sync::Arc;

use crossbeam_channel::Sender;
use crossbeam_queue::ArrayQueue;
use four_cc::FourCC;
use strum::VariantNames;

use crate::{
    buffer::{BufferStorage, SampleBuffer, SampleReadGuard},
    parameter::{BooleanParameter, EnumParameter, FloatParameter},
    Error,
};

// -------------------------------------------------------------------------------------------------

mod binding;
mod event;
mod grain;
mod handle;
mod io;
mod message;
mod options;
mod pending;

pub use event::GrainEvent;
pub use handle::GrainEngineHandle;
pub use io::{SignalConnections, SignalInputs, SignalOutputs};
pub use options::{GrainDirection, GrainEngineOptions, PlaybackMode, TriggerMode};

use binding::BufferBinding;
use grain::{Grain, GrainStage};
use message::{BufferSlot, GrainEngineMessage};
use pending::PendingParameters;

// -------------------------------------------------------------------------------------------------

/// Buffers which are read from within a single audio block.
struct ReadBuffers {
    sound: SampleReadGuard,
    /// Only present in windowed playback.
    window: Option<SampleReadGuard>,
}

// -------------------------------------------------------------------------------------------------

/// A granular synthesis engine which plays a single stream of grains, read from a sound buffer.
///
/// Depending on its [`GrainEngineOptions`], grains get started by bangs or by rising edges of a
/// pulse signal, and are either windowed mono grains of a given length or raw mono or stereo
/// sample segments. A new grain only starts when the previous one has finished.
///
/// Engines are created together with a [`GrainEngineHandle`]: move the engine into the audio
/// thread and call [`prepare`](Self::prepare) and [`process`](Self::process) there. Use the
/// handle on control threads to bind buffers and set parameters. Control values get applied
/// when the next grain starts, buffer changes as soon as no grain is reading the old buffer.
///
/// Rendering never blocks or allocates. While no valid buffers are bound, engines render
/// silence and mark the overflow and sample count outputs with `-1`.
pub struct GrainEngine {
    options: GrainEngineOptions,
    message_queue: Arc<ArrayQueue<GrainEngineMessage>>,
    event_sender: Sender<GrainEvent>,
    sound: BufferBinding,
    window: BufferBinding,
    pending: PendingParameters,
    connections: SignalConnections,
    output_sample_rate: u32,
    stage: GrainStage,
    last_trigger: f32,
    overflow_latched: bool,
}

impl GrainEngine {
    /// Grain or segment start position in ms.
    pub const START: FloatParameter = FloatParameter::new(
        FourCC(*b"GSTA"),
        "Start",
        0.0..=10000.0,
        PendingParameters::DEFAULT_START as f32,
    )
    .with_unit("ms");

    /// Length of windowed grains in ms.
    pub const LENGTH: FloatParameter = FloatParameter::new(
        FourCC(*b"GLEN"),
        "Length",
        1.0..=1000.0,
        PendingParameters::DEFAULT_LENGTH as f32,
    )
    .with_unit("ms");

    /// Pitch multiplier, or the sample increment of segments.
    pub const PITCH: FloatParameter = FloatParameter::new(
        FourCC(*b"GPIT"),
        "Pitch",
        0.0..=4.0,
        PendingParameters::DEFAULT_PITCH as f32,
    );

    pub const GAIN: FloatParameter = FloatParameter::new(
        FourCC(*b"GGAN"),
        "Gain",
        0.0..=2.0,
        PendingParameters::DEFAULT_GAIN as f32,
    );

    /// Segment end position in ms. Negative values select the end of the buffer.
    pub const END: FloatParameter = FloatParameter::new(
        FourCC(*b"GEND"),
        "End",
        -1.0..=10000.0,
        PendingParameters::DEFAULT_END as f32,
    )
    .with_unit("ms");

    pub const DIRECTION: EnumParameter =
        EnumParameter::new(FourCC(*b"GDIR"), "Direction", GrainDirection::VARIANTS, 0);

    pub const SOUND_INTERPOLATION: BooleanParameter =
        BooleanParameter::new(FourCC(*b"GSIP"), "Sound Interpolation", true);

    pub const WINDOW_INTERPOLATION: BooleanParameter =
        BooleanParameter::new(FourCC(*b"GWIP"), "Window Interpolation", true);

    /// Create a new engine and its control handle. Buffers get resolved by name from the given
    /// storage.
    pub fn new(
        options: GrainEngineOptions,
        storage: BufferStorage,
    ) -> Result<(Self, GrainEngineHandle), Error> {
        options.validate()?;
        let message_queue = Arc::new(ArrayQueue::new(options.message_queue_size));
        let (event_sender, event_receiver) = crossbeam_channel::bounded(options.event_queue_size);
        log::debug!(
            "Creating new {} triggered {} grain engine",
            options.trigger,
            options.playback
        );
        let handle = GrainEngineHandle::new(
            options.clone(),
            storage,
            Arc::clone(&message_queue),
            event_receiver,
        );
        let engine = Self {
            options,
            message_queue,
            event_sender,
            sound: BufferBinding::new(),
            window: BufferBinding::new(),
            pending: PendingParameters::default(),
            connections: SignalConnections::none(),
            output_sample_rate: 0,
            stage: GrainStage::Idle,
            last_trigger: 0.0,
            overflow_latched: false,
        };
        Ok((engine, handle))
    }

    /// The engine's options.
    pub fn options(&self) -> &GrainEngineOptions {
        &self.options
    }

    /// The output sample rate, or 0 when the engine is not yet prepared.
    pub fn output_sample_rate(&self) -> u32 {
        self.output_sample_rate
    }

    /// Returns true while a grain is sounding.
    pub fn is_active(&self) -> bool {
        matches!(self.stage, GrainStage::Active(_))
    }

    /// Prepare rendering with the given output sample rate and signal connections.
    ///
    /// Stops a sounding grain and resets trigger and overflow tracking. Must be called at least
    /// once before processing: unprepared engines render silence.
    pub fn prepare(
        &mut self,
        output_sample_rate: u32,
        connections: SignalConnections,
    ) -> Result<(), Error> {
        if output_sample_rate == 0 {
            return Err(Error::ParameterError(
                "Output sample rate must be > 0".to_string(),
            ));
        }
        log::debug!("Preparing grain engine at {output_sample_rate} Hz with {connections:?}");
        self.output_sample_rate = output_sample_rate;
        self.connections = connections;
        self.stage = GrainStage::Idle;
        self.last_trigger = 0.0;
        self.overflow_latched = false;
        Ok(())
    }

    /// Render a single block of audio. The main output defines the block size.
    pub fn process(&mut self, inputs: &SignalInputs, outputs: &mut SignalOutputs) {
        Self::assert_no_alloc(|| self.process_block(inputs, outputs))
    }

    fn process_block(&mut self, inputs: &SignalInputs, outputs: &mut SignalOutputs) {
        self.process_messages();

        if self.output_sample_rate == 0 {
            outputs.write_unavailable(0);
            return;
        }

        let mut buffers = match self.read_buffers() {
            Some(buffers) => buffers,
            None => match self.promote_unreadable_buffers() {
                Some(buffers) => buffers,
                None => {
                    outputs.write_unavailable(0);
                    return;
                }
            },
        };

        for frame in 0..outputs.len() {
            let trigger = inputs.trigger_at(frame);

            if !matches!(self.stage, GrainStage::Active(_)) {
                if !self.is_triggered(trigger) {
                    outputs.write(frame, 0.0, 0.0, -1.0, 0.0);
                    self.last_trigger = trigger;
                    continue;
                }
                // staged buffers get applied with new grains only
                if self.sound.promote() | self.window.promote() {
                    match self.read_buffers() {
                        Some(new_buffers) => buffers = new_buffers,
                        None => {
                            outputs.write_unavailable(frame);
                            return;
                        }
                    }
                }
                self.start_grain(frame, inputs, &buffers);
            }

            if let GrainStage::Active(grain) = &mut self.stage {
                if self.options.trigger == TriggerMode::Pulse
                    && !self.overflow_latched
                    && self.last_trigger == 1.0
                    && trigger == 0.0
                {
                    self.overflow_latched = true;
                }
                let sound = &*buffers.sound;
                let window = buffers.window.as_deref();

                grain.advance(sound.frame_count());
                let (left, right) = grain.render(sound, window);
                let overflow = if self.overflow_latched { trigger } else { 0.0 };
                outputs.write(frame, left, right, grain.sample_count() as f32, overflow);

                if grain.is_exhausted(window.map_or(0, |window| window.frame_count())) {
                    self.stage = GrainStage::Idle;
                }
            }
            self.last_trigger = trigger;
        }
    }

    fn process_messages(&mut self) {
        while let Some(message) = self.message_queue.pop() {
            match message {
                GrainEngineMessage::Bind(slot, buffer) => self.binding_mut(slot).bind(buffer),
                GrainEngineMessage::ClearNext(slot) => self.binding_mut(slot).clear_next(),
                GrainEngineMessage::Trigger => {
                    if self.options.trigger == TriggerMode::Bang {
                        if matches!(self.stage, GrainStage::Idle) {
                            self.stage = GrainStage::Triggered;
                        } else {
                            // dropped when the event queue is full
                            let _ = self.event_sender.try_send(GrainEvent::Overflow);
                        }
                    }
                }
                GrainEngineMessage::SetStart(start) => self.pending.start = start,
                GrainEngineMessage::SetLength(length) => self.pending.length = length,
                GrainEngineMessage::SetPitch(pitch) => self.pending.pitch = pitch,
                GrainEngineMessage::SetGain(gain) => self.pending.gain = gain,
                GrainEngineMessage::SetEnd(end) => self.pending.end = end,
                GrainEngineMessage::SetDirection(direction) => self.pending.direction = direction,
                GrainEngineMessage::SetSoundInterpolation(enabled) => {
                    self.pending.sound_interpolation = enabled
                }
                GrainEngineMessage::SetWindowInterpolation(enabled) => {
                    self.pending.window_interpolation = enabled
                }
            }
        }
    }

    fn binding_mut(&mut self, slot: BufferSlot) -> &mut BufferBinding {
        match slot {
            BufferSlot::Sound => &mut self.sound,
            BufferSlot::Window => &mut self.window,
        }
    }

    /// Access the current buffers for reading, if they are valid and have a supported layout.
    fn read_buffers(&self) -> Option<ReadBuffers> {
        let sound = SampleBuffer::read(self.sound.current()?)?;
        if sound.channel_count() > self.options.max_sound_channels() {
            return None;
        }
        let window = match self.options.playback {
            PlaybackMode::Windowed => {
                let window = SampleBuffer::read(self.window.current()?)?;
                if window.channel_count() != 1 {
                    return None;
                }
                Some(window)
            }
            PlaybackMode::Segment => None,
        };
        Some(ReadBuffers { sound, window })
    }

    /// Apply staged buffers when the current ones can't be read. Invalid buffers may become
    /// valid again, so sounding grains keep their buffers then. A grain whose buffer got removed
    /// from the storage can never continue and gets stopped.
    fn promote_unreadable_buffers(&mut self) -> Option<ReadBuffers> {
        if matches!(self.stage, GrainStage::Active(_)) {
            if !self.has_removed_buffers() {
                return None;
            }
            self.stage = GrainStage::Idle;
        }
        if !(self.sound.promote() | self.window.promote()) {
            return None;
        }
        self.read_buffers()
    }

    fn has_removed_buffers(&self) -> bool {
        let is_removed = |binding: &BufferBinding| binding.current().is_some_and(|b| b.is_removed());
        is_removed(&self.sound) || is_removed(&self.window)
    }

    fn is_triggered(&self, trigger: f32) -> bool {
        match self.options.trigger {
            TriggerMode::Bang => matches!(self.stage, GrainStage::Triggered),
            TriggerMode::Pulse => self.last_trigger == 0.0 && trigger == 1.0,
        }
    }

    /// Resolve pending values and signal inputs at the given frame into a new active grain.
    fn start_grain(&mut self, frame: usize, inputs: &SignalInputs, buffers: &ReadBuffers) {
        let parameters = self
            .pending
            .resolve(&self.connections, inputs, frame, self.options.gain);
        let grain = match buffers.window.as_deref() {
            Some(window) => {
                Grain::windowed(parameters, &buffers.sound, window, self.output_sample_rate)
            }
            None => Grain::segment(parameters, &buffers.sound, self.output_sample_rate),
        };
        if self.options.report_grains {
            // dropped when the event queue is full
            let _ = self.event_sender.try_send(grain.started_event());
        }
        self.overflow_latched = false;
        self.stage = GrainStage::Active(grain);
    }

    fn assert_no_alloc<T, F: FnOnce() -> T>(func: F) -> T {
        #[cfg(feature = "assert-allocs")]
        return assert_no_alloc::assert_no_alloc::<T, F>(func);

        #[cfg(not(feature = "assert-allocs"))]
        return func();
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{buffer::SampleData, parameter::ParameterValueUpdate};

    const BLOCK_SIZE: usize = 512;

    struct Rendered {
        main: Vec<f32>,
        right: Vec<f32>,
        sample_count: Vec<f32>,
        overflow: Vec<f32>,
    }

    /// Render `frame_count` frames in blocks, with an optional trigger signal.
    fn render(engine: &mut GrainEngine, trigger: Option<&[f32]>, frame_count: usize) -> Rendered {
        let mut rendered = Rendered {
            main: vec![0.0; frame_count],
            right: vec![0.0; frame_count],
            sample_count: vec![0.0; frame_count],
            overflow: vec![0.0; frame_count],
        };
        let mut offset = 0;
        while offset < frame_count {
            let end = (offset + BLOCK_SIZE).min(frame_count);
            let mut inputs = SignalInputs::none();
            if let Some(trigger) = trigger {
                inputs = inputs.trigger(&trigger[offset..end]);
            }
            let mut outputs = SignalOutputs::new(&mut rendered.main[offset..end])
                .right(&mut rendered.right[offset..end])
                .sample_count(&mut rendered.sample_count[offset..end])
                .overflow(&mut rendered.overflow[offset..end]);
            engine.process(&inputs, &mut outputs);
            offset = end;
        }
        rendered
    }

    fn constant(value: f32, frame_count: usize, sample_rate: u32) -> SampleData {
        SampleData::mono(vec![value; frame_count], sample_rate).unwrap()
    }

    fn ramp(frame_count: usize, sample_rate: u32) -> SampleData {
        SampleData::from_fn(frame_count, 1, sample_rate, |frame, _| frame as f32).unwrap()
    }

    fn windowed_engine(options: GrainEngineOptions) -> (GrainEngine, GrainEngineHandle, BufferStorage) {
        let storage = BufferStorage::new();
        storage.insert("snd", constant(1.0, 44100, 44100)).unwrap();
        storage.insert("win", constant(1.0, 4410, 44100)).unwrap();
        let (mut engine, handle) = GrainEngine::new(options, storage.clone()).unwrap();
        handle.set_sound_buffer("snd").unwrap();
        handle.set_window_buffer("win").unwrap();
        engine.prepare(44100, SignalConnections::none()).unwrap();
        (engine, handle, storage)
    }

    /// A trigger signal with single frame pulses at the given frames.
    fn pulses(frame_count: usize, frames: &[usize]) -> Vec<f32> {
        let mut trigger = vec![0.0; frame_count];
        for frame in frames {
            trigger[*frame] = 1.0;
        }
        trigger
    }

    fn grain_frames(rendered: &Rendered) -> usize {
        rendered.sample_count.iter().filter(|c| **c >= 0.0).count()
    }

    #[test]
    fn grains_last_window_frames_per_window_step() {
        let (mut engine, handle, _storage) = windowed_engine(GrainEngineOptions::bang_grains());
        handle.trigger().unwrap();
        let rendered = render(&mut engine, None, 5000);
        assert!(rendered.main[..2205].iter().all(|s| *s == 1.0));
        assert!(rendered.main[2205..].iter().all(|s| *s == 0.0));
        assert_eq!(rendered.main, rendered.right);
        assert_eq!(rendered.sample_count[0], 0.0);
        assert_eq!(rendered.sample_count[2204], 2204.0);
        assert!(rendered.sample_count[2205..].iter().all(|c| *c == -1.0));
        assert!(rendered.overflow.iter().all(|o| *o == 0.0));
        assert!(!engine.is_active());
    }

    #[test]
    fn unbound_buffers_render_silence() {
        let storage = BufferStorage::new();
        let (mut engine, handle) =
            GrainEngine::new(GrainEngineOptions::pulse_grains(), storage.clone()).unwrap();
        engine.prepare(44100, SignalConnections::none()).unwrap();
        let trigger = pulses(2048, &[1, 100, 1000]);
        let rendered = render(&mut engine, Some(&trigger), 2048);
        assert!(rendered.main.iter().all(|s| *s == 0.0));
        assert!(rendered.right.iter().all(|s| *s == 0.0));
        assert!(rendered.overflow.iter().all(|o| *o == -1.0));
        assert!(rendered.sample_count.iter().all(|c| *c == -1.0));

        // sound only is not enough for windowed grains
        storage.insert("snd", constant(1.0, 100, 44100)).unwrap();
        handle.set_sound_buffer("snd").unwrap();
        let rendered = render(&mut engine, Some(&trigger), 2048);
        assert!(rendered.main.iter().all(|s| *s == 0.0));
        assert!(rendered.overflow.iter().all(|o| *o == -1.0));
    }

    #[test]
    fn invalid_buffers_render_silence_until_valid_again() {
        let (mut engine, handle, storage) = windowed_engine(GrainEngineOptions::bang_grains());
        storage.set_valid("win", false).unwrap();
        handle.trigger().unwrap();
        let rendered = render(&mut engine, None, 1024);
        assert!(rendered.main.iter().all(|s| *s == 0.0));
        assert!(rendered.overflow.iter().all(|o| *o == -1.0));
        assert!(rendered.sample_count.iter().all(|c| *c == -1.0));

        // the pending bang survives
        storage.set_valid("win", true).unwrap();
        let rendered = render(&mut engine, None, 1024);
        assert_eq!(rendered.main[0], 1.0);
        assert_eq!(rendered.overflow[0], 0.0);
    }

    #[test]
    fn removed_buffers_can_be_replaced() {
        let (mut engine, handle, storage) = windowed_engine(GrainEngineOptions::bang_grains());
        handle.trigger().unwrap();
        render(&mut engine, None, 100);
        assert!(engine.is_active());

        // removed buffers stop the grain
        storage.remove("snd");
        let rendered = render(&mut engine, None, 100);
        assert!(rendered.main.iter().all(|s| *s == 0.0));
        assert!(!engine.is_active());

        // the staged buffer replaces the removed one while idle
        storage.insert("snd2", constant(0.5, 1000, 44100)).unwrap();
        handle.set_sound_buffer("snd2").unwrap();
        let rendered = render(&mut engine, None, 100);
        assert!(rendered.main.iter().all(|s| *s == 0.0));
        assert!(rendered.overflow.iter().all(|o| *o == 0.0));
        assert!(!engine.is_active());

        handle.trigger().unwrap();
        let rendered = render(&mut engine, None, 100);
        assert!(rendered.main.iter().all(|s| *s == 0.5));
    }

    #[test]
    fn invalid_buffers_keep_the_sounding_grain() {
        let (mut engine, handle, storage) = windowed_engine(GrainEngineOptions::bang_grains());
        storage.insert("snd2", constant(0.5, 44100, 44100)).unwrap();
        handle.trigger().unwrap();
        render(&mut engine, None, 100);
        assert!(engine.is_active());

        handle.set_sound_buffer("snd2").unwrap();
        storage.set_valid("win", false).unwrap();
        let rendered = render(&mut engine, None, 100);
        assert!(rendered.main.iter().all(|s| *s == 0.0));
        assert!(rendered.sample_count.iter().all(|c| *c == -1.0));
        assert!(rendered.overflow.iter().all(|o| *o == -1.0));
        assert!(engine.is_active());

        // the grain continues with its old sound buffer
        storage.set_valid("win", true).unwrap();
        let rendered = render(&mut engine, None, 100);
        assert!(rendered.main.iter().all(|s| *s == 1.0));
        assert_eq!(rendered.sample_count[0], 100.0);
        assert!(engine.is_active());

        // and the staged buffer applies with the next grain
        render(&mut engine, None, 5000);
        assert!(!engine.is_active());
        handle.trigger().unwrap();
        let rendered = render(&mut engine, None, 100);
        assert!(rendered.main.iter().all(|s| *s == 0.5));
    }

    #[test]
    fn pulse_retriggers_do_not_affect_sounding_grains() {
        let storage = BufferStorage::new();
        storage.insert("snd", ramp(44100, 44100)).unwrap();
        storage.insert("win", constant(1.0, 4410, 44100)).unwrap();
        let (mut engine, handle) =
            GrainEngine::new(GrainEngineOptions::pulse_grains(), storage).unwrap();
        handle.set_sound_buffer("snd").unwrap();
        handle.set_window_buffer("win").unwrap();
        engine.prepare(44100, SignalConnections::none()).unwrap();

        // pulse at 10 starts the grain, later pulses are ignored
        let trigger = pulses(3000, &[10, 500, 501, 1500]);
        let rendered = render(&mut engine, Some(&trigger), 3000);
        assert_eq!(rendered.sample_count[9], -1.0);
        for (tick, frame) in (10..10 + 2205).enumerate() {
            assert_eq!(rendered.sample_count[frame], tick as f32);
            assert_eq!(rendered.main[frame], tick as f32);
        }
        assert_eq!(rendered.sample_count[10 + 2205], -1.0);
        assert_eq!(grain_frames(&rendered), 2205);
    }

    #[test]
    fn overflow_mirrors_the_trigger_after_a_pulse_ended() {
        let (mut engine, _handle, _storage) = windowed_engine(GrainEngineOptions::pulse_grains());
        let mut trigger = vec![0.0; 3000];
        trigger[10..20].fill(1.0);
        trigger[100..110].fill(1.0);
        let rendered = render(&mut engine, Some(&trigger), 3000);
        // the starting pulse is still high
        assert!(rendered.overflow[10..20].iter().all(|o| *o == 0.0));
        // falling edge at 20 latches
        assert!(rendered.overflow[20..100].iter().all(|o| *o == 0.0));
        assert!(rendered.overflow[100..110].iter().all(|o| *o == 1.0));
        assert!(rendered.overflow[110..10 + 2205].iter().all(|o| *o == 0.0));
        // idle frames report 0
        assert!(rendered.overflow[10 + 2205..].iter().all(|o| *o == 0.0));

        // a new grain clears the latch
        let mut trigger = vec![0.0; 600];
        trigger[10..20].fill(1.0);
        let rendered = render(&mut engine, Some(&trigger), 20);
        assert!(rendered.overflow.iter().all(|o| *o == 0.0));
    }

    #[test]
    fn invalid_lengths_are_rejected() {
        let (mut engine, handle, _storage) = windowed_engine(GrainEngineOptions::bang_grains());
        assert!(matches!(
            handle.set_length(0.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            handle.set_length(-10.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            handle.set_length(f64::NAN),
            Err(Error::InvalidParameter(_))
        ));
        handle.trigger().unwrap();
        let rendered = render(&mut engine, None, 5000);
        assert_eq!(grain_frames(&rendered), 2205);

        handle.set_length(25.0).unwrap();
        handle.trigger().unwrap();
        let rendered = render(&mut engine, None, 5000);
        assert_eq!(grain_frames(&rendered), 1103);
    }

    #[test]
    fn rebinding_applies_with_the_next_grain() {
        let (mut engine, handle, storage) = windowed_engine(GrainEngineOptions::bang_grains());
        storage.insert("snd2", constant(0.5, 1000, 44100)).unwrap();
        handle.trigger().unwrap();
        let rendered = render(&mut engine, None, 1000);
        assert!(rendered.main.iter().all(|s| *s == 1.0));

        handle.set_sound_buffer("snd2").unwrap();
        let rendered = render(&mut engine, None, 2000);
        assert!(rendered.main[..1205].iter().all(|s| *s == 1.0));
        assert!(rendered.main[1205..].iter().all(|s| *s == 0.0));

        handle.trigger().unwrap();
        let rendered = render(&mut engine, None, 100);
        assert!(rendered.main.iter().all(|s| *s == 0.5));
    }

    #[test]
    fn failed_bindings_keep_the_current_buffer() {
        let (mut engine, handle, storage) = windowed_engine(GrainEngineOptions::bang_grains());
        storage.insert("snd2", constant(0.5, 1000, 44100)).unwrap();
        storage
            .insert("stereo", SampleData::new(vec![0.0; 20], 2, 44100).unwrap())
            .unwrap();

        handle.set_sound_buffer("snd2").unwrap();
        assert!(matches!(
            handle.set_sound_buffer("stereo"),
            Err(Error::UnsupportedChannelCount { .. })
        ));
        assert!(matches!(
            handle.set_sound_buffer("missing"),
            Err(Error::InvalidBufferReference(_))
        ));
        // the staged buffer got cleared too
        handle.trigger().unwrap();
        let rendered = render(&mut engine, None, 100);
        assert!(rendered.main.iter().all(|s| *s == 1.0));
    }

    #[test]
    fn reverse_grains_wrap_below_zero() {
        let storage = BufferStorage::new();
        storage.insert("snd", ramp(1000, 1000)).unwrap();
        storage.insert("win", constant(1.0, 10, 1000)).unwrap();
        let (mut engine, handle) =
            GrainEngine::new(GrainEngineOptions::bang_grains(), storage).unwrap();
        handle.set_sound_buffer("snd").unwrap();
        handle.set_window_buffer("win").unwrap();
        handle.set_direction(GrainDirection::Reverse).unwrap();
        handle.set_sound_interpolation(false).unwrap();
        handle.set_start(-21.0).unwrap();
        handle.set_length(10.0).unwrap();
        handle.set_pitch(3.0).unwrap();
        engine.prepare(1000, SignalConnections::none()).unwrap();

        handle.trigger().unwrap();
        let rendered = render(&mut engine, None, 12);
        assert_eq!(
            rendered.main,
            vec![9.0, 6.0, 3.0, 0.0, 997.0, 994.0, 991.0, 988.0, 985.0, 982.0, 0.0, 0.0]
        );
    }

    #[test]
    fn audio_rate_parameters() {
        let (mut engine, handle, _storage) = windowed_engine(GrainEngineOptions::pulse_grains());
        engine
            .prepare(44100, SignalConnections::none().length(true).gain(true))
            .unwrap();
        handle.set_gain(0.25).unwrap();

        let trigger = pulses(4000, &[0, 2000]);
        let length = vec![10.0; 4000];
        let mut gain = vec![0.5; 4000];
        gain[2000..].fill(f32::NAN);

        let mut main = vec![0.0; 4000];
        let mut sample_count = vec![0.0; 4000];
        let inputs = SignalInputs::none()
            .trigger(&trigger)
            .length(&length)
            .gain(&gain);
        let mut outputs = SignalOutputs::new(&mut main).sample_count(&mut sample_count);
        engine.process(&inputs, &mut outputs);

        // 10ms grains: 441 ticks
        assert_eq!(sample_count.iter().filter(|c| **c >= 0.0).count(), 441 * 2);
        assert!(main[..441].iter().all(|s| *s == 0.5));
        // invalid signal values fall back to the control value
        assert!(main[2000..2441].iter().all(|s| *s == 0.25));
    }

    #[test]
    fn segments() {
        let storage = BufferStorage::new();
        storage
            .insert(
                "stereo",
                SampleData::from_fn(100, 2, 1000, |frame, channel| {
                    if channel == 0 {
                        frame as f32
                    } else {
                        -(frame as f32)
                    }
                })
                .unwrap(),
            )
            .unwrap();
        storage.insert("mono", ramp(100, 1000)).unwrap();
        let (mut engine, handle) =
            GrainEngine::new(GrainEngineOptions::pulse_segments(), storage).unwrap();
        handle.set_sound_buffer("stereo").unwrap();
        handle.set_start(10.0).unwrap();
        handle.set_end(14.0).unwrap();
        handle.set_gain(2.0).unwrap();
        engine.prepare(1000, SignalConnections::none()).unwrap();

        let trigger = pulses(10, &[1]);
        let rendered = render(&mut engine, Some(&trigger), 10);
        assert_eq!(
            rendered.main,
            vec![0.0, 20.0, 22.0, 24.0, 26.0, 28.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(
            rendered.right,
            vec![0.0, -20.0, -22.0, -24.0, -26.0, -28.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(
            rendered.sample_count,
            vec![-1.0, 0.0, 1.0, 2.0, 3.0, 4.0, -1.0, -1.0, -1.0, -1.0]
        );

        // mono segments play on both channels
        handle.set_sound_buffer("mono").unwrap();
        handle.set_gain(1.0).unwrap();
        handle.set_end(-1.0).unwrap();
        handle.set_start(98.0).unwrap();
        let rendered = render(&mut engine, Some(&trigger), 10);
        assert_eq!(
            rendered.main,
            vec![0.0, 98.0, 99.0, 99.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(rendered.main, rendered.right);
    }

    #[test]
    fn segments_retrigger_on_the_tick_after_their_end() {
        let storage = BufferStorage::new();
        storage.insert("mono", ramp(100, 1000)).unwrap();
        let (mut engine, handle) =
            GrainEngine::new(GrainEngineOptions::pulse_segments(), storage).unwrap();
        handle.set_sound_buffer("mono").unwrap();
        handle.set_start(10.0).unwrap();
        handle.set_end(14.0).unwrap();
        engine.prepare(1000, SignalConnections::none()).unwrap();

        let trigger = pulses(12, &[1, 6]);
        let rendered = render(&mut engine, Some(&trigger), 12);
        assert_eq!(
            rendered.sample_count,
            vec![-1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 0.0, 1.0, 2.0, 3.0, 4.0, -1.0]
        );
        assert_eq!(
            rendered.main,
            vec![0.0, 10.0, 11.0, 12.0, 13.0, 14.0, 10.0, 11.0, 12.0, 13.0, 14.0, 0.0]
        );
        assert!(rendered.overflow.iter().all(|o| *o == 0.0));
    }

    #[test]
    fn bang_overflow_events() {
        let (mut engine, handle, _storage) = windowed_engine(GrainEngineOptions::bang_grains());
        handle.trigger().unwrap();
        handle.trigger().unwrap();
        render(&mut engine, None, 100);
        assert_eq!(handle.try_recv_event(), Some(GrainEvent::Overflow));
        assert_eq!(handle.try_recv_event(), None);

        handle.trigger().unwrap();
        render(&mut engine, None, 100);
        assert_eq!(handle.events().collect::<Vec<_>>(), vec![GrainEvent::Overflow]);

        // once the grain finished, bangs start new grains
        render(&mut engine, None, 2205);
        handle.trigger().unwrap();
        render(&mut engine, None, 100);
        assert_eq!(handle.try_recv_event(), None);
        assert!(engine.is_active());
    }

    #[test]
    fn grain_reports() {
        let (mut engine, handle, _storage) = windowed_engine(GrainEngineOptions::pulse_grains());
        handle.set_start(100.0).unwrap();
        handle.set_pitch(0.5).unwrap();
        handle
            .set_parameter(GrainEngine::LENGTH.id(), ParameterValueUpdate::raw(20.0f32))
            .unwrap();
        let trigger = pulses(2000, &[0, 1000]);
        render(&mut engine, Some(&trigger), 2000);
        let started = GrainEvent::Started {
            start: 100.0,
            length: 20.0,
            pitch: 0.5,
        };
        assert_eq!(handle.events().collect::<Vec<_>>(), vec![started, started]);
    }

    #[test]
    fn buffers_are_in_use_while_rendering_only() {
        let (mut engine, handle, storage) = windowed_engine(GrainEngineOptions::bang_grains());
        handle.trigger().unwrap();
        render(&mut engine, None, 100);
        assert!(!storage.is_in_use("snd"));
        assert!(!storage.is_in_use("win"));
        // reloads are possible between blocks
        storage.insert("snd", constant(0.5, 44100, 44100)).unwrap();
        let rendered = render(&mut engine, None, 100);
        assert!(rendered.main.iter().all(|s| *s == 0.5));
    }

    #[test]
    fn unprepared_engines_render_silence() {
        let storage = BufferStorage::new();
        let (mut engine, _handle) =
            GrainEngine::new(GrainEngineOptions::bang_grains(), storage).unwrap();
        assert_eq!(engine.output_sample_rate(), 0);
        let rendered = render(&mut engine, None, 64);
        assert!(rendered.main.iter().all(|s| *s == 0.0));
        assert!(rendered.overflow.iter().all(|o| *o == -1.0));
        assert!(engine.prepare(0, SignalConnections::none()).is_err());
    }
}
