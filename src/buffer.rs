//! Named sample buffers which grain engines read from, and the storage that owns them.

use std::{
    ops::Deref,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use basedrop::{Handle, Shared, SharedCell};

use crate::Error;

// -------------------------------------------------------------------------------------------------

mod storage;
pub use storage::BufferStorage;

// -------------------------------------------------------------------------------------------------

/// Immutable, interleaved sample frames of a [`SampleBuffer`].
pub struct SampleData {
    samples: Box<[f32]>,
    channel_count: usize,
    frame_count: usize,
    sample_rate: u32,
}

impl SampleData {
    /// Create new sample data from interleaved samples with the given layout.
    ///
    /// Sample data must not be empty and `samples` must contain whole frames only.
    pub fn new(samples: Vec<f32>, channel_count: usize, sample_rate: u32) -> Result<Self, Error> {
        if channel_count == 0 {
            return Err(Error::ParameterError(
                "Sample data needs at least one channel".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(Error::ParameterError(
                "Sample data needs a valid sample rate".to_string(),
            ));
        }
        if samples.is_empty() || samples.len() % channel_count != 0 {
            return Err(Error::ParameterError(format!(
                "Sample data with {} samples is empty or has incomplete {} channel frames",
                samples.len(),
                channel_count
            )));
        }
        let frame_count = samples.len() / channel_count;
        Ok(Self {
            samples: samples.into_boxed_slice(),
            channel_count,
            frame_count,
            sample_rate,
        })
    }

    /// Create new single channel sample data.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, Error> {
        Self::new(samples, 1, sample_rate)
    }

    /// Create new sample data by evaluating `generator(frame, channel)` for every sample.
    pub fn from_fn<F: FnMut(usize, usize) -> f32>(
        frame_count: usize,
        channel_count: usize,
        sample_rate: u32,
        mut generator: F,
    ) -> Result<Self, Error> {
        let mut samples = Vec::with_capacity(frame_count * channel_count);
        for frame in 0..frame_count {
            for channel in 0..channel_count {
                samples.push(generator(frame, channel));
            }
        }
        Self::new(samples, channel_count, sample_rate)
    }

    /// Interleaved samples.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// The buffer's native sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per millisecond.
    #[inline]
    pub fn milli_sample_rate(&self) -> f64 {
        self.sample_rate as f64 * 0.001
    }
}

// -------------------------------------------------------------------------------------------------

/// A named handle to sample data, owned by a [`BufferStorage`].
///
/// Engines keep handles to the buffers they read from. A handle can outlive its storage entry:
/// removed buffers get invalidated and engines render silence until a valid buffer is bound.
/// The sample data behind a handle may get reloaded in place by the storage.
///
/// The in-use counter is advisory only: engines increment it while they read from the buffer in
/// an audio block, so the storage can defer destructive reloads. It never blocks readers.
pub struct SampleBuffer {
    name: String,
    data: SharedCell<SampleData>,
    valid: AtomicBool,
    removed: AtomicBool,
    in_use: AtomicUsize,
}

impl SampleBuffer {
    pub(crate) fn new(handle: &Handle, name: &str, data: SampleData) -> Shared<Self> {
        Shared::new(
            handle,
            Self {
                name: name.to_string(),
                data: SharedCell::new(Shared::new(handle, data)),
                valid: AtomicBool::new(true),
                removed: AtomicBool::new(false),
                in_use: AtomicUsize::new(0),
            },
        )
    }

    /// The buffer's name in its storage.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns false when the buffer got removed from its storage or was marked as invalid.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub(crate) fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::Release);
    }

    /// Returns true when the buffer got removed from its storage. Removed buffers never become
    /// valid again, while buffers which only got marked as invalid may.
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_removed(&self) {
        self.valid.store(false, Ordering::Release);
        self.removed.store(true, Ordering::Release);
    }

    /// Returns true while an engine is reading from the buffer.
    pub fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire) > 0
    }

    /// Channel count of the buffer's current sample data.
    pub fn channel_count(&self) -> usize {
        self.data.get().channel_count()
    }

    /// Frame count of the buffer's current sample data.
    pub fn frame_count(&self) -> usize {
        self.data.get().frame_count()
    }

    /// Sample rate of the buffer's current sample data.
    pub fn sample_rate(&self) -> u32 {
        self.data.get().sample_rate()
    }

    pub(crate) fn reload(&self, handle: &Handle, data: SampleData) {
        self.data.set(Shared::new(handle, data));
    }

    /// Access the buffer's samples for reading and mark the buffer as in use until the returned
    /// guard is dropped. Returns `None` when the buffer currently is invalid.
    ///
    /// Does not block or allocate, so this may be called in real-time threads.
    pub fn read(this: &Shared<Self>) -> Option<SampleReadGuard> {
        if !this.is_valid() {
            return None;
        }
        this.in_use.fetch_add(1, Ordering::AcqRel);
        let data = this.data.get();
        Some(SampleReadGuard {
            buffer: Shared::clone(this),
            data,
        })
    }
}

// -------------------------------------------------------------------------------------------------

/// Read access to a [`SampleBuffer`]'s sample data. See [`SampleBuffer::read`].
pub struct SampleReadGuard {
    buffer: Shared<SampleBuffer>,
    data: Shared<SampleData>,
}

impl SampleReadGuard {
    /// The buffer this guard reads from.
    pub fn buffer(&self) -> &Shared<SampleBuffer> {
        &self.buffer
    }
}

impl Deref for SampleReadGuard {
    type Target = SampleData;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl Drop for SampleReadGuard {
    fn drop(&mut self) {
        self.buffer.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use basedrop::Collector;

    #[test]
    fn sample_data_layout() {
        let data = SampleData::new(vec![0.0, 1.0, 2.0, 3.0], 2, 48000).unwrap();
        assert_eq!(data.frame_count(), 2);
        assert_eq!(data.channel_count(), 2);
        assert_eq!(data.milli_sample_rate(), 48.0);

        let data = SampleData::from_fn(3, 2, 44100, |frame, channel| (frame * 10 + channel) as f32)
            .unwrap();
        assert_eq!(data.samples(), &[0.0, 1.0, 10.0, 11.0, 20.0, 21.0]);

        assert!(SampleData::mono(vec![], 44100).is_err());
        assert!(SampleData::new(vec![0.0; 3], 2, 44100).is_err());
        assert!(SampleData::new(vec![0.0; 4], 0, 44100).is_err());
        assert!(SampleData::mono(vec![0.0; 4], 0).is_err());
    }

    #[test]
    fn read_guards_mark_buffers_in_use() {
        let mut collector = Collector::new();
        let buffer = SampleBuffer::new(
            &collector.handle(),
            "snd",
            SampleData::mono(vec![1.0; 8], 44100).unwrap(),
        );
        assert!(!buffer.is_in_use());
        {
            let guard1 = SampleBuffer::read(&buffer).unwrap();
            let guard2 = SampleBuffer::read(&buffer).unwrap();
            assert_eq!(guard1.frame_count(), 8);
            assert_eq!(guard2.buffer().name(), "snd");
            assert!(buffer.is_in_use());
            drop(guard1);
            assert!(buffer.is_in_use());
        }
        assert!(!buffer.is_in_use());

        buffer.set_valid(false);
        assert!(SampleBuffer::read(&buffer).is_none());
        assert!(!buffer.is_in_use());
        assert!(!buffer.is_removed());

        buffer.mark_removed();
        assert!(buffer.is_removed());
        assert!(!buffer.is_valid());

        drop(buffer);
        collector.collect();
    }

    #[test]
    fn reloads_keep_readers_on_their_data() {
        let collector = Collector::new();
        let buffer = SampleBuffer::new(
            &collector.handle(),
            "snd",
            SampleData::mono(vec![1.0; 8], 44100).unwrap(),
        );
        let guard = SampleBuffer::read(&buffer).unwrap();
        buffer.reload(
            &collector.handle(),
            SampleData::new(vec![0.5; 4], 2, 22050).unwrap(),
        );
        // the guard still reads the data it acquired
        assert_eq!(guard.frame_count(), 8);
        assert_eq!(guard.samples()[0], 1.0);
        drop(guard);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.frame_count(), 2);
    }
}
