use std::sync::{Arc, Mutex};

use basedrop::{Collector, Handle, Shared};
use dashmap::{mapref::entry::Entry, DashMap};

use super::{SampleBuffer, SampleData};
use crate::Error;

// -------------------------------------------------------------------------------------------------

struct BufferStorageInner {
    buffers: DashMap<String, Shared<SampleBuffer>>,
    collector: Mutex<Collector>,
    handle: Handle,
}

// -------------------------------------------------------------------------------------------------

/// A registry of named [`SampleBuffer`]s which engines resolve their sound and window buffers from.
///
/// Cloning the storage is cheap: all clones share the same buffers. All functions are meant to
/// be called from control threads and never from real-time threads.
///
/// Buffer memory, which got released by real-time threads, is reclaimed in
/// [`collect_garbage`](Self::collect_garbage). The storage calls it on every insert and remove,
/// but hosts which rarely modify buffers should also call it from time to time.
#[derive(Clone)]
pub struct BufferStorage {
    inner: Arc<BufferStorageInner>,
}

impl Default for BufferStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferStorage {
    /// Create a new, empty buffer storage.
    pub fn new() -> Self {
        let collector = Collector::new();
        let handle = collector.handle();
        Self {
            inner: Arc::new(BufferStorageInner {
                buffers: DashMap::new(),
                collector: Mutex::new(collector),
                handle,
            }),
        }
    }

    /// Add a new buffer with the given name, or reload an existing buffer's samples in place.
    ///
    /// Engines which reference an existing buffer will read the new samples with their next
    /// audio block. Reloading is refused with [`Error::BufferInUse`] while some engine is
    /// reading from the buffer: try again later in this case.
    pub fn insert(&self, name: &str, data: SampleData) -> Result<(), Error> {
        self.collect_garbage();
        match self.inner.buffers.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let buffer = entry.get();
                if buffer.is_in_use() {
                    log::warn!("Buffer '{name}' is in use. Refusing to reload it...");
                    return Err(Error::BufferInUse(name.to_string()));
                }
                log::debug!(
                    "Reloading buffer '{name}' with {} frames, {} channels",
                    data.frame_count(),
                    data.channel_count()
                );
                buffer.reload(&self.inner.handle, data);
                buffer.set_valid(true);
            }
            Entry::Vacant(entry) => {
                log::debug!(
                    "Adding buffer '{name}' with {} frames, {} channels",
                    data.frame_count(),
                    data.channel_count()
                );
                entry.insert(SampleBuffer::new(&self.inner.handle, name, data));
            }
        }
        Ok(())
    }

    /// Remove a buffer from the storage. Engines which still reference the buffer will render
    /// silence until a new buffer is bound. Returns false if no such buffer exists.
    pub fn remove(&self, name: &str) -> bool {
        let removed = match self.inner.buffers.remove(name) {
            Some((_, buffer)) => {
                log::debug!("Removing buffer '{name}'");
                buffer.mark_removed();
                true
            }
            None => false,
        };
        self.collect_garbage();
        removed
    }

    /// Mark a buffer as temporarily (un)available for engines, e.g. while its samples are
    /// being edited elsewhere.
    pub fn set_valid(&self, name: &str, valid: bool) -> Result<(), Error> {
        let buffer = self
            .inner
            .buffers
            .get(name)
            .ok_or_else(|| Error::InvalidBufferReference(name.to_string()))?;
        buffer.set_valid(valid);
        Ok(())
    }

    /// Returns true if the buffer exists and some engine currently reads from it.
    pub fn is_in_use(&self, name: &str) -> bool {
        self.inner
            .buffers
            .get(name)
            .is_some_and(|buffer| buffer.is_in_use())
    }

    /// Returns true if a buffer with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.buffers.contains_key(name)
    }

    /// Resolve a buffer handle by name.
    pub fn get(&self, name: &str) -> Option<Shared<SampleBuffer>> {
        self.inner
            .buffers
            .get(name)
            .map(|buffer| Shared::clone(buffer.value()))
    }

    /// Free buffer memory which got released by engines.
    pub fn collect_garbage(&self) {
        match self.inner.collector.lock() {
            Ok(mut collector) => collector.collect(),
            Err(err) => log::error!("Failed to lock buffer garbage collector: {err}"),
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(value: f32, frames: usize) -> SampleData {
        SampleData::mono(vec![value; frames], 44100).unwrap()
    }

    #[test]
    fn insert_resolve_remove() {
        let storage = BufferStorage::new();
        assert!(storage.get("snd").is_none());

        storage.insert("snd", mono(1.0, 16)).unwrap();
        assert!(storage.contains("snd"));
        let buffer = storage.get("snd").unwrap();
        assert_eq!(buffer.name(), "snd");
        assert_eq!(buffer.frame_count(), 16);
        assert!(buffer.is_valid());

        // reloads are visible through existing handles
        storage.insert("snd", mono(0.5, 8)).unwrap();
        assert_eq!(buffer.frame_count(), 8);

        assert!(storage.remove("snd"));
        assert!(!storage.remove("snd"));
        assert!(!storage.contains("snd"));
        // dangling handles get invalidated
        assert!(!buffer.is_valid());
        assert!(buffer.is_removed());
        assert!(SampleBuffer::read(&buffer).is_none());
    }

    #[test]
    fn validity() {
        let storage = BufferStorage::new();
        storage.insert("win", mono(1.0, 4)).unwrap();
        let buffer = storage.get("win").unwrap();
        storage.set_valid("win", false).unwrap();
        assert!(!buffer.is_valid());
        storage.set_valid("win", true).unwrap();
        assert!(buffer.is_valid());
        assert!(matches!(
            storage.set_valid("nope", false),
            Err(Error::InvalidBufferReference(_))
        ));
    }

    #[test]
    fn reloads_are_deferred_while_in_use() {
        let storage = BufferStorage::new();
        storage.insert("snd", mono(1.0, 16)).unwrap();
        let buffer = storage.get("snd").unwrap();

        let guard = SampleBuffer::read(&buffer).unwrap();
        assert!(storage.is_in_use("snd"));
        assert!(matches!(
            storage.insert("snd", mono(0.0, 16)),
            Err(Error::BufferInUse(_))
        ));
        assert_eq!(guard.samples()[0], 1.0);
        drop(guard);

        assert!(!storage.is_in_use("snd"));
        storage.insert("snd", mono(0.0, 16)).unwrap();
        assert_eq!(SampleBuffer::read(&buffer).unwrap().samples()[0], 0.0);
    }
}
