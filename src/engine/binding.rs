use basedrop::Shared;

use crate::buffer::SampleBuffer;

// -------------------------------------------------------------------------------------------------

/// Current and staged buffer of a single engine buffer slot.
///
/// The first bound buffer becomes current immediately. Later bindings get staged and only
/// replace the current buffer when the next grain starts, so a sounding grain never has its
/// buffer swapped.
#[derive(Default)]
pub(crate) struct BufferBinding {
    current: Option<Shared<SampleBuffer>>,
    next: Option<Shared<SampleBuffer>>,
}

impl BufferBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffer grains currently read from.
    #[inline]
    pub fn current(&self) -> Option<&Shared<SampleBuffer>> {
        self.current.as_ref()
    }

    /// True when a buffer is staged for the next grain.
    #[cfg(test)]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Bind as current buffer when none is set yet, else stage it for the next grain.
    pub fn bind(&mut self, buffer: Shared<SampleBuffer>) {
        if self.current.is_none() {
            self.current = Some(buffer);
        } else {
            self.next = Some(buffer);
        }
    }

    /// Forget a staged buffer, keeping the current one.
    pub fn clear_next(&mut self) {
        self.next = None;
    }

    /// Replace the current buffer with the staged one, if any.
    /// Returns true if the current buffer changed.
    pub fn promote(&mut self) -> bool {
        if let Some(next) = self.next.take() {
            self.current = Some(next);
            true
        } else {
            false
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{buffer::SampleData, BufferStorage};

    #[test]
    fn staging() {
        let storage = BufferStorage::new();
        storage
            .insert("a", SampleData::mono(vec![0.0; 4], 44100).unwrap())
            .unwrap();
        storage
            .insert("b", SampleData::mono(vec![0.0; 4], 44100).unwrap())
            .unwrap();

        let mut binding = BufferBinding::new();
        assert!(binding.current().is_none());
        assert!(!binding.promote());

        binding.bind(storage.get("a").unwrap());
        assert_eq!(binding.current().unwrap().name(), "a");
        assert!(!binding.has_next());

        binding.bind(storage.get("b").unwrap());
        assert_eq!(binding.current().unwrap().name(), "a");
        assert!(binding.has_next());

        binding.clear_next();
        assert!(!binding.promote());
        assert_eq!(binding.current().unwrap().name(), "a");

        binding.bind(storage.get("b").unwrap());
        assert!(binding.promote());
        assert_eq!(binding.current().unwrap().name(), "b");
        assert!(!binding.has_next());
    }
}
