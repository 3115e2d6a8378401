/// Notifications from a rendering [`GrainEngine`](crate::GrainEngine), received via
/// [`GrainEngineHandle::try_recv_event`](crate::GrainEngineHandle::try_recv_event).
///
/// Events are sent without blocking the audio thread: when the event queue is full, new events
/// get dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrainEvent {
    /// A new grain started with the given resolved settings.
    Started {
        /// Start position in ms.
        start: f64,
        /// Grain length in ms. For segments, the segment's duration at its native speed.
        length: f64,
        /// Pitch multiplier, or the sample increment of segments.
        pitch: f64,
    },
    /// A bang got triggered while a grain was pending or sounding, and thus was ignored.
    Overflow,
}
