//! Event dispatcher error types.

use thiserror::Error;

/// Errors returned by the request side of the dispatcher.
///
/// Pool exhaustion on [`EventManager::add_event`](crate::EventManager::add_event)
/// and an empty [`Subscriber::next`](crate::Subscriber::next) are not errors;
/// both are reported as `None`.
#[derive(Debug, Error)]
pub enum EventError {
    /// The handle refers to an event that was not raised as a request.
    #[error("event in slot {index} is not a request")]
    NotARequest {
        /// Slot index of the offending handle.
        index: usize,
    },

    /// The slot has moved on to another activation since the handle was issued.
    #[error("handle for slot {index} is stale (generation {generation})")]
    StaleHandle {
        /// Slot index of the handle.
        index: usize,
        /// Generation the handle was issued for.
        generation: u64,
    },

    /// Subscribers have not finished with the request yet.
    #[error("request in slot {index} is still being processed")]
    NotReady {
        /// Slot index of the request.
        index: usize,
    },

    /// The wait deadline elapsed before all subscribers finished.
    #[error("timed out waiting for request in slot {index}")]
    Timeout {
        /// Slot index of the request.
        index: usize,
    },

    /// The wait was cancelled by the caller.
    #[error("wait for request in slot {index} was cancelled")]
    Cancelled {
        /// Slot index of the request.
        index: usize,
    },

    /// No free slot was available for a new request.
    #[error("event pool exhausted (capacity {capacity})")]
    PoolExhausted {
        /// Pool capacity.
        capacity: usize,
    },

    /// Diagnostic serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for dispatcher operations.
pub type EventResult<T> = Result<T, EventError>;
