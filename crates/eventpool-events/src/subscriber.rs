//! Subscriber handles, filters and claimed events.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::manager::Shared;
use crate::slot::{AuxHandle, EventHandle, SlotRef};

/// Type/subtype filter of a subscriber.
///
/// An event whose type equals `event_type` matches when `subtype` is `0` or
/// equal to the event's subtype. Any other event matches only when
/// `event_type` is `0`, so a zero type filter accepts every event of another
/// type whatever its subtype. Type-`0` events go through the subtype check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventFilter {
    /// Type to match, or `0` for any.
    #[serde(rename = "type")]
    pub event_type: u8,
    /// Subtype to match within `event_type`, or `0` for any.
    pub subtype: u8,
}

impl EventFilter {
    /// Build a filter from raw tags.
    #[must_use]
    pub fn new(event_type: u8, subtype: u8) -> Self {
        Self {
            event_type,
            subtype,
        }
    }

    /// Match every event.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Match every event of one type.
    #[must_use]
    pub fn of_type(event_type: u8) -> Self {
        Self::new(event_type, 0)
    }

    /// Check an event's tags against this filter.
    #[must_use]
    pub fn matches(&self, event_type: u8, subtype: u8) -> bool {
        if self.event_type == event_type {
            self.subtype == 0 || self.subtype == subtype
        } else {
            self.event_type == 0
        }
    }
}

/// Registration handle for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Diagnostic view of a registered subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberInfo {
    /// Registration id.
    pub id: SubscriberId,
    /// Label given at subscribe time.
    pub name: String,
    /// Filter the subscriber registered with.
    pub filter: EventFilter,
    /// References waiting in the private queue.
    pub queued: usize,
    /// Whether an event is currently claimed.
    pub claimed: bool,
}

/// Registry entry, only touched under the manager lock.
pub(crate) struct Registration {
    pub(crate) id: SubscriberId,
    pub(crate) name: String,
    pub(crate) filter: EventFilter,
    pub(crate) queue: VecDeque<SlotRef>,
    pub(crate) current: Option<SlotRef>,
}

impl Registration {
    pub(crate) fn new(id: SubscriberId, name: String, filter: EventFilter) -> Self {
        Self {
            id,
            name,
            filter,
            queue: VecDeque::new(),
            current: None,
        }
    }

    pub(crate) fn info(&self) -> SubscriberInfo {
        SubscriberInfo {
            id: self.id,
            name: self.name.clone(),
            filter: self.filter,
            queued: self.queue.len(),
            claimed: self.current.is_some(),
        }
    }
}

/// An event claimed by a subscriber.
///
/// While the claim is held the payload lives here, not in the pool, so the
/// claimant has exclusive access without holding the manager lock. The
/// payload goes back into the slot on [`Subscriber::done`], which is also how
/// a subscriber hands a result back to a waiting request.
pub struct ClaimedEvent<P> {
    handle: EventHandle,
    event_type: u8,
    subtype: u8,
    payload: Option<P>,
    aux: Option<AuxHandle>,
}

impl<P> ClaimedEvent<P> {
    pub(crate) fn new(
        handle: EventHandle,
        event_type: u8,
        subtype: u8,
        payload: Option<P>,
        aux: Option<AuxHandle>,
    ) -> Self {
        Self {
            handle,
            event_type,
            subtype,
            payload,
            aux,
        }
    }

    /// Handle of the claimed activation.
    #[must_use]
    pub fn handle(&self) -> EventHandle {
        self.handle
    }

    /// Event type tag.
    #[must_use]
    pub fn event_type(&self) -> u8 {
        self.event_type
    }

    /// Event subtype tag.
    #[must_use]
    pub fn subtype(&self) -> u8 {
        self.subtype
    }

    /// Whether the producer is waiting on this event.
    #[must_use]
    pub fn is_request(&self) -> bool {
        self.handle.is_request()
    }

    /// Borrow the payload.
    #[must_use]
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    /// Mutably borrow the payload.
    pub fn payload_mut(&mut self) -> Option<&mut P> {
        self.payload.as_mut()
    }

    /// Replace the payload, returning the previous one.
    pub fn set_payload(&mut self, payload: P) -> Option<P> {
        self.payload.replace(payload)
    }

    /// Take the payload out, leaving the event without one.
    pub fn take_payload(&mut self) -> Option<P> {
        self.payload.take()
    }

    /// Downcast the auxiliary handle attached by the producer.
    #[must_use]
    pub fn aux<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.aux.as_deref().and_then(|a| a.downcast_ref::<T>())
    }

    /// The raw auxiliary handle, if one was attached.
    #[must_use]
    pub fn aux_handle(&self) -> Option<&AuxHandle> {
        self.aux.as_ref()
    }

    pub(crate) fn into_payload(self) -> Option<P> {
        self.payload
    }
}

impl<P> fmt::Debug for ClaimedEvent<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimedEvent")
            .field("handle", &self.handle)
            .field("event_type", &self.event_type)
            .field("subtype", &self.subtype)
            .field("has_payload", &self.payload.is_some())
            .finish_non_exhaustive()
    }
}

/// A registered consumer.
///
/// Created by [`EventManager::subscribe`](crate::EventManager::subscribe).
/// Dropping the handle unsubscribes it: any claimed or queued events are
/// resolved so no activation waits on a subscriber that is gone.
pub struct Subscriber<P: Send + 'static> {
    id: SubscriberId,
    name: String,
    filter: EventFilter,
    shared: Arc<Shared<P>>,
    current: Option<ClaimedEvent<P>>,
    detached: bool,
}

impl<P: Send + 'static> Subscriber<P> {
    pub(crate) fn new(
        id: SubscriberId,
        name: String,
        filter: EventFilter,
        shared: Arc<Shared<P>>,
    ) -> Self {
        Self {
            id,
            name,
            filter,
            shared,
            current: None,
            detached: false,
        }
    }

    /// Registration id.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Label given at subscribe time.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filter this subscriber registered with.
    #[must_use]
    pub fn filter(&self) -> EventFilter {
        self.filter
    }

    /// Claim the next event, or return the one already claimed.
    ///
    /// Returns `None` when the queue is empty or every queued event is
    /// currently held by another subscriber.
    pub fn next(&mut self) -> Option<&mut ClaimedEvent<P>> {
        if self.current.is_none() {
            self.current = self.shared.claim_next(self.id);
        }
        self.current.as_mut()
    }

    /// The event currently claimed, if any.
    #[must_use]
    pub fn current(&self) -> Option<&ClaimedEvent<P>> {
        self.current.as_ref()
    }

    /// Finish the claimed event. Does nothing when nothing is claimed.
    pub fn done(&mut self) {
        if let Some(claim) = self.current.take() {
            self.shared.complete(self.id, claim);
        }
    }

    /// Number of events waiting in this subscriber's queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.queued(self.id)
    }

    pub(crate) fn belongs_to(&self, shared: &Arc<Shared<P>>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }

    /// Remove the registration. Returns `false` if it was already gone.
    pub(crate) fn detach(&mut self) -> bool {
        if self.detached {
            return false;
        }
        self.detached = true;
        self.shared.detach(self.id, self.current.take())
    }
}

impl<P: Send + 'static> Drop for Subscriber<P> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<P: Send + 'static> fmt::Debug for Subscriber<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("filter", &self.filter)
            .field("claimed", &self.current.is_some())
            .finish_non_exhaustive()
    }
}
