//! Event slots and their per-activation state machine.
//!
//! A slot is reinitialized in place every time the pool hands it out. The
//! mutation API here is crate-private and is only ever driven from inside the
//! manager's critical section; callers outside the crate see slots through
//! [`EventHandle`] and [`SlotSnapshot`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque caller context threaded through to subscribers.
///
/// The dispatcher holds a clone of the handle for the lifetime of an
/// activation and never looks inside it.
pub type AuxHandle = Arc<dyn Any + Send + Sync>;

/// Phase of an event within one activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Ready for the next subscriber to claim.
    WaitInvoke,
    /// Claimed by exactly one subscriber.
    InWork,
    /// Every subscriber finished; the requesting producer has not finalized yet.
    RequestWait,
    /// Terminal. The slot is free for reuse.
    #[default]
    Done,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WaitInvoke => "wait_invoke",
            Self::InWork => "in_work",
            Self::RequestWait => "request_wait",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Producer-side handle to one activation of a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle {
    index: usize,
    generation: u64,
    is_request: bool,
}

impl EventHandle {
    /// Slot index inside the pool.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Activation counter of the slot when this handle was issued.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the event was raised as a request.
    #[must_use]
    pub fn is_request(&self) -> bool {
        self.is_request
    }

    pub(crate) fn slot_ref(&self) -> SlotRef {
        SlotRef {
            index: self.index,
            generation: self.generation,
        }
    }
}

/// Description of an event about to be raised.
///
/// ```rust
/// use eventpool_events::NewEvent;
///
/// let event = NewEvent::new(1, 5).with_payload(String::from("scan")).as_request();
/// assert!(event.is_request());
/// ```
pub struct NewEvent<P> {
    event_type: u8,
    subtype: u8,
    payload: Option<P>,
    is_request: bool,
    aux: Option<AuxHandle>,
}

impl<P> NewEvent<P> {
    /// Create an event with the given type and subtype and no payload.
    #[must_use]
    pub fn new(event_type: u8, subtype: u8) -> Self {
        Self {
            event_type,
            subtype,
            payload: None,
            is_request: false,
            aux: None,
        }
    }

    /// Attach a payload. Ownership moves into the pool when the event is added.
    #[must_use]
    pub fn with_payload(mut self, payload: P) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Raise the event as a request the producer will wait on.
    #[must_use]
    pub fn as_request(mut self) -> Self {
        self.is_request = true;
        self
    }

    /// Attach caller context that subscribers can downcast.
    #[must_use]
    pub fn with_aux(mut self, aux: AuxHandle) -> Self {
        self.aux = Some(aux);
        self
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

    /// Whether this event is a request.
    #[must_use]
    pub fn is_request(&self) -> bool {
        self.is_request
    }
}

impl<P> fmt::Debug for NewEvent<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewEvent")
            .field("event_type", &self.event_type)
            .field("subtype", &self.subtype)
            .field("has_payload", &self.payload.is_some())
            .field("is_request", &self.is_request)
            .field("has_aux", &self.aux.is_some())
            .finish()
    }
}

/// Point-in-time view of a slot for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    /// Slot index.
    pub index: usize,
    /// Activation counter.
    pub generation: u64,
    /// Current status.
    pub status: EventStatus,
    /// Type tag of the current or last activation.
    #[serde(rename = "type")]
    pub event_type: u8,
    /// Subtype tag of the current or last activation.
    pub subtype: u8,
    /// Subscribers that still owe a completion.
    pub pending: usize,
    /// Whether the activation is a request.
    pub is_request: bool,
}

/// Reference from a subscriber queue into the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotRef {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

/// Outcome of a pending-count decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    /// Other subscribers still owe a completion.
    Outstanding,
    /// Last completion on a request; the producer can collect the result.
    RequestReady,
    /// Last completion; the slot is free again.
    Done,
}

/// One entry of the pool.
pub(crate) struct Slot<P> {
    event_type: u8,
    subtype: u8,
    status: EventStatus,
    payload: Option<P>,
    aux: Option<AuxHandle>,
    is_request: bool,
    abandoned: bool,
    pending: usize,
    generation: u64,
}

impl<P> Slot<P> {
    pub(crate) fn new() -> Self {
        Self {
            event_type: 0,
            subtype: 0,
            status: EventStatus::Done,
            payload: None,
            aux: None,
            is_request: false,
            abandoned: false,
            pending: 0,
            generation: 0,
        }
    }

    pub(crate) fn status(&self) -> EventStatus {
        self.status
    }

    pub(crate) fn is_free(&self) -> bool {
        self.status == EventStatus::Done
    }

    pub(crate) fn event_type(&self) -> u8 {
        self.event_type
    }

    pub(crate) fn subtype(&self) -> u8 {
        self.subtype
    }

    pub(crate) fn is_request(&self) -> bool {
        self.is_request
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Handle for the current activation.
    pub(crate) fn handle(&self, index: usize) -> EventHandle {
        EventHandle {
            index,
            generation: self.generation,
            is_request: self.is_request,
        }
    }

    /// Whether `handle` still names this slot's current activation.
    pub(crate) fn is_current(&self, handle: &EventHandle) -> bool {
        self.generation == handle.generation
    }

    /// Reinitialize the slot for a new activation.
    ///
    /// The previous payload is dropped here, before the new one is stored.
    pub(crate) fn activate(&mut self, index: usize, event: NewEvent<P>) -> EventHandle {
        debug_assert!(self.is_free(), "activating a slot that is not done");
        self.payload = None;
        self.generation = self.generation.wrapping_add(1);
        self.event_type = event.event_type;
        self.subtype = event.subtype;
        self.payload = event.payload;
        self.aux = event.aux;
        self.is_request = event.is_request;
        self.abandoned = false;
        self.pending = 0;
        self.status = EventStatus::WaitInvoke;
        self.handle(index)
    }

    /// Record one more subscriber owing a completion.
    pub(crate) fn attach(&mut self) {
        self.pending = self.pending.saturating_add(1);
    }

    /// Finish an activation nobody matched.
    ///
    /// Goes straight to `Done` even for requests, so the slot is reusable at
    /// once. The payload stays until the slot is next activated.
    pub(crate) fn complete_unmatched(&mut self) -> Completion {
        debug_assert_eq!(self.pending, 0);
        self.aux = None;
        self.status = EventStatus::Done;
        Completion::Done
    }

    /// `WaitInvoke -> InWork`, handing the payload to the claimant.
    ///
    /// Returns `None` when another subscriber currently holds the slot.
    pub(crate) fn claim(&mut self) -> Option<(Option<P>, Option<AuxHandle>)> {
        if self.status != EventStatus::WaitInvoke {
            return None;
        }
        self.status = EventStatus::InWork;
        Some((self.payload.take(), self.aux.clone()))
    }

    /// The claimant finished. The payload is moved back before the transition.
    pub(crate) fn complete_claim(&mut self, payload: Option<P>) -> Completion {
        debug_assert_eq!(self.status, EventStatus::InWork);
        self.payload = payload;
        self.release_one();
        if self.pending > 0 {
            self.status = EventStatus::WaitInvoke;
            Completion::Outstanding
        } else {
            self.finish()
        }
    }

    /// A subscriber left without ever claiming this activation.
    ///
    /// The status is only touched when this was the last owed completion, in
    /// which case nobody can be holding the slot.
    pub(crate) fn release_unclaimed(&mut self) -> Completion {
        self.release_one();
        if self.pending > 0 {
            Completion::Outstanding
        } else {
            debug_assert_eq!(self.status, EventStatus::WaitInvoke);
            self.finish()
        }
    }

    /// `RequestWait -> Done`, moving the result out.
    pub(crate) fn finalize(&mut self) -> Option<P> {
        debug_assert_eq!(self.status, EventStatus::RequestWait);
        let result = self.payload.take();
        self.status = EventStatus::Done;
        self.aux = None;
        result
    }

    /// Take back the payload of an activation that already reached `Done`
    /// without anyone collecting it.
    pub(crate) fn reclaim(&mut self) -> Option<P> {
        debug_assert_eq!(self.status, EventStatus::Done);
        self.payload.take()
    }

    /// The producer gave up on the result.
    ///
    /// Returns `Completion::Done` when the slot was already waiting on the
    /// producer and has been released right away.
    pub(crate) fn abandon(&mut self) -> Completion {
        if self.status == EventStatus::RequestWait {
            self.payload = None;
            self.aux = None;
            self.status = EventStatus::Done;
            return Completion::Done;
        }
        self.abandoned = true;
        Completion::Outstanding
    }

    pub(crate) fn snapshot(&self, index: usize) -> SlotSnapshot {
        SlotSnapshot {
            index,
            generation: self.generation,
            status: self.status,
            event_type: self.event_type,
            subtype: self.subtype,
            pending: self.pending,
            is_request: self.is_request,
        }
    }

    fn release_one(&mut self) {
        debug_assert!(self.pending > 0, "completion without an owed subscriber");
        self.pending = self.pending.saturating_sub(1);
    }

    fn finish(&mut self) -> Completion {
        if self.is_request && !self.abandoned {
            self.status = EventStatus::RequestWait;
            Completion::RequestReady
        } else {
            if self.abandoned {
                self.payload = None;
            }
            self.aux = None;
            self.status = EventStatus::Done;
            Completion::Done
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(event: NewEvent<u32>) -> (Slot<u32>, EventHandle) {
        let mut slot = Slot::new();
        let handle = slot.activate(0, event);
        (slot, handle)
    }

    #[test]
    fn test_new_slot_is_free() {
        let slot: Slot<u32> = Slot::new();
        assert!(slot.is_free());
        assert_eq!(slot.generation(), 0);
    }

    #[test]
    fn test_activate_bumps_generation() {
        let (mut slot, first) = active(NewEvent::new(1, 2));
        assert_eq!(slot.status(), EventStatus::WaitInvoke);
        assert_eq!(first.generation(), 1);

        slot.complete_unmatched();
        let second = slot.activate(0, NewEvent::new(1, 2));
        assert_eq!(second.generation(), 2);
        assert!(!slot.is_current(&first));
        assert!(slot.is_current(&second));
    }

    #[test]
    fn test_claim_moves_payload_out_and_back() {
        let (mut slot, _) = active(NewEvent::new(1, 0).with_payload(7));
        slot.attach();

        let (payload, aux) = slot.claim().unwrap();
        assert_eq!(payload, Some(7));
        assert!(aux.is_none());
        assert_eq!(slot.status(), EventStatus::InWork);
        assert!(slot.claim().is_none());

        assert_eq!(slot.complete_claim(Some(8)), Completion::Done);
        assert_eq!(slot.status(), EventStatus::Done);
        assert_eq!(slot.payload, Some(8));
    }

    #[test]
    fn test_hand_off_returns_to_wait_invoke() {
        let (mut slot, _) = active(NewEvent::new(1, 0));
        slot.attach();
        slot.attach();

        let (payload, _) = slot.claim().unwrap();
        assert_eq!(slot.complete_claim(payload), Completion::Outstanding);
        assert_eq!(slot.status(), EventStatus::WaitInvoke);
        assert_eq!(slot.pending(), 1);
    }

    #[test]
    fn test_request_finishes_in_request_wait() {
        let (mut slot, handle) = active(NewEvent::new(3, 1).with_payload(1).as_request());
        assert!(handle.is_request());
        slot.attach();

        let (payload, _) = slot.claim().unwrap();
        assert_eq!(slot.complete_claim(payload.map(|_| 2)), Completion::RequestReady);
        assert_eq!(slot.status(), EventStatus::RequestWait);
        assert!(!slot.is_free());

        assert_eq!(slot.finalize(), Some(2));
        assert!(slot.is_free());
    }

    #[test]
    fn test_unmatched_request_is_done_immediately() {
        let aux: AuxHandle = Arc::new(());
        let (mut slot, handle) = active(
            NewEvent::new(3, 1)
                .with_aux(Arc::clone(&aux))
                .as_request(),
        );
        assert_eq!(slot.complete_unmatched(), Completion::Done);
        assert!(slot.is_free());
        assert!(slot.is_current(&handle));
        assert_eq!(Arc::strong_count(&aux), 1);
    }

    #[test]
    fn test_reclaim_after_unmatched() {
        let (mut slot, _) = active(NewEvent::new(3, 1).with_payload(9).as_request());
        slot.complete_unmatched();
        assert_eq!(slot.reclaim(), Some(9));
        assert_eq!(slot.reclaim(), None);
    }

    #[test]
    fn test_release_unclaimed_last_owner_finishes() {
        let (mut slot, _) = active(NewEvent::new(1, 0));
        slot.attach();
        assert_eq!(slot.release_unclaimed(), Completion::Done);
        assert!(slot.is_free());
    }

    #[test]
    fn test_abandoned_request_skips_request_wait() {
        let (mut slot, _) = active(NewEvent::new(1, 0).with_payload(5).as_request());
        slot.attach();
        assert_eq!(slot.abandon(), Completion::Outstanding);
        assert!(slot.is_request());

        let (payload, _) = slot.claim().unwrap();
        assert_eq!(slot.complete_claim(payload), Completion::Done);
        assert!(slot.is_free());
        assert!(slot.payload.is_none());
    }

    #[test]
    fn test_abandon_in_request_wait_releases_immediately() {
        let (mut slot, _) = active(NewEvent::new(1, 0).with_payload(5).as_request());
        slot.attach();
        let (payload, _) = slot.claim().unwrap();
        assert_eq!(slot.complete_claim(payload), Completion::RequestReady);
        assert_eq!(slot.abandon(), Completion::Done);
        assert!(slot.is_free());
    }

    #[test]
    fn test_activate_drops_previous_payload() {
        let tracker = Arc::new(());
        let mut slot = Slot::new();
        slot.activate(0, NewEvent::new(1, 0).with_payload(Arc::clone(&tracker)));
        slot.complete_unmatched();
        assert_eq!(Arc::strong_count(&tracker), 2);

        slot.activate(0, NewEvent::new(1, 0));
        assert_eq!(Arc::strong_count(&tracker), 1);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&EventStatus::RequestWait).unwrap();
        assert_eq!(json, "\"request_wait\"");
        assert_eq!(EventStatus::InWork.to_string(), "in_work");
    }
}
