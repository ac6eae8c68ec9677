//! The event manager: slot pool, subscriber registry and the lock around both.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{EventError, EventResult};
use crate::slot::{Completion, EventHandle, EventStatus, NewEvent, Slot, SlotSnapshot};
use crate::subscriber::{
    ClaimedEvent, EventFilter, Registration, Subscriber, SubscriberId, SubscriberInfo,
};

/// Default number of slots in the pool.
pub const DEFAULT_CAPACITY: usize = 16;

/// Construction options for an [`EventManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Number of slots in the pool. Fixed for the manager's lifetime.
    pub capacity: usize,
    /// Deadline used by [`EventManager::request`]. `None` waits indefinitely.
    pub wait_timeout: Option<Duration>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            wait_timeout: None,
        }
    }
}

impl ManagerOptions {
    /// Options with the given pool capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Set the request wait deadline.
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }
}

#[cfg(feature = "config")]
impl From<&eventpool_config::DispatcherSection> for ManagerOptions {
    fn from(section: &eventpool_config::DispatcherSection) -> Self {
        Self {
            capacity: section.capacity,
            wait_timeout: (section.wait_timeout_ms > 0)
                .then(|| Duration::from_millis(section.wait_timeout_ms)),
        }
    }
}

/// Counters describing the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStats {
    /// Pool size.
    pub capacity: usize,
    /// Slots not currently `Done`.
    pub in_flight: usize,
    /// Registered subscribers.
    pub subscribers: usize,
    /// Events accepted by `add_event`.
    pub published: u64,
    /// Events rejected because the pool was exhausted.
    pub dropped: u64,
    /// Activations that reached `Done`.
    pub completed: u64,
}

/// Per-slot wakeup for producers waiting on a request.
struct SlotSignal {
    ready: Condvar,
    notify: Notify,
}

impl SlotSignal {
    fn new() -> Self {
        Self {
            ready: Condvar::new(),
            notify: Notify::new(),
        }
    }

    fn wake(&self) {
        self.ready.notify_all();
        self.notify.notify_waiters();
    }
}

/// Everything the manager lock guards.
struct State<P> {
    slots: Box<[Slot<P>]>,
    registry: Vec<Registration>,
    published: u64,
    dropped: u64,
    completed: u64,
}

impl<P> State<P> {
    fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| Slot::new()).collect(),
            registry: Vec::new(),
            published: 0,
            dropped: 0,
            completed: 0,
        }
    }

    fn registration_mut(&mut self, id: SubscriberId) -> Option<&mut Registration> {
        self.registry.iter_mut().find(|r| r.id == id)
    }

    /// Whether the request behind `handle` is ready to be collected.
    ///
    /// An activation that already reached `Done` counts as stale: it was
    /// finalized, or abandoned and drained.
    fn request_ready(&self, handle: &EventHandle) -> EventResult<bool> {
        if !handle.is_request() {
            return Err(EventError::NotARequest {
                index: handle.index(),
            });
        }
        let stale = EventError::StaleHandle {
            index: handle.index(),
            generation: handle.generation(),
        };
        let Some(slot) = self.slots.get(handle.index()) else {
            return Err(stale);
        };
        if !slot.is_current(handle) {
            return Err(stale);
        }
        match slot.status() {
            EventStatus::RequestWait => Ok(true),
            EventStatus::Done => Err(stale),
            EventStatus::WaitInvoke | EventStatus::InWork => Ok(false),
        }
    }

    fn record(&mut self, completion: Completion) {
        if completion == Completion::Done {
            self.completed = self.completed.saturating_add(1);
        }
    }

    fn stats(&self) -> ManagerStats {
        ManagerStats {
            capacity: self.slots.len(),
            in_flight: self.slots.iter().filter(|s| !s.is_free()).count(),
            subscribers: self.registry.len(),
            published: self.published,
            dropped: self.dropped,
            completed: self.completed,
        }
    }
}

/// State shared between the manager and its subscriber handles.
pub(crate) struct Shared<P> {
    state: Mutex<State<P>>,
    signals: Box<[SlotSignal]>,
    options: ManagerOptions,
}

impl<P: Send + 'static> Shared<P> {
    fn new(options: ManagerOptions) -> Self {
        Self {
            state: Mutex::new(State::new(options.capacity)),
            signals: (0..options.capacity).map(|_| SlotSignal::new()).collect(),
            options,
        }
    }

    /// Every critical section leaves the state consistent, so a poisoned
    /// lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, State<P>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn signal(&self, handle: &EventHandle) -> EventResult<&SlotSignal> {
        self.signals
            .get(handle.index())
            .ok_or(EventError::StaleHandle {
                index: handle.index(),
                generation: handle.generation(),
            })
    }

    fn settle(&self, state: &mut State<P>, index: usize, completion: Completion) {
        state.record(completion);
        if completion == Completion::Outstanding {
            return;
        }
        trace!(slot = index, ?completion, "Event activation settled");
        if let Some(signal) = self.signals.get(index) {
            signal.wake();
        }
    }

    pub(crate) fn claim_next(&self, id: SubscriberId) -> Option<ClaimedEvent<P>> {
        let mut guard = self.lock();
        let State {
            slots, registry, ..
        } = &mut *guard;

        // Queued refs always point at an in-range slot of the same
        // generation: a slot is only reactivated once every queue that held
        // it has let go.
        let registration = registry.iter_mut().find(|r| r.id == id)?;
        let position = registration
            .queue
            .iter()
            .position(|r| slots[r.index].status() == EventStatus::WaitInvoke)?;
        let slot_ref = registration.queue.remove(position)?;

        let slot = &mut slots[slot_ref.index];
        debug_assert_eq!(slot.generation(), slot_ref.generation);
        let (payload, aux) = slot.claim()?;
        registration.current = Some(slot_ref);

        trace!(
            subscriber = %registration.name,
            slot = slot_ref.index,
            event_type = slot.event_type(),
            subtype = slot.subtype(),
            "Event claimed"
        );

        Some(ClaimedEvent::new(
            slot.handle(slot_ref.index),
            slot.event_type(),
            slot.subtype(),
            payload,
            aux,
        ))
    }

    pub(crate) fn complete(&self, id: SubscriberId, claim: ClaimedEvent<P>) {
        let mut state = self.lock();
        if let Some(registration) = state.registration_mut(id) {
            registration.current = None;
        }
        self.complete_locked(&mut state, claim);
    }

    fn complete_locked(&self, state: &mut State<P>, claim: ClaimedEvent<P>) {
        let slot_ref = claim.handle().slot_ref();
        let slot = &mut state.slots[slot_ref.index];
        debug_assert_eq!(slot.generation(), slot_ref.generation);
        let completion = slot.complete_claim(claim.into_payload());
        trace!(
            slot = slot_ref.index,
            pending = slot.pending(),
            status = %slot.status(),
            "Event completed by subscriber"
        );
        self.settle(state, slot_ref.index, completion);
    }

    /// Remove a registration and resolve everything it still owes.
    pub(crate) fn detach(&self, id: SubscriberId, claim: Option<ClaimedEvent<P>>) -> bool {
        let mut state = self.lock();

        if let Some(claim) = claim {
            self.complete_locked(&mut state, claim);
        }

        let Some(position) = state.registry.iter().position(|r| r.id == id) else {
            return false;
        };
        let registration = state.registry.remove(position);

        for slot_ref in &registration.queue {
            let slot = &mut state.slots[slot_ref.index];
            debug_assert_eq!(slot.generation(), slot_ref.generation);
            let completion = slot.release_unclaimed();
            self.settle(&mut state, slot_ref.index, completion);
        }

        debug!(
            subscriber = %registration.name,
            released = registration.queue.len(),
            "Subscriber unregistered"
        );
        true
    }

    pub(crate) fn queued(&self, id: SubscriberId) -> usize {
        self.lock()
            .registry
            .iter()
            .find(|r| r.id == id)
            .map_or(0, |r| r.queue.len())
    }
}

/// Fixed-capacity publish/subscribe dispatcher.
///
/// Cloning is cheap; every clone drives the same pool and registry.
///
/// ```rust
/// use eventpool_events::{EventFilter, EventManager, EventStatus, NewEvent};
///
/// let manager: EventManager<String> = EventManager::new(2);
/// let mut sub = manager.subscribe("logger", EventFilter::of_type(1));
///
/// let handle = manager
///     .add_event(NewEvent::new(1, 5).with_payload("hello".to_string()))
///     .expect("pool has room");
///
/// let event = sub.next().expect("event queued");
/// assert_eq!(event.payload().map(String::as_str), Some("hello"));
/// sub.done();
///
/// assert_eq!(manager.status(&handle), EventStatus::Done);
/// ```
pub struct EventManager<P: Send + 'static> {
    shared: Arc<Shared<P>>,
}

impl<P: Send + 'static> EventManager<P> {
    /// Create a manager with `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_options(ManagerOptions::new(capacity))
    }

    /// Create a manager from explicit options.
    #[must_use]
    pub fn with_options(options: ManagerOptions) -> Self {
        debug!(capacity = options.capacity, "Event manager created");
        Self {
            shared: Arc::new(Shared::new(options)),
        }
    }

    /// Number of slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.options.capacity
    }

    /// Options the manager was built with.
    #[must_use]
    pub fn options(&self) -> &ManagerOptions {
        &self.shared.options
    }

    /// Register a subscriber.
    ///
    /// Only events raised after this call are delivered to it.
    pub fn subscribe(&self, name: impl Into<String>, filter: EventFilter) -> Subscriber<P> {
        let id = SubscriberId::new();
        let name = name.into();

        self.shared
            .lock()
            .registry
            .push(Registration::new(id, name.clone(), filter));

        debug!(
            subscriber = %name,
            event_type = filter.event_type,
            subtype = filter.subtype,
            "Subscriber registered"
        );
        Subscriber::new(id, name, filter, Arc::clone(&self.shared))
    }

    /// Unregister a subscriber.
    ///
    /// Any event it claimed or still had queued is resolved as if it had
    /// called `done`. Returns `false` if the subscriber belongs to another
    /// manager; it is still detached from its own one.
    pub fn unsubscribe(&self, mut subscriber: Subscriber<P>) -> bool {
        if !subscriber.belongs_to(&self.shared) {
            warn!(
                subscriber = %subscriber.name(),
                "Unsubscribe called on a foreign manager"
            );
            return false;
        }
        subscriber.detach()
    }

    /// Raise an event.
    ///
    /// Returns `None` when every slot is in use. The event (and its payload)
    /// is dropped in that case and the `dropped` counter is bumped.
    pub fn add_event(&self, event: NewEvent<P>) -> Option<EventHandle> {
        let mut guard = self.shared.lock();
        let state = &mut *guard;

        let Some(index) = state.slots.iter().position(Slot::is_free) else {
            state.dropped = state.dropped.saturating_add(1);
            warn!(
                event_type = event.event_type(),
                subtype = event.subtype(),
                capacity = state.slots.len(),
                "Event pool exhausted, event dropped"
            );
            return None;
        };

        let (event_type, subtype) = (event.event_type(), event.subtype());
        let slot = &mut state.slots[index];
        let handle = slot.activate(index, event);
        let slot_ref = handle.slot_ref();

        for registration in &mut state.registry {
            if registration.filter.matches(event_type, subtype) {
                slot.attach();
                registration.queue.push_back(slot_ref);
            }
        }

        let matched = slot.pending();
        state.published = state.published.saturating_add(1);

        if matched == 0 {
            let completion = slot.complete_unmatched();
            self.shared.settle(state, index, completion);
        }

        debug!(
            slot = index,
            event_type,
            subtype,
            matched,
            is_request = handle.is_request(),
            "Event published"
        );
        Some(handle)
    }

    /// Status of the activation behind `handle`.
    ///
    /// A handle whose activation is over reports `Done`.
    #[must_use]
    pub fn status(&self, handle: &EventHandle) -> EventStatus {
        let state = self.shared.lock();
        state
            .slots
            .get(handle.index())
            .filter(|slot| slot.is_current(handle))
            .map_or(EventStatus::Done, Slot::status)
    }

    /// Block until every subscriber has finished with a request.
    ///
    /// `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// - [`EventError::NotARequest`] if the event is not a request.
    /// - [`EventError::StaleHandle`] if the activation is already over.
    /// - [`EventError::Timeout`] if `timeout` elapses first.
    pub fn wait(&self, handle: &EventHandle, timeout: Option<Duration>) -> EventResult<()> {
        let signal = self.shared.signal(handle)?;
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut state = self.shared.lock();

        loop {
            if state.request_ready(handle)? {
                return Ok(());
            }

            state = match deadline {
                None => signal
                    .ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(EventError::Timeout {
                            index: handle.index(),
                        });
                    }
                    signal
                        .ready
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                },
            };
        }
    }

    /// Async counterpart of [`wait`](Self::wait).
    ///
    /// Compose with `tokio::time::timeout` for a deadline.
    ///
    /// # Errors
    ///
    /// - [`EventError::NotARequest`] if the event is not a request.
    /// - [`EventError::StaleHandle`] if the activation is already over.
    /// - [`EventError::Cancelled`] if `cancel` fires first.
    pub async fn wait_async(
        &self,
        handle: &EventHandle,
        cancel: &CancellationToken,
    ) -> EventResult<()> {
        let signal = self.shared.signal(handle)?;

        loop {
            let mut notified = std::pin::pin!(signal.notify.notified());
            // Register before checking so a wake between the check and the
            // await is not lost.
            notified.as_mut().enable();

            let ready = self.shared.lock().request_ready(handle)?;
            if ready {
                return Ok(());
            }

            tokio::select! {
                () = notified.as_mut() => {},
                () = cancel.cancelled() => {
                    return Err(EventError::Cancelled {
                        index: handle.index(),
                    });
                },
            }
        }
    }

    /// Collect a request's result and release its slot.
    ///
    /// # Errors
    ///
    /// - [`EventError::NotARequest`] if the event is not a request.
    /// - [`EventError::StaleHandle`] if the activation is already over.
    /// - [`EventError::NotReady`] if subscribers are still processing it.
    pub fn finalize(&self, handle: EventHandle) -> EventResult<Option<P>> {
        let mut state = self.shared.lock();
        if !state.request_ready(&handle)? {
            return Err(EventError::NotReady {
                index: handle.index(),
            });
        }

        let result = state.slots[handle.index()].finalize();
        self.shared.settle(&mut state, handle.index(), Completion::Done);
        trace!(slot = handle.index(), "Request finalized");
        Ok(result)
    }

    /// Give up on a request's result.
    ///
    /// The slot is released as soon as every subscriber has finished, or
    /// right away if they already have.
    ///
    /// # Errors
    ///
    /// - [`EventError::NotARequest`] if the event is not a request.
    /// - [`EventError::StaleHandle`] if the activation is already over.
    pub fn abandon(&self, handle: EventHandle) -> EventResult<()> {
        let mut state = self.shared.lock();
        state.request_ready(&handle)?;

        let completion = state.slots[handle.index()].abandon();
        self.shared.settle(&mut state, handle.index(), completion);
        debug!(slot = handle.index(), "Request abandoned");
        Ok(())
    }

    /// Raise a request, wait for it and collect the result.
    ///
    /// Uses [`ManagerOptions::wait_timeout`]. On timeout the request is
    /// abandoned so its slot is not leaked. A request no subscriber matched
    /// is already `Done`; its payload comes back unchanged.
    ///
    /// # Errors
    ///
    /// - [`EventError::PoolExhausted`] if no slot is free.
    /// - [`EventError::Timeout`] if the configured deadline elapses.
    pub fn request(&self, event: NewEvent<P>) -> EventResult<Option<P>> {
        let handle = self
            .add_event(event.as_request())
            .ok_or(EventError::PoolExhausted {
                capacity: self.capacity(),
            })?;

        {
            let mut state = self.shared.lock();
            if let Some(slot) = state
                .slots
                .get_mut(handle.index())
                .filter(|slot| slot.is_current(&handle) && slot.is_free())
            {
                trace!(slot = handle.index(), "Request matched no subscriber");
                return Ok(slot.reclaim());
            }
        }

        if let Err(e) = self.wait(&handle, self.shared.options.wait_timeout) {
            if let Err(abandon_err) = self.abandon(handle) {
                debug!(error = %abandon_err, "Could not abandon request");
            }
            return Err(e);
        }
        self.finalize(handle)
    }

    /// Per-slot view of the pool.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        let state = self.shared.lock();
        state
            .slots
            .iter()
            .enumerate()
            .map(|(index, slot)| slot.snapshot(index))
            .collect()
    }

    /// The pool snapshot rendered as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if rendering fails.
    pub fn snapshot_json(&self) -> EventResult<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Registered subscribers in registration order.
    #[must_use]
    pub fn subscribers(&self) -> Vec<SubscriberInfo> {
        self.shared
            .lock()
            .registry
            .iter()
            .map(Registration::info)
            .collect()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().registry.len()
    }

    /// Dispatcher counters.
    #[must_use]
    pub fn stats(&self) -> ManagerStats {
        self.shared.lock().stats()
    }
}

impl<P: Send + 'static> Default for EventManager<P> {
    fn default() -> Self {
        Self::with_options(ManagerOptions::default())
    }
}

impl<P: Send + 'static> Clone for EventManager<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P: Send + 'static> fmt::Debug for EventManager<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_creation() {
        let manager: EventManager<()> = EventManager::new(4);
        assert_eq!(manager.capacity(), 4);
        assert_eq!(manager.subscriber_count(), 0);
        assert_eq!(manager.snapshot().len(), 4);
        assert!(manager.snapshot().iter().all(|s| s.status == EventStatus::Done));
    }

    #[test]
    fn test_default_options() {
        let manager: EventManager<()> = EventManager::default();
        assert_eq!(manager.capacity(), DEFAULT_CAPACITY);
        assert_eq!(manager.options().wait_timeout, None);
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_options_from_dispatcher_section() {
        let section = eventpool_config::DispatcherSection {
            capacity: 8,
            wait_timeout_ms: 0,
        };
        let options = ManagerOptions::from(&section);
        assert_eq!(options, ManagerOptions::new(8));

        let section = eventpool_config::DispatcherSection {
            capacity: 2,
            wait_timeout_ms: 1500,
        };
        let options = ManagerOptions::from(&section);
        assert_eq!(options.wait_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let manager: EventManager<()> = EventManager::new(1);
        let sub = manager.subscribe("sub", EventFilter::any());
        assert_eq!(manager.subscriber_count(), 1);
        assert_eq!(sub.name(), "sub");

        assert!(manager.unsubscribe(sub));
        assert_eq!(manager.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let manager: EventManager<()> = EventManager::new(1);
        let sub = manager.subscribe("sub", EventFilter::any());
        drop(sub);
        assert_eq!(manager.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_foreign_subscriber() {
        let a: EventManager<()> = EventManager::new(1);
        let b: EventManager<()> = EventManager::new(1);
        let sub = b.subscribe("sub", EventFilter::any());

        assert!(!a.unsubscribe(sub));
        assert_eq!(b.subscriber_count(), 0);
    }

    #[test]
    fn test_unmatched_event_completes_immediately() {
        let manager: EventManager<u32> = EventManager::new(1);
        let _other = manager.subscribe("other", EventFilter::of_type(9));

        let handle = manager.add_event(NewEvent::new(1, 1).with_payload(5)).unwrap();
        assert_eq!(manager.status(&handle), EventStatus::Done);

        let stats = manager.stats();
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.completed, 1);
        assert!(manager.add_event(NewEvent::new(1, 1)).is_some());
    }

    #[test]
    fn test_unmatched_request_is_reusable() {
        let manager: EventManager<u32> = EventManager::new(1);

        let handle = manager
            .add_event(NewEvent::new(1, 0).with_payload(3).as_request())
            .unwrap();
        assert_eq!(manager.status(&handle), EventStatus::Done);
        assert_eq!(manager.stats().completed, 1);
        assert!(matches!(
            manager.wait(&handle, None),
            Err(EventError::StaleHandle { .. })
        ));
        assert!(matches!(
            manager.finalize(handle),
            Err(EventError::StaleHandle { .. })
        ));

        let next = manager.add_event(NewEvent::new(1, 0)).unwrap();
        assert_eq!(next.index(), handle.index());
    }

    #[test]
    fn test_request_helper_without_subscribers() {
        let manager: EventManager<u32> = EventManager::new(1);
        assert_eq!(manager.request(NewEvent::new(4, 0).with_payload(11)).unwrap(), Some(11));
        assert_eq!(manager.stats().in_flight, 0);
        assert!(manager.add_event(NewEvent::new(4, 0)).is_some());
    }

    #[test]
    fn test_exhaustion_is_counted() {
        let manager: EventManager<()> = EventManager::new(1);
        let _sub = manager.subscribe("sub", EventFilter::any());

        assert!(manager.add_event(NewEvent::new(1, 0)).is_some());
        assert!(manager.add_event(NewEvent::new(1, 0)).is_none());

        let stats = manager.stats();
        assert_eq!(stats.published, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.in_flight, 1);
    }

    #[test]
    fn test_cloned_manager_shares_pool() {
        let manager: EventManager<()> = EventManager::new(1);
        let clone = manager.clone();
        let _sub = clone.subscribe("sub", EventFilter::any());

        assert!(manager.add_event(NewEvent::new(1, 0)).is_some());
        assert!(clone.add_event(NewEvent::new(1, 0)).is_none());
    }

    #[test]
    fn test_stale_handle_reports_done() {
        let manager: EventManager<()> = EventManager::new(1);
        let mut sub = manager.subscribe("sub", EventFilter::any());

        let first = manager.add_event(NewEvent::new(1, 0)).unwrap();
        sub.next().unwrap();
        sub.done();

        let second = manager.add_event(NewEvent::new(2, 0)).unwrap();
        assert_eq!(second.index(), first.index());
        assert_eq!(manager.status(&first), EventStatus::Done);
        assert_eq!(manager.status(&second), EventStatus::WaitInvoke);
    }

    #[test]
    fn test_request_ops_reject_plain_events() {
        let manager: EventManager<()> = EventManager::new(1);
        let _sub = manager.subscribe("sub", EventFilter::any());
        let handle = manager.add_event(NewEvent::new(1, 0)).unwrap();

        assert!(matches!(
            manager.wait(&handle, Some(Duration::from_millis(1))),
            Err(EventError::NotARequest { .. })
        ));
        assert!(matches!(
            manager.finalize(handle),
            Err(EventError::NotARequest { .. })
        ));
    }

    #[test]
    fn test_finalize_before_ready() {
        let manager: EventManager<()> = EventManager::new(1);
        let _sub = manager.subscribe("sub", EventFilter::any());
        let handle = manager.add_event(NewEvent::new(1, 0).as_request()).unwrap();

        assert!(matches!(
            manager.finalize(handle),
            Err(EventError::NotReady { .. })
        ));
    }

    #[test]
    fn test_wait_times_out() {
        let manager: EventManager<()> = EventManager::new(1);
        let _sub = manager.subscribe("sub", EventFilter::any());
        let handle = manager.add_event(NewEvent::new(1, 0).as_request()).unwrap();

        let result = manager.wait(&handle, Some(Duration::from_millis(20)));
        assert!(matches!(result, Err(EventError::Timeout { .. })));
        assert_eq!(manager.status(&handle), EventStatus::WaitInvoke);
    }

    #[test]
    fn test_snapshot_json() {
        let manager: EventManager<()> = EventManager::new(1);
        let _sub = manager.subscribe("sub", EventFilter::any());
        manager.add_event(NewEvent::new(4, 2)).unwrap();

        let json = manager.snapshot_json().unwrap();
        assert!(json.contains("\"status\":\"wait_invoke\""));
        assert!(json.contains("\"type\":4"));
        assert!(json.contains("\"pending\":1"));
    }

    #[test]
    fn test_subscriber_info() {
        let manager: EventManager<()> = EventManager::new(2);
        let mut sub = manager.subscribe("worker", EventFilter::new(1, 2));
        manager.add_event(NewEvent::new(1, 2)).unwrap();
        manager.add_event(NewEvent::new(1, 2)).unwrap();
        sub.next().unwrap();

        let infos = manager.subscribers();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name, "worker");
        assert_eq!(infos[0].filter, EventFilter::new(1, 2));
        assert_eq!(infos[0].queued, 1);
        assert!(infos[0].claimed);
        assert_eq!(sub.pending(), 1);
    }
}
