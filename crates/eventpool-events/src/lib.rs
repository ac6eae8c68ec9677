//! Eventpool Events - fixed-capacity publish/subscribe dispatcher.
//!
//! This crate provides:
//! - A pool of reusable event slots sized once at construction
//! - Subscribers with type/subtype filters and private FIFO queues
//! - Request events whose producer waits for every subscriber to finish
//!
//! # Architecture
//!
//! An [`EventManager`] owns the slot pool and the subscriber registry behind
//! a single lock. [`EventManager::add_event`] takes the first free slot,
//! fills it and appends a reference to the queue of every matching
//! subscriber. Each [`Subscriber`] then claims the event with
//! [`Subscriber::next`], processes it outside the lock and releases it with
//! [`Subscriber::done`]. When the last matching subscriber is done the slot
//! is free again, or, for requests, waits for its producer to
//! [`finalize`](EventManager::finalize) it.
//!
//! The slot status is shared by all subscribers of an event, so only one of
//! them processes it at a time. Which subscriber goes first is up to the
//! scheduler.
//!
//! # Example
//!
//! ```rust
//! use std::thread;
//! use std::time::Duration;
//!
//! use eventpool_events::{EventFilter, EventManager, NewEvent};
//!
//! let manager: EventManager<u32> = EventManager::new(4);
//! let mut doubler = manager.subscribe("doubler", EventFilter::of_type(2));
//!
//! let worker = thread::spawn(move || loop {
//!     if let Some(event) = doubler.next() {
//!         if let Some(value) = event.payload_mut() {
//!             *value *= 2;
//!         }
//!         doubler.done();
//!         break;
//!     }
//!     thread::sleep(Duration::from_millis(1));
//! });
//!
//! let handle = manager
//!     .add_event(NewEvent::new(2, 1).with_payload(21).as_request())
//!     .expect("pool has room");
//! manager.wait(&handle, None).unwrap();
//! assert_eq!(manager.finalize(handle).unwrap(), Some(42));
//! worker.join().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod manager;
mod slot;
mod subscriber;

pub use error::{EventError, EventResult};
pub use manager::{DEFAULT_CAPACITY, EventManager, ManagerOptions, ManagerStats};
pub use slot::{AuxHandle, EventHandle, EventStatus, NewEvent, SlotSnapshot};
pub use subscriber::{ClaimedEvent, EventFilter, Subscriber, SubscriberId, SubscriberInfo};
