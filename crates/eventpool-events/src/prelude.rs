//! Prelude module - commonly used types for convenient import.
//!
//! Use `use eventpool_events::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use eventpool_events::prelude::*;
//!
//! let manager: EventManager<()> = EventManager::new(1);
//! let _sub = manager.subscribe("audit", EventFilter::any());
//! let handle = manager.add_event(NewEvent::new(1, 0)).unwrap();
//! assert_eq!(manager.status(&handle), EventStatus::WaitInvoke);
//! ```

// Manager
pub use crate::{EventManager, ManagerOptions, ManagerStats};

// Events
pub use crate::{AuxHandle, EventHandle, EventStatus, NewEvent};

// Subscribers
pub use crate::{ClaimedEvent, EventFilter, Subscriber};

// Errors
pub use crate::{EventError, EventResult};
