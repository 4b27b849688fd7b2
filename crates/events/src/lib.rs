//! Event abstractions: the [`Event`] trait, the persisted/published
//! [`EventEnvelope`], and the pub/sub [`EventBus`] with an in-memory
//! implementation for tests and dev wiring.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
