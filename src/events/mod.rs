//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the coordinator, registry,
//! health monitor, mutation observer, recovery engine and persistence layer.
//!
//! ## Quick reference
//! - **Publishers**: every `core` component.
//! - **Consumers**: the engine's subscriber listener (fans out to the
//!   [`SubscriberSet`](crate::subscribers::SubscriberSet)) and any direct
//!   [`Bus::subscribe`] receiver.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
