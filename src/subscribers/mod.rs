//! # Event subscribers for the widget engine.
//!
//! Observability surface of the runtime: implement [`Subscribe`] to hook
//! into lifecycle events (registration, staleness, surface loss, recovery,
//! snapshots), or attach the built-in [`LogWriter`] for structured logs.
//!
//! Delivery runs through [`SubscriberSet`]: one bounded queue plus worker
//! per subscriber, so a slow consumer never stalls the engine.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
