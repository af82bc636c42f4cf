//! # Visibility and focus wake signals.
//!
//! Hosts that can observe "tab became visible" or "window gained focus"
//! push [`WakeSignal`]s over a channel (see
//! [`EngineBuilder::with_wake_signals`](crate::EngineBuilder::with_wake_signals));
//! each signal triggers an immediate recovery pass. The channel is optional.

/// External signal that the presentation surface is live again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeSignal {
    /// The hosting tab/page became visible.
    BecameVisible,
    /// The hosting window regained focus.
    GainedFocus,
}
