//! Intent tracking and periodic reconciliation
//!
//! The tracker is the single source of truth for "work still owed" to the
//! server; the reconciler drains it. RPC failures leave an intent pending so
//! the next tick retries — the loop itself is the retry authority.

pub mod intent;
pub mod reconciler;
pub mod tracker;

pub use intent::{IntentAction, IntentFlags, RegistrationIntent, SubscriptionIntent};
pub use reconciler::Reconciler;
pub use tracker::IntentTracker;
