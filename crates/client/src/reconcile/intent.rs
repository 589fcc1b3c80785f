//! Intent entries and their reconciliation state machine

use roster_types::{RegistrationPayload, ServiceKey};

/// Declared-vs-confirmed state shared by registrations and subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentFlags {
    /// Does the client currently want this present on the server
    pub expected_registered: bool,
    /// Has the server acknowledged it as present
    pub confirmed_registered: bool,
    /// A deregister has been requested but not yet swept
    pub deregister_in_flight: bool,
}

impl IntentFlags {
    /// State of a freshly declared intent
    pub fn fresh() -> Self {
        Self {
            expected_registered: true,
            confirmed_registered: false,
            deregister_in_flight: false,
        }
    }

    /// Corrective action this state calls for
    ///
    /// The full decision table over (confirmed, in-flight, expected). The
    /// terminal `(false, true, false)` state maps to `Remove`: the entry is
    /// fully drained and only needs sweeping.
    pub fn action(&self) -> IntentAction {
        match (self.confirmed_registered, self.deregister_in_flight) {
            (true, false) => {
                if self.expected_registered {
                    IntentAction::None
                } else {
                    IntentAction::Deregister
                }
            }
            (true, true) => IntentAction::Deregister,
            (false, false) => {
                if self.expected_registered {
                    IntentAction::Register
                } else {
                    IntentAction::None
                }
            }
            (false, true) => {
                if self.expected_registered {
                    IntentAction::Register
                } else {
                    IntentAction::Remove
                }
            }
        }
    }

    /// Whether the reconciler has anything to do for this entry
    pub fn needs_reconcile(&self) -> bool {
        self.action() != IntentAction::None
    }
}

/// What the reconciler should do with an intent entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentAction {
    /// Issue a register / subscribe request
    Register,
    /// Issue a deregister / unsubscribe request
    Deregister,
    /// Drop the fully drained entry, no RPC
    Remove,
    /// Nothing owed
    None,
}

/// Tracked registration for one service
#[derive(Debug, Clone)]
pub struct RegistrationIntent {
    /// Service the instances belong to
    pub service: ServiceKey,
    /// Instances to (de)register
    pub payload: RegistrationPayload,
    /// Reconciliation state
    pub flags: IntentFlags,
}

/// Tracked subscription for one (service, cluster-filter) pair
///
/// Subscriptions carry no data, only interest.
#[derive(Debug, Clone)]
pub struct SubscriptionIntent {
    /// Service being watched
    pub service: ServiceKey,
    /// Cluster filter the subscription was made with
    pub clusters: String,
    /// Reconciliation state
    pub flags: IntentFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(confirmed: bool, in_flight: bool, expected: bool) -> IntentFlags {
        IntentFlags {
            expected_registered: expected,
            confirmed_registered: confirmed,
            deregister_in_flight: in_flight,
        }
    }

    #[test]
    fn test_action_table() {
        // settled
        assert_eq!(flags(true, false, true).action(), IntentAction::None);
        // register owed
        assert_eq!(flags(false, false, true).action(), IntentAction::Register);
        // deregister owed
        assert_eq!(flags(true, true, false).action(), IntentAction::Deregister);
        // confirmed but no longer wanted
        assert_eq!(flags(true, false, false).action(), IntentAction::Deregister);
        // re-registered while a deregister was in flight
        assert_eq!(flags(false, true, true).action(), IntentAction::Register);
        // terminal: drained, sweep it
        assert_eq!(flags(false, true, false).action(), IntentAction::Remove);
        // never declared wanted, nothing owed
        assert_eq!(flags(false, false, false).action(), IntentAction::None);
    }

    #[test]
    fn test_needs_reconcile() {
        assert!(!flags(true, false, true).needs_reconcile());
        assert!(flags(false, false, true).needs_reconcile());
        assert!(flags(false, true, false).needs_reconcile());
    }
}
