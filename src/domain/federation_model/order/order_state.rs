use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an order.
///
/// ```text
/// OPEN -> PENDING -> SPAWNING -> FULFILLED -> CLOSED
///   |        |          |           |
///   v        v          v           v
/// FAILED_ON_REQUEST   FAILED_AFTER_SUCCESSFUL_REQUEST -> CLOSED
/// ```
///
/// Every non-terminal state may also go straight to `Closed` (user deletion) or `Deactivated`
/// (forced removal by the provider). `Closed` may only be followed by `Deactivated`, which removes
/// the order from the active index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderState {
    /// Accepted and registered, no provisioning call issued yet.
    Open,

    /// The provisioning call is in flight.
    Pending,

    /// The cloud returned an instance id, the instance is not ready yet.
    Spawning,

    /// The backing instance is ready.
    Fulfilled,

    /// The provisioning call failed, no instance was ever created.
    FailedOnRequest,

    /// An instance was created but became unusable. It still has to be deleted on close.
    FailedAfterSuccessfulRequest,

    /// Deleted by the user.
    Closed,

    /// Removed by the provider, no longer active.
    Deactivated,
}

impl OrderState {
    /// States that own a queue in the order registry.
    pub const QUEUED: [OrderState; 7] = [
        OrderState::Open,
        OrderState::Pending,
        OrderState::Spawning,
        OrderState::Fulfilled,
        OrderState::FailedOnRequest,
        OrderState::FailedAfterSuccessfulRequest,
        OrderState::Closed,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Closed | OrderState::Deactivated)
    }

    /// Queues listed by instance status queries. `Spawning` orders have no settled instance yet.
    pub fn lists_instance_status(&self) -> bool {
        matches!(self, OrderState::Fulfilled | OrderState::FailedAfterSuccessfulRequest)
    }

    pub fn can_transition_to(&self, next: OrderState) -> bool {
        use OrderState::*;

        match (self, next) {
            (Closed, Deactivated) => true,
            (Closed, _) | (Deactivated, _) => false,
            (_, Closed) | (_, Deactivated) => true,
            (Open, Pending) | (Open, FailedOnRequest) => true,
            (Pending, Spawning) | (Pending, FailedOnRequest) => true,
            (Spawning, Fulfilled) | (Spawning, FailedAfterSuccessfulRequest) => true,
            (Fulfilled, FailedAfterSuccessfulRequest) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderState::Open => "OPEN",
            OrderState::Pending => "PENDING",
            OrderState::Spawning => "SPAWNING",
            OrderState::Fulfilled => "FULFILLED",
            OrderState::FailedOnRequest => "FAILED_ON_REQUEST",
            OrderState::FailedAfterSuccessfulRequest => "FAILED_AFTER_SUCCESSFUL_REQUEST",
            OrderState::Closed => "CLOSED",
            OrderState::Deactivated => "DEACTIVATED",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::OrderState::*;

    #[test]
    fn test_forward_path_is_allowed() {
        assert!(Open.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Spawning));
        assert!(Spawning.can_transition_to(Fulfilled));
        assert!(Fulfilled.can_transition_to(Closed));
        assert!(FailedAfterSuccessfulRequest.can_transition_to(Closed));
    }

    #[test]
    fn test_predecessors_cannot_be_skipped() {
        assert!(!Open.can_transition_to(Spawning));
        assert!(!Open.can_transition_to(Fulfilled));
        assert!(!Pending.can_transition_to(Fulfilled));
        assert!(!Open.can_transition_to(FailedAfterSuccessfulRequest));
        assert!(!Spawning.can_transition_to(FailedOnRequest));
        assert!(!Fulfilled.can_transition_to(Spawning));
    }

    #[test]
    fn test_status_listing_queues() {
        let listed: Vec<_> = super::OrderState::QUEUED.into_iter().filter(|state| state.lists_instance_status()).collect();
        assert_eq!(listed, vec![Fulfilled, FailedAfterSuccessfulRequest]);
        assert!(!Deactivated.lists_instance_status());
    }

    #[test]
    fn test_terminal_states() {
        for state in [Open, Pending, Spawning, Fulfilled, FailedOnRequest, FailedAfterSuccessfulRequest] {
            assert!(state.can_transition_to(Closed), "{} -> CLOSED", state);
            assert!(state.can_transition_to(Deactivated), "{} -> DEACTIVATED", state);
        }
        assert!(Closed.can_transition_to(Deactivated));
        assert!(!Closed.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Open));
        assert!(!Deactivated.can_transition_to(Closed));
    }
}
