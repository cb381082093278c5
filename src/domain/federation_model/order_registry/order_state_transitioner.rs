use std::sync::Arc;

use crate::domain::federation_model::order::order::OrderRef;
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order_registry::order_registry::OrderRegistry;
use crate::domain::federation_model::utils::statistics::{ANALYTICS_TARGET, AuditEvent, AuditParameter, add_global_event};
use crate::error::{Error, Result};

/// The only component that changes the state of an active order.
///
/// Checks every move against the order state machine, performs it as a compare-and-move on the
/// registry and records the transition for analytics.
#[derive(Debug, Clone)]
pub struct OrderStateTransitioner {
    registry: Arc<OrderRegistry>,
}

impl OrderStateTransitioner {
    pub fn new(registry: Arc<OrderRegistry>) -> Self {
        OrderStateTransitioner { registry }
    }

    pub fn registry(&self) -> &Arc<OrderRegistry> {
        &self.registry
    }

    /// Moves the order from `from` to `to` if it is still in `from`.
    ///
    /// # Returns
    /// `false` if the move is not allowed by the state machine, the order left `from` in the
    /// meantime or it is no longer active. The drivers treat all of these as "skip this order".
    pub fn transition(&self, order: &OrderRef, from: OrderState, to: OrderState) -> bool {
        if !from.can_transition_to(to) {
            log::warn!("Refusing illegal order transition {} -> {}", from, to);
            return false;
        }

        if !self.registry.transition(order, from, to) {
            log::debug!("Order transition {} -> {} lost a race or the order is inactive", from, to);
            return false;
        }

        self.record(order, from, to);
        true
    }

    /// Moves the order to `to` from whatever state it currently holds.
    ///
    /// # Returns
    /// The previous state.
    ///
    /// # Errors
    /// `InstanceNotFound` if the order is not active or already terminal, `Unexpected` if the state
    /// machine does not allow the move.
    pub fn move_to(&self, order: &OrderRef, to: OrderState) -> Result<OrderState> {
        loop {
            let (id, current) = {
                let guard = order.read().expect("Order lock poisoned");
                (guard.id.clone(), guard.state())
            };

            let current = match current {
                Some(state) if !state.is_terminal() || state.can_transition_to(to) => state,
                _ => return Err(Error::InstanceNotFound(format!("Order {} is not active", id))),
            };

            if !current.can_transition_to(to) {
                return Err(Error::unexpected(format!("Order {} cannot go from {} to {}", id, current, to)));
            }

            if self.registry.transition(order, current, to) {
                self.record(order, current, to);
                return Ok(current);
            }

            // Either a concurrent move won (retry from the new state) or the order is gone.
            let still_active = self.registry.get(&id).is_some_and(|indexed| Arc::ptr_eq(&indexed, order));
            if !still_active {
                return Err(Error::InstanceNotFound(format!("Order {} is not active", id)));
            }
        }
    }

    /// Forced removal of an active order, whatever its state.
    pub fn deactivate(&self, order: &OrderRef) -> Result<OrderState> {
        self.move_to(order, OrderState::Deactivated)
    }

    fn record(&self, order: &OrderRef, from: OrderState, to: OrderState) {
        let guard = order.read().expect("Order lock poisoned");

        log::debug!("Order {} moved {} -> {}", guard.id, from, to);

        tracing::info!(
            target: ANALYTICS_TARGET,
            LogDescription = "Order state changed",
            OrderId = %guard.id,
            ResourceType = %guard.resource_type(),
            Requester = %guard.requester,
            Provider = %guard.provider,
            CloudName = %guard.cloud_name,
            FromState = %from,
            ToState = %to,
        );

        let mut event = AuditEvent::new();
        event
            .set(AuditParameter::LogDescription, "Order state changed")
            .set(AuditParameter::OrderId, guard.id.to_string())
            .set(AuditParameter::ResourceType, guard.resource_type().to_string())
            .set(AuditParameter::Requester, guard.requester.to_string())
            .set(AuditParameter::Provider, guard.provider.to_string())
            .set(AuditParameter::CloudName, guard.cloud_name.to_string())
            .set(AuditParameter::FromState, from.to_string())
            .set(AuditParameter::ToState, to.to_string());
        add_global_event(event);
    }
}
