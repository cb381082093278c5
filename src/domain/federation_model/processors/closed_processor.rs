use crate::domain::federation_model::order::order::OrderRef;
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order_controller::order_controller::OrderController;
use crate::domain::federation_model::processors::order_processor::{OrderProcessor, snapshot_in};
use crate::error::{Error, Result};

/// Releases leftover instances of `Closed` orders and deactivates them.
///
/// An instance is left over when the provisioning call returned after the order was deleted.
#[derive(Debug, Clone)]
pub struct ClosedProcessor {
    controller: OrderController,
}

impl ClosedProcessor {
    pub fn new(controller: OrderController) -> Self {
        ClosedProcessor { controller }
    }
}

impl OrderProcessor for ClosedProcessor {
    fn name(&self) -> &'static str {
        "ClosedProcessor"
    }

    fn state(&self) -> OrderState {
        OrderState::Closed
    }

    fn process_order(&self, order_ref: &OrderRef) -> Result<()> {
        let Some(order) = snapshot_in(order_ref, OrderState::Closed) else {
            return Ok(());
        };

        if order.instance_id.is_some() {
            match self.controller.connectors().connector_for(&order)?.delete_instance(&order) {
                Ok(()) | Err(Error::InstanceNotFound(_)) => {}
                Err(e) => return Err(e),
            }
            log::info!("Released leftover instance of closed order {}", order.id);
            order_ref.write().expect("Order lock poisoned").instance_id = None;
        }

        self.controller.transitioner().deactivate(order_ref)?;
        Ok(())
    }
}
