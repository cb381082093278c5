use crate::domain::federation_model::order::order::{Order, OrderRef};
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order_controller::order_controller::OrderController;
use crate::domain::federation_model::processors::order_processor::{OrderProcessor, snapshot_in, store_fault};
use crate::domain::federation_model::utils::id::InstanceId;
use crate::error::{Error, Result};

/// Requests the instance of every `Open` order through the routed connector.
#[derive(Debug, Clone)]
pub struct OpenProcessor {
    controller: OrderController,
}

impl OpenProcessor {
    pub fn new(controller: OrderController) -> Self {
        OpenProcessor { controller }
    }

    /// Deletes an instance whose order was closed during the provisioning call. The close saw no
    /// instance id, so nothing else will release it.
    fn release_orphan(&self, order_ref: &OrderRef, mut order: Order, instance_id: InstanceId) -> Result<()> {
        order.instance_id = Some(instance_id);
        match self.controller.connectors().connector_for(&order)?.delete_instance(&order) {
            Ok(()) | Err(Error::InstanceNotFound(_)) => {}
            Err(e) => return Err(e),
        }
        log::info!("Released instance of order {} closed while it was requested", order.id);
        order_ref.write().expect("Order lock poisoned").instance_id = None;
        Ok(())
    }
}

impl OrderProcessor for OpenProcessor {
    fn name(&self) -> &'static str {
        "OpenProcessor"
    }

    fn state(&self) -> OrderState {
        OrderState::Open
    }

    fn process_order(&self, order_ref: &OrderRef) -> Result<()> {
        let Some(order) = snapshot_in(order_ref, OrderState::Open) else {
            return Ok(());
        };

        let transitioner = self.controller.transitioner();
        if !transitioner.transition(order_ref, OrderState::Open, OrderState::Pending) {
            return Ok(());
        }

        let requested = self.controller.connectors().connector_for(&order).and_then(|connector| connector.request_instance(&order));

        match requested {
            Ok(instance_id) => {
                log::debug!("Order {} got instance {}", order.id, instance_id);
                // Set before the move, a concurrent close must still see the instance to delete it.
                order_ref.write().expect("Order lock poisoned").instance_id = Some(instance_id.clone());
                if transitioner.transition(order_ref, OrderState::Pending, OrderState::Spawning) {
                    return Ok(());
                }

                let current = order_ref.read().expect("Order lock poisoned").state();
                log::info!("Order {} left PENDING while its instance was requested, now {:?}", order.id, current);
                match current {
                    Some(OrderState::Closed) | Some(OrderState::Deactivated) => self.release_orphan(order_ref, order, instance_id),
                    _ => Ok(()),
                }
            }
            Err(e) => {
                store_fault(order_ref, e.to_string());
                transitioner.transition(order_ref, OrderState::Pending, OrderState::FailedOnRequest);
                Err(e)
            }
        }
    }
}
