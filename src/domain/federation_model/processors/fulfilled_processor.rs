use crate::domain::federation_model::order::instance::InstanceState;
use crate::domain::federation_model::order::order::OrderRef;
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order_controller::order_controller::OrderController;
use crate::domain::federation_model::processors::order_processor::{OrderProcessor, snapshot_in, store_fault};
use crate::error::{Error, Result};

/// Watches `Fulfilled` orders and marks those whose instance failed or vanished.
#[derive(Debug, Clone)]
pub struct FulfilledProcessor {
    controller: OrderController,
}

impl FulfilledProcessor {
    pub fn new(controller: OrderController) -> Self {
        FulfilledProcessor { controller }
    }

    fn fail(&self, order_ref: &OrderRef, message: String) {
        store_fault(order_ref, message);
        self.controller.transitioner().transition(order_ref, OrderState::Fulfilled, OrderState::FailedAfterSuccessfulRequest);
    }
}

impl OrderProcessor for FulfilledProcessor {
    fn name(&self) -> &'static str {
        "FulfilledProcessor"
    }

    fn state(&self) -> OrderState {
        OrderState::Fulfilled
    }

    fn process_order(&self, order_ref: &OrderRef) -> Result<()> {
        let Some(order) = snapshot_in(order_ref, OrderState::Fulfilled) else {
            return Ok(());
        };

        match self.controller.connectors().connector_for(&order).and_then(|connector| connector.get_instance(&order)) {
            Ok(instance) => {
                order_ref.write().expect("Order lock poisoned").cached_instance_state = Some(instance.state);
                if instance.state == InstanceState::Failed {
                    self.fail(order_ref, format!("Instance {} failed", instance.id));
                }
                Ok(())
            }
            Err(Error::InstanceNotFound(message)) => {
                self.fail(order_ref, message);
                Ok(())
            }
            Err(Error::UnavailableProvider(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
