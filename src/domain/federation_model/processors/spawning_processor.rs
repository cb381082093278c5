use crate::domain::federation_model::order::allocation::ComputeAllocation;
use crate::domain::federation_model::order::instance::{Instance, InstanceDetails, InstanceState};
use crate::domain::federation_model::order::order::{OrderPayload, OrderRef};
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order_controller::order_controller::OrderController;
use crate::domain::federation_model::processors::order_processor::{OrderProcessor, snapshot_in, store_fault};
use crate::error::{Error, Result};

/// Polls `Spawning` orders until their instance is ready or failed.
#[derive(Debug, Clone)]
pub struct SpawningProcessor {
    controller: OrderController,
}

impl SpawningProcessor {
    pub fn new(controller: OrderController) -> Self {
        SpawningProcessor { controller }
    }

    fn fulfill(&self, order_ref: &OrderRef, instance: &Instance) {
        {
            let mut order = order_ref.write().expect("Order lock poisoned");
            if let (OrderPayload::Compute(spec), Some(InstanceDetails::Compute { vcpu, ram_mb, .. })) = (&mut order.payload, &instance.details) {
                spec.actual_allocation = Some(ComputeAllocation::new(*vcpu, *ram_mb, 1));
            }
        }
        self.controller.transitioner().transition(order_ref, OrderState::Spawning, OrderState::Fulfilled);
    }

    fn fail(&self, order_ref: &OrderRef, message: String) {
        store_fault(order_ref, message);
        self.controller.transitioner().transition(order_ref, OrderState::Spawning, OrderState::FailedAfterSuccessfulRequest);
    }
}

impl OrderProcessor for SpawningProcessor {
    fn name(&self) -> &'static str {
        "SpawningProcessor"
    }

    fn state(&self) -> OrderState {
        OrderState::Spawning
    }

    fn process_order(&self, order_ref: &OrderRef) -> Result<()> {
        let Some(order) = snapshot_in(order_ref, OrderState::Spawning) else {
            return Ok(());
        };

        let polled = self.controller.connectors().connector_for(&order).and_then(|connector| connector.get_instance(&order));

        match polled {
            Ok(instance) => {
                order_ref.write().expect("Order lock poisoned").cached_instance_state = Some(instance.state);
                match instance.state {
                    InstanceState::Ready => self.fulfill(order_ref, &instance),
                    InstanceState::Failed => self.fail(order_ref, format!("Instance {} failed while spawning", instance.id)),
                    _ => {}
                }
                Ok(())
            }
            Err(Error::InstanceNotFound(message)) => {
                self.fail(order_ref, message);
                Ok(())
            }
            Err(Error::UnavailableProvider(message)) => {
                log::debug!("Provider of order {} unavailable, retrying later: {}", order.id, message);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
