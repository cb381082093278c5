use std::fmt::Debug;

use crate::domain::federation_model::order::order::{Order, OrderRef};
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order_registry::order_registry::OrderRegistry;
use crate::error::Result;

/// One background driver. It owns the orders of a single queue and pushes them forward.
pub trait OrderProcessor: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Queue this processor traverses.
    fn state(&self) -> OrderState;

    /// Handles one order of the queue. Orders that changed state since the cursor reached them
    /// must be skipped, not treated as errors.
    fn process_order(&self, order: &OrderRef) -> Result<()>;

    /// Traverses the queue once with a fresh cursor.
    ///
    /// # Returns
    /// Number of orders visited.
    fn run_pass(&self, registry: &OrderRegistry) -> usize {
        let Some(queue) = registry.queue(self.state()) else {
            log::error!("{} has no {} queue to traverse", self.name(), self.state());
            return 0;
        };

        let mut visited = 0;
        for order in queue.cursor() {
            visited += 1;
            if let Err(e) = self.process_order(&order) {
                let id = order.read().expect("Order lock poisoned").id.clone();
                log::warn!("{} failed on order {}: {}", self.name(), id, e);
            }
        }
        visited
    }
}

/// Copy of the order if it is still in `state`.
pub(crate) fn snapshot_in(order: &OrderRef, state: OrderState) -> Option<Order> {
    let guard = order.read().expect("Order lock poisoned");
    (guard.state() == Some(state)).then(|| guard.clone())
}

pub(crate) fn store_fault(order: &OrderRef, message: impl Into<String>) {
    order.write().expect("Order lock poisoned").fault_message = Some(message.into());
}
