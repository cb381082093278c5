use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::domain::federation_model::order::order::{Order, OrderRef};
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order_queue::synchronized_order_queue::SynchronizedOrderQueue;
use crate::domain::federation_model::utils::id::OrderId;

/// Process-wide bookkeeping of active orders: an index by id plus one queue per queued state.
///
/// Every membership change runs under the index write lock, so an observer holding the index lock
/// never sees an order that is indexed but in no queue (or in two). Lock order is always
/// registry, then queue, then order. Callers must not hold an order lock while calling in here.
///
/// The registry does not interpret order content. Transition rules live in the
/// `OrderStateTransitioner`.
#[derive(Debug)]
pub struct OrderRegistry {
    active: RwLock<HashMap<OrderId, OrderRef>>,
    queues: HashMap<OrderState, SynchronizedOrderQueue>,
}

impl Default for OrderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderRegistry {
    pub fn new() -> Self {
        let queues = OrderState::QUEUED.iter().map(|state| (*state, SynchronizedOrderQueue::new())).collect();
        OrderRegistry { active: RwLock::new(HashMap::new()), queues }
    }

    fn lock_active(&self) -> RwLockWriteGuard<'_, HashMap<OrderId, OrderRef>> {
        self.active.write().expect("Registry lock poisoned")
    }

    /// Registers a new order and enqueues it according to its state (`Open` if unset).
    ///
    /// # Returns
    /// `None` if an order with the same id is already active or the state is not a queued one.
    pub fn put(&self, mut order: Order) -> Option<OrderRef> {
        let state = order.state().unwrap_or(OrderState::Open);
        let queue = self.queues.get(&state)?;
        order.set_state(state);

        let mut active = self.lock_active();
        if active.contains_key(&order.id) {
            return None;
        }

        let id = order.id.clone();
        let order_ref = order.into_ref();
        active.insert(id, order_ref.clone());
        queue.append(order_ref.clone());
        Some(order_ref)
    }

    pub fn get(&self, id: &OrderId) -> Option<OrderRef> {
        self.active.read().expect("Registry lock poisoned").get(id).cloned()
    }

    /// Moves the order from its current queue to the one of `new_state`, whatever the current state is.
    /// Moving to `Deactivated` drops the order from the registry.
    ///
    /// # Returns
    /// `false` if the order is not active.
    pub fn move_to_state(&self, order: &OrderRef, new_state: OrderState) -> bool {
        self.move_if(order, None, new_state)
    }

    /// Compare-and-move: moves only if the order is still in `expected`.
    pub fn transition(&self, order: &OrderRef, expected: OrderState, new_state: OrderState) -> bool {
        self.move_if(order, Some(expected), new_state)
    }

    /// Removes the order from its queue and from the active index and marks it `Deactivated`.
    pub fn deactivate(&self, order: &OrderRef) -> bool {
        self.move_if(order, None, OrderState::Deactivated)
    }

    fn move_if(&self, order: &OrderRef, expected: Option<OrderState>, new_state: OrderState) -> bool {
        let mut active = self.lock_active();

        let (id, current) = {
            let guard = order.read().expect("Order lock poisoned");
            (guard.id.clone(), guard.state())
        };

        // The handle must be the one we index, a detached copy with the same id does not count.
        match active.get(&id) {
            Some(indexed) if Arc::ptr_eq(indexed, order) => {}
            _ => return false,
        }

        let Some(current) = current else {
            return false;
        };
        if expected.is_some_and(|expected| expected != current) {
            return false;
        }

        let target_queue = match new_state {
            OrderState::Deactivated => None,
            state => match self.queues.get(&state) {
                Some(queue) => Some(queue),
                None => return false,
            },
        };

        if let Some(queue) = self.queues.get(&current) {
            queue.remove_if_present(order);
        }

        match target_queue {
            Some(queue) => queue.append(order.clone()),
            None => {
                active.remove(&id);
            }
        }

        order.write().expect("Order lock poisoned").set_state(new_state);
        true
    }

    /// Snapshot of every active order, in no particular order.
    pub fn all_active_orders(&self) -> Vec<OrderRef> {
        self.active.read().expect("Registry lock poisoned").values().cloned().collect()
    }

    /// Snapshot of one queue, in queue order. Empty for `Deactivated`.
    pub fn orders_in_queue(&self, state: OrderState) -> Vec<OrderRef> {
        self.queues.get(&state).map(SynchronizedOrderQueue::snapshot).unwrap_or_default()
    }

    /// Queue handle, used by the drivers to open their own cursors.
    pub fn queue(&self, state: OrderState) -> Option<&SynchronizedOrderQueue> {
        self.queues.get(&state)
    }

    pub fn active_count(&self) -> usize {
        self.active.read().expect("Registry lock poisoned").len()
    }

    /// Checks that every active order sits in exactly the queue matching its state.
    /// Holds the index lock for the whole check, so it sees a quiescent picture.
    pub fn is_consistent(&self) -> bool {
        let active = self.active.read().expect("Registry lock poisoned");

        let queued: usize = self.queues.values().map(SynchronizedOrderQueue::len).sum();
        if queued != active.len() {
            return false;
        }

        active.values().all(|order| {
            let state = order.read().expect("Order lock poisoned").state();
            let Some(state) = state else {
                return false;
            };
            self.queues.iter().all(|(queue_state, queue)| queue.contains(order) == (*queue_state == state))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::federation_model::order::federation_user::FederationUser;
    use crate::domain::federation_model::order::order::{OrderPayload, VolumeSpec};
    use crate::domain::federation_model::utils::id::{CloudName, MemberId};

    fn volume_order() -> Order {
        let user = FederationUser::new("m1", "token", "user", "user");
        let payload = OrderPayload::Volume(VolumeSpec { name: "v".to_string(), size_gb: 10 });
        Order::new(MemberId::new("m1"), MemberId::new("m1"), CloudName::new("default"), user, payload)
    }

    fn state_of(order: &OrderRef) -> Option<OrderState> {
        order.read().unwrap().state()
    }

    #[test]
    fn test_put_enqueues_in_open() {
        let registry = OrderRegistry::new();
        let order = registry.put(volume_order()).unwrap();

        assert_eq!(state_of(&order), Some(OrderState::Open));
        assert_eq!(registry.orders_in_queue(OrderState::Open).len(), 1);
        assert!(registry.get(&order.read().unwrap().id).is_some());
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_put_rejects_duplicate_id() {
        let registry = OrderRegistry::new();
        let order = volume_order();
        let copy = order.clone();

        assert!(registry.put(order).is_some());
        assert!(registry.put(copy).is_none());
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn test_move_keeps_single_queue_membership() {
        let registry = OrderRegistry::new();
        let order = registry.put(volume_order()).unwrap();

        assert!(registry.move_to_state(&order, OrderState::Pending));
        assert!(registry.move_to_state(&order, OrderState::Spawning));

        assert_eq!(state_of(&order), Some(OrderState::Spawning));
        assert!(registry.orders_in_queue(OrderState::Open).is_empty());
        assert!(registry.orders_in_queue(OrderState::Pending).is_empty());
        assert_eq!(registry.orders_in_queue(OrderState::Spawning).len(), 1);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_transition_is_compare_and_move() {
        let registry = OrderRegistry::new();
        let order = registry.put(volume_order()).unwrap();

        assert!(!registry.transition(&order, OrderState::Pending, OrderState::Spawning));
        assert_eq!(state_of(&order), Some(OrderState::Open));
        assert!(registry.transition(&order, OrderState::Open, OrderState::Pending));
        assert_eq!(state_of(&order), Some(OrderState::Pending));
    }

    #[test]
    fn test_deactivate_drops_from_index_and_queues() {
        let registry = OrderRegistry::new();
        let order = registry.put(volume_order()).unwrap();
        let id = order.read().unwrap().id.clone();

        assert!(registry.deactivate(&order));

        assert!(registry.get(&id).is_none());
        assert_eq!(state_of(&order), Some(OrderState::Deactivated));
        assert!(registry.orders_in_queue(OrderState::Open).is_empty());
        assert!(!registry.deactivate(&order));
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_detached_copy_is_not_moved() {
        let registry = OrderRegistry::new();
        let order = registry.put(volume_order()).unwrap();
        let detached = order.read().unwrap().clone().into_ref();

        assert!(!registry.move_to_state(&detached, OrderState::Closed));
        assert_eq!(state_of(&order), Some(OrderState::Open));
    }

    #[test]
    fn test_concurrent_moves_keep_invariant() {
        let registry = Arc::new(OrderRegistry::new());
        let orders: Vec<OrderRef> = (0..50).map(|_| registry.put(volume_order()).unwrap()).collect();

        let handles: Vec<_> = orders
            .chunks(10)
            .map(|chunk| {
                let registry = registry.clone();
                let chunk = chunk.to_vec();
                std::thread::spawn(move || {
                    for order in &chunk {
                        registry.transition(order, OrderState::Open, OrderState::Pending);
                        registry.transition(order, OrderState::Pending, OrderState::Spawning);
                        registry.move_to_state(order, OrderState::Closed);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.orders_in_queue(OrderState::Closed).len(), 50);
        assert!(registry.is_consistent());
    }
}
