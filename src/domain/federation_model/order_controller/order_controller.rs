use std::sync::Arc;

use crate::domain::federation_model::cloud_connector::cloud_connector_factory::CloudConnectorFactory;
use crate::domain::federation_model::cloud_connector::cloud_connector_trait::CloudConnector;
use crate::domain::federation_model::order::allocation::Allocation;
use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::instance::{Instance, InstanceStatus};
use crate::domain::federation_model::order::order::{Order, OrderRef};
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order::resource_type::ResourceType;
use crate::domain::federation_model::order_registry::order_registry::OrderRegistry;
use crate::domain::federation_model::order_registry::order_state_transitioner::OrderStateTransitioner;
use crate::domain::federation_model::utils::id::{MemberId, OrderId};
use crate::error::{Error, Result};

/// Request CRUD, status and allocation queries over the order registry.
///
/// The controller only reads orders through snapshots, so no lock is held while a connector
/// (possibly a remote peer) is working.
#[derive(Debug, Clone)]
pub struct OrderController {
    local_member_id: MemberId,
    registry: Arc<OrderRegistry>,
    transitioner: OrderStateTransitioner,
    connectors: Arc<CloudConnectorFactory>,
}

impl OrderController {
    pub fn new(local_member_id: MemberId, registry: Arc<OrderRegistry>, connectors: Arc<CloudConnectorFactory>) -> Self {
        let transitioner = OrderStateTransitioner::new(registry.clone());
        OrderController { local_member_id, registry, transitioner, connectors }
    }

    pub fn local_member_id(&self) -> &MemberId {
        &self.local_member_id
    }

    pub fn registry(&self) -> &Arc<OrderRegistry> {
        &self.registry
    }

    pub fn transitioner(&self) -> &OrderStateTransitioner {
        &self.transitioner
    }

    pub fn connectors(&self) -> &Arc<CloudConnectorFactory> {
        &self.connectors
    }

    /// Registers a new order in `Open`.
    ///
    /// # Returns
    /// The order id, generated if the order came without one.
    ///
    /// # Errors
    /// `InvalidParameter` if requester, provider or federation user are missing, if a local order
    /// names no cloud and there is no default cloud, or if the id is already in use.
    pub fn activate(&self, mut order: Order) -> Result<OrderId> {
        if order.id.is_empty() {
            order.id = OrderId::generate();
        }
        if order.requester.is_empty() {
            return Err(Error::InvalidParameter("Order has no requester".to_string()));
        }
        if order.provider.is_empty() {
            return Err(Error::InvalidParameter("Order has no provider".to_string()));
        }
        if !order.federation_user.is_valid() {
            return Err(Error::InvalidParameter("Order has no federation user".to_string()));
        }
        if order.cloud_name.is_empty() {
            match self.connectors.default_cloud() {
                Some(default_cloud) if order.is_local(&self.local_member_id) => order.cloud_name = default_cloud.clone(),
                _ => return Err(Error::InvalidParameter("Order names no cloud".to_string())),
            }
        }

        order.reset_state();
        let id = order.id.clone();
        let description = format!("{} order {} from {} for {}/{}", order.resource_type(), id, order.requester, order.provider, order.cloud_name);

        self.registry.put(order).ok_or_else(|| Error::InvalidParameter(format!("Order {} already exists", id)))?;

        log::info!("Activated {}", description);
        Ok(id)
    }

    /// Active order handle by id.
    pub fn get_active(&self, id: &OrderId) -> Result<OrderRef> {
        self.registry.get(id).ok_or_else(|| Error::InstanceNotFound(format!("Order {} not found", id)))
    }

    /// Snapshot of an order owned by `user`.
    ///
    /// # Errors
    /// `InstanceNotFound` if the id is unknown, `Unauthorized` if the order belongs to another principal.
    pub fn get_order(&self, id: &OrderId, user: &FederationUser) -> Result<Order> {
        let order = Self::snapshot(&self.get_active(id)?);

        if !order.federation_user.is_same_principal(user) {
            log::warn!("User {} of {} asked for order {} of another user", user.user_id, user.token_provider, id);
            return Err(Error::Unauthorized(format!("Order {} is not accessible", id)));
        }

        Ok(order)
    }

    /// Deletes the backing instance, if any, and moves the order to `Closed`.
    ///
    /// # Errors
    /// `InvalidParameter` for an empty id, `InstanceNotFound` if the order is unknown or already
    /// closed, and any connector failure other than `InstanceNotFound`.
    pub fn delete_order(&self, id: &OrderId) -> Result<()> {
        if id.is_empty() {
            return Err(Error::InvalidParameter("Order id is missing".to_string()));
        }

        let order_ref = self.get_active(id)?;
        let order = Self::snapshot(&order_ref);
        if order.state() == Some(OrderState::Closed) {
            return Err(Error::InstanceNotFound(format!("Order {} is already closed", id)));
        }

        if order.instance_id.is_some() {
            match self.connectors.connector_for(&order)?.delete_instance(&order) {
                Ok(()) => {}
                Err(Error::InstanceNotFound(message)) => log::debug!("Instance of order {} was already gone: {}", id, message),
                Err(e) => return Err(e),
            }
            order_ref.write().expect("Order lock poisoned").instance_id = None;
        }

        self.transitioner.move_to(&order_ref, OrderState::Closed)?;
        log::info!("Closed order {}", id);
        Ok(())
    }

    /// Instance backing the order. Orders without an instance get a placeholder derived from
    /// their state, otherwise the connector is asked and the answer is cached on the order.
    pub fn get_resource_instance(&self, id: &OrderId) -> Result<Instance> {
        let order_ref = self.get_active(id)?;
        let order = Self::snapshot(&order_ref);

        if order.instance_id.is_none() {
            return Instance::placeholder_for(&order);
        }

        let connector: Arc<dyn CloudConnector> = self.connectors.connector_for(&order)?;
        let instance = connector.get_instance(&order)?;

        order_ref.write().expect("Order lock poisoned").cached_instance_state = Some(instance.state);
        Ok(instance)
    }

    /// Cached status of every instance-backed order of `user` with the given type. No live calls.
    pub fn get_instances_status(&self, user: &FederationUser, resource_type: ResourceType) -> Vec<InstanceStatus> {
        OrderState::QUEUED
            .into_iter()
            .filter(OrderState::lists_instance_status)
            .flat_map(|state| self.registry.orders_in_queue(state))
            .filter_map(|order_ref| {
                let order = order_ref.read().expect("Order lock poisoned");
                (order.resource_type() == resource_type && order.federation_user.is_same_principal(user)).then(|| InstanceStatus::of(&order))
            })
            .collect()
    }

    /// Sum of the allocations of the `Fulfilled` orders of `user` at `provider`.
    ///
    /// # Errors
    /// `Unexpected` if the resource type has no allocation concept.
    pub fn get_user_allocation(&self, provider: &MemberId, user: &FederationUser, resource_type: ResourceType) -> Result<Allocation> {
        let empty = Allocation::empty(resource_type).ok_or_else(|| Error::unexpected(format!("No allocation is defined for {} orders", resource_type)))?;

        let allocation = self
            .registry
            .orders_in_queue(OrderState::Fulfilled)
            .iter()
            .filter_map(|order_ref| {
                let order = order_ref.read().expect("Order lock poisoned");
                let matches = &order.provider == provider && order.resource_type() == resource_type && order.federation_user.is_same_principal(user);
                if matches { order.allocation() } else { None }
            })
            .fold(empty, |sum, allocation| sum.checked_add(&allocation).unwrap_or(sum));

        Ok(allocation)
    }

    fn snapshot(order_ref: &OrderRef) -> Order {
        order_ref.read().expect("Order lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::federation_model::order::order::{OrderPayload, VolumeSpec};
    use crate::domain::federation_model::utils::id::CloudName;

    fn controller() -> OrderController {
        let registry = Arc::new(OrderRegistry::new());
        let connectors = Arc::new(CloudConnectorFactory::new(MemberId::new("m1"), registry.clone()));
        OrderController::new(MemberId::new("m1"), registry, connectors)
    }

    fn order(user: FederationUser) -> Order {
        let payload = OrderPayload::Volume(VolumeSpec { name: "v".to_string(), size_gb: 1 });
        Order::new(MemberId::new("m1"), MemberId::new("m1"), CloudName::new("default"), user, payload)
    }

    #[test]
    fn test_activate_requires_routing_fields() {
        let controller = controller();
        let mut missing_provider = order(FederationUser::new("m1", "t", "alice", "alice"));
        missing_provider.provider = MemberId::new("");
        let mut missing_user = order(FederationUser::new("m1", "t", "", "alice"));
        missing_user.federation_user.user_id.clear();

        assert!(matches!(controller.activate(missing_provider), Err(Error::InvalidParameter(_))));
        assert!(matches!(controller.activate(missing_user), Err(Error::InvalidParameter(_))));
        assert_eq!(controller.registry().active_count(), 0);
    }

    #[test]
    fn test_activate_generates_missing_id() {
        let controller = controller();
        let mut anonymous = order(FederationUser::new("m1", "t", "alice", "alice"));
        anonymous.id = OrderId::new("");

        let id = controller.activate(anonymous).unwrap();

        assert!(!id.is_empty());
        assert_eq!(controller.registry().orders_in_queue(OrderState::Open).len(), 1);
    }

    #[test]
    fn test_other_principal_is_unauthorized() {
        let controller = controller();
        let alice = FederationUser::new("m1", "t", "alice", "alice");
        let id = controller.activate(order(alice.clone())).unwrap();

        assert!(controller.get_order(&id, &alice).is_ok());
        let bob = FederationUser::new("m1", "t", "bob", "bob");
        assert!(matches!(controller.get_order(&id, &bob), Err(Error::Unauthorized(_))));
        assert!(matches!(controller.get_order(&OrderId::new("nope"), &alice), Err(Error::InstanceNotFound(_))));
    }

    #[test]
    fn test_generic_request_has_no_allocation() {
        let controller = controller();
        let alice = FederationUser::new("m1", "t", "alice", "alice");

        let result = controller.get_user_allocation(&MemberId::new("m1"), &alice, ResourceType::GenericRequest);

        assert!(matches!(result, Err(Error::Unexpected(_))));
    }
}
