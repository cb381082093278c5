use serde::{Deserialize, Serialize};

use crate::domain::federation_model::order::order::Order;
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order::resource_type::ResourceType;
use crate::domain::federation_model::utils::id::{CloudName, InstanceId, MemberId, OrderId};
use crate::error::{Error, Result};

/// Health of the cloud resource backing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceState {
    /// Request accepted by the broker, the cloud has not been asked (or answered) yet.
    Dispatched,
    Creating,
    Ready,
    Failed,
    Unavailable,
    /// The order claims an instance that does not exist.
    Inconsistent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceDetails {
    Compute { hostname: String, vcpu: u32, ram_mb: u64, disk_gb: u64, ip_addresses: Vec<String> },
    Volume { name: String, size_gb: u64 },
    Network { name: String, cidr: String, gateway: Option<String> },
    Attachment { compute_id: InstanceId, volume_id: InstanceId, device: Option<String> },
}

/// Snapshot of a cloud resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub resource_type: ResourceType,
    pub state: InstanceState,
    /// `None` for placeholders synthesized before the cloud created anything.
    pub details: Option<InstanceDetails>,
    pub provider: Option<MemberId>,
}

impl Instance {
    pub fn new(id: InstanceId, resource_type: ResourceType, state: InstanceState, details: Option<InstanceDetails>) -> Self {
        Self { id, resource_type, state, details, provider: None }
    }

    /// Synthesizes the instance of an order that has no backing cloud resource yet.
    ///
    /// The state is derived from the order state. Closed or deactivated orders have no instance at all.
    pub fn placeholder_for(order: &Order) -> Result<Instance> {
        let state = match order.state() {
            None | Some(OrderState::Open) | Some(OrderState::Pending) => InstanceState::Dispatched,
            Some(OrderState::FailedOnRequest) | Some(OrderState::FailedAfterSuccessfulRequest) => InstanceState::Failed,
            Some(OrderState::Spawning) | Some(OrderState::Fulfilled) => InstanceState::Inconsistent,
            Some(OrderState::Closed) | Some(OrderState::Deactivated) => {
                return Err(Error::InstanceNotFound(format!("Order {} is no longer active", order.id)));
            }
        };

        let mut instance = Instance::new(order.id.cast(), order.resource_type(), state, None);
        instance.provider = Some(order.provider.clone());
        Ok(instance)
    }
}

/// Lightweight status record returned by status listings, built from cached order data only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStatus {
    pub order_id: OrderId,
    pub provider: MemberId,
    pub cloud_name: CloudName,
    pub state: Option<InstanceState>,
}

impl InstanceStatus {
    pub fn of(order: &Order) -> Self {
        Self { order_id: order.id.clone(), provider: order.provider.clone(), cloud_name: order.cloud_name.clone(), state: order.cached_instance_state }
    }
}
