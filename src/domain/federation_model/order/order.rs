use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use crate::domain::federation_model::order::allocation::{Allocation, ComputeAllocation, VolumeAllocation};
use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::instance::InstanceState;
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order::resource_type::ResourceType;
use crate::domain::federation_model::utils::id::{CloudName, ImageId, InstanceId, MemberId, OrderId};

/// Shared handle of an active order. Queues and the registry hold clones of the same handle,
/// queue membership is decided by pointer identity.
pub type OrderRef = Arc<RwLock<Order>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeSpec {
    pub name: String,
    pub vcpu: u32,
    pub ram_mb: u64,
    pub disk_gb: u64,
    pub image_id: ImageId,
    pub public_key: Option<String>,
    /// Ids of network *orders* the compute should be connected to.
    #[serde(default)]
    pub network_order_ids: Vec<OrderId>,
    /// Set from the live instance once it is ready.
    pub actual_allocation: Option<ComputeAllocation>,
}

impl ComputeSpec {
    pub fn requested_allocation(&self) -> ComputeAllocation {
        ComputeAllocation::new(self.vcpu, self.ram_mb, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpec {
    pub name: String,
    pub size_gb: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkAllocationMode {
    Dynamic,
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub cidr: String,
    pub gateway: Option<String>,
    pub allocation_mode: NetworkAllocationMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSpec {
    pub compute_order_id: OrderId,
    pub volume_order_id: OrderId,
    pub device: Option<String>,
}

/// Resource specific part of an order. Each variant carries only its own attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderPayload {
    Compute(ComputeSpec),
    Volume(VolumeSpec),
    Network(NetworkSpec),
    Attachment(AttachmentSpec),
}

impl OrderPayload {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            OrderPayload::Compute(_) => ResourceType::Compute,
            OrderPayload::Volume(_) => ResourceType::Volume,
            OrderPayload::Network(_) => ResourceType::Network,
            OrderPayload::Attachment(_) => ResourceType::Attachment,
        }
    }
}

/// One resource request tracked by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Member that created the order.
    pub requester: MemberId,
    /// Member that must fulfill it. Equal to `requester` for local orders.
    pub provider: MemberId,
    pub cloud_name: CloudName,
    pub federation_user: FederationUser,
    pub payload: OrderPayload,
    pub instance_id: Option<InstanceId>,
    pub cached_instance_state: Option<InstanceState>,
    /// Last failure reported while driving the order, if any.
    pub fault_message: Option<String>,
    pub created_at: DateTime<Utc>,
    state: Option<OrderState>,
}

impl Order {
    pub fn new(requester: MemberId, provider: MemberId, cloud_name: CloudName, federation_user: FederationUser, payload: OrderPayload) -> Self {
        Self {
            id: OrderId::generate(),
            requester,
            provider,
            cloud_name,
            federation_user,
            payload,
            instance_id: None,
            cached_instance_state: None,
            fault_message: None,
            created_at: Utc::now(),
            state: None,
        }
    }

    pub fn into_ref(self) -> OrderRef {
        Arc::new(RwLock::new(self))
    }

    pub fn resource_type(&self) -> ResourceType {
        self.payload.resource_type()
    }

    /// `None` until the order was activated.
    pub fn state(&self) -> Option<OrderState> {
        self.state
    }

    /// Only the registry changes the state of an active order, it keeps the state and the queue in sync.
    pub(crate) fn set_state(&mut self, state: OrderState) {
        self.state = Some(state);
    }

    /// Clears the state so the order can be (re)activated, e.g. a copy received from a peer.
    pub(crate) fn reset_state(&mut self) {
        self.state = None;
    }

    pub fn is_local(&self, local_member_id: &MemberId) -> bool {
        &self.provider == local_member_id
    }

    /// Resources held by this order. `None` for types without an allocation concept.
    pub fn allocation(&self) -> Option<Allocation> {
        match &self.payload {
            OrderPayload::Compute(spec) => Some(Allocation::Compute(spec.actual_allocation.unwrap_or_else(|| spec.requested_allocation()))),
            OrderPayload::Volume(spec) => Some(Allocation::Volume(VolumeAllocation::new(spec.size_gb, 1))),
            OrderPayload::Network(_) | OrderPayload::Attachment(_) => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_state(mut self, state: OrderState) -> Self {
        self.state = Some(state);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compute_order() -> Order {
        let user = FederationUser::new("m1", "token", "user-1", "alice");
        let spec = ComputeSpec {
            name: "vm".to_string(),
            vcpu: 2,
            ram_mb: 4096,
            disk_gb: 20,
            image_id: ImageId::new("ubuntu"),
            public_key: None,
            network_order_ids: vec![],
            actual_allocation: None,
        };
        Order::new(MemberId::new("m1"), MemberId::new("m1"), CloudName::new("default"), user, OrderPayload::Compute(spec))
    }

    #[test]
    fn test_new_order_has_no_state_and_no_instance() {
        let order = compute_order();

        assert!(order.state().is_none());
        assert!(order.instance_id.is_none());
        assert!(!order.id.is_empty());
        assert_eq!(order.resource_type(), ResourceType::Compute);
        assert!(order.is_local(&MemberId::new("m1")));
    }

    #[test]
    fn test_allocation_prefers_actual_values() {
        let mut order = compute_order();
        assert_eq!(order.allocation(), Some(Allocation::Compute(ComputeAllocation::new(2, 4096, 1))));

        if let OrderPayload::Compute(spec) = &mut order.payload {
            spec.actual_allocation = Some(ComputeAllocation::new(4, 8192, 1));
        }
        assert_eq!(order.allocation(), Some(Allocation::Compute(ComputeAllocation::new(4, 8192, 1))));
    }
}
