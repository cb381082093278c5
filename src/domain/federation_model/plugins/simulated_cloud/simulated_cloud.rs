use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use rand::Rng;

use crate::domain::federation_model::order::allocation::{Allocation, ComputeAllocation, Quota, VolumeAllocation};
use crate::domain::federation_model::order::federation_user::CloudToken;
use crate::domain::federation_model::order::generic_request::{GenericRequest, GenericRequestResponse};
use crate::domain::federation_model::order::image::{Image, ImageCatalog};
use crate::domain::federation_model::order::instance::{Instance, InstanceDetails, InstanceState};
use crate::domain::federation_model::order::order::{NetworkSpec, VolumeSpec};
use crate::domain::federation_model::order::resource_type::ResourceType;
use crate::domain::federation_model::plugins::interoperability::cloud_plugin_trait::{
    AttachmentRequest, ComputeRequest, GenericRequestPlugin, ImagePlugin, InstancePlugin, QuotaPlugin,
};
use crate::domain::federation_model::utils::id::{CloudName, ImageId, InstanceId};
use crate::error::{Error, Result};

/// Capacity and behavior of one simulated cloud account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedCloudConfig {
    pub name: CloudName,
    /// Per-account compute limit.
    pub compute_limit: ComputeAllocation,
    /// Per-account volume limit.
    pub volume_limit: VolumeAllocation,
    /// Number of `get_instance` calls an instance stays in `Creating` before it is `Ready`.
    pub spawn_polls: u32,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone)]
struct SimulatedInstance {
    resource_type: ResourceType,
    state: InstanceState,
    polls_left: u32,
    details: InstanceDetails,
    /// Cloud user that owns the instance, quota is accounted per owner.
    owner: String,
    allocation: Option<Allocation>,
}

#[derive(Debug, Default)]
struct CloudState {
    instances: HashMap<InstanceId, SimulatedInstance>,
    next_id: u64,
}

/// In-memory cloud implementing every plugin trait.
///
/// Instances are created in `Creating` and become `Ready` after `spawn_polls` polls. Compute and
/// volume requests are checked against the per-account limits.
#[derive(Debug)]
pub struct SimulatedCloud {
    config: SimulatedCloudConfig,
    state: Mutex<CloudState>,
}

impl SimulatedCloud {
    pub fn new(config: SimulatedCloudConfig) -> Self {
        SimulatedCloud { config, state: Mutex::new(CloudState::default()) }
    }

    pub fn name(&self) -> &CloudName {
        &self.config.name
    }

    fn lock(&self) -> MutexGuard<'_, CloudState> {
        self.state.lock().expect("Simulated cloud lock poisoned")
    }

    /// Number of instances the cloud currently holds.
    pub fn instance_count(&self) -> usize {
        self.lock().instances.len()
    }

    /// Puts an instance into `Failed`, used to simulate a crash of the underlying resource.
    pub fn mark_failed(&self, instance_id: &InstanceId) -> bool {
        match self.lock().instances.get_mut(instance_id) {
            Some(instance) => {
                instance.state = InstanceState::Failed;
                true
            }
            None => false,
        }
    }

    fn used_by(state: &CloudState, owner: &str, resource_type: ResourceType) -> Option<Allocation> {
        let empty = Allocation::empty(resource_type)?;
        Some(
            state
                .instances
                .values()
                .filter(|instance| instance.owner == owner)
                .filter_map(|instance| instance.allocation)
                .fold(empty, |sum, allocation| sum.checked_add(&allocation).unwrap_or(sum)),
        )
    }

    fn limit_of(&self, resource_type: ResourceType) -> Option<Allocation> {
        match resource_type {
            ResourceType::Compute => Some(Allocation::Compute(self.config.compute_limit)),
            ResourceType::Volume => Some(Allocation::Volume(self.config.volume_limit)),
            _ => None,
        }
    }

    fn check_quota(&self, state: &CloudState, owner: &str, request: Allocation) -> Result<()> {
        let resource_type = request.resource_type();
        let (Some(limit), Some(used)) = (self.limit_of(resource_type), Self::used_by(state, owner, resource_type)) else {
            return Ok(());
        };

        let fits = match (Quota::new(limit, used).available(), request) {
            (Allocation::Compute(available), Allocation::Compute(request)) => available.fits(&request),
            (Allocation::Volume(available), Allocation::Volume(request)) => available.fits(&request),
            _ => false,
        };

        if fits {
            Ok(())
        } else {
            Err(Error::QuotaExceeded(format!("{} quota of {} at cloud {} is exhausted", resource_type, owner, self.config.name)))
        }
    }

    fn insert(&self, state: &mut CloudState, prefix: &str, resource_type: ResourceType, details: InstanceDetails, owner: &str, allocation: Option<Allocation>) -> InstanceId {
        state.next_id += 1;
        let id = InstanceId::new(format!("{}-{}", prefix, state.next_id));

        let instance = SimulatedInstance {
            resource_type,
            state: if self.config.spawn_polls == 0 { InstanceState::Ready } else { InstanceState::Creating },
            polls_left: self.config.spawn_polls,
            details,
            owner: owner.to_string(),
            allocation,
        };
        state.instances.insert(id.clone(), instance);

        log::debug!("Cloud {} created {} instance {}", self.config.name, resource_type, id);
        id
    }

    fn poll(&self, instance_id: &InstanceId, resource_type: ResourceType) -> Result<Instance> {
        let mut state = self.lock();
        let instance = state
            .instances
            .get_mut(instance_id)
            .filter(|instance| instance.resource_type == resource_type)
            .ok_or_else(|| Error::InstanceNotFound(format!("Cloud {} has no {} instance {}", self.config.name, resource_type, instance_id)))?;

        if instance.state == InstanceState::Creating {
            instance.polls_left = instance.polls_left.saturating_sub(1);
            if instance.polls_left == 0 {
                instance.state = InstanceState::Ready;
            }
        }

        Ok(Instance::new(instance_id.clone(), resource_type, instance.state, Some(instance.details.clone())))
    }

    fn remove(&self, instance_id: &InstanceId, resource_type: ResourceType) -> Result<()> {
        let mut state = self.lock();
        match state.instances.get(instance_id) {
            Some(instance) if instance.resource_type == resource_type => {
                state.instances.remove(instance_id);
                log::debug!("Cloud {} deleted {} instance {}", self.config.name, resource_type, instance_id);
                Ok(())
            }
            _ => Err(Error::InstanceNotFound(format!("Cloud {} has no {} instance {}", self.config.name, resource_type, instance_id))),
        }
    }

    fn random_private_ip() -> String {
        let mut rng = rand::rng();
        format!("10.{}.{}.{}", rng.random_range(0..=255), rng.random_range(0..=255), rng.random_range(1..=254))
    }
}

impl InstancePlugin<ComputeRequest> for SimulatedCloud {
    fn request_instance(&self, request: &ComputeRequest, token: &CloudToken) -> Result<InstanceId> {
        let spec = &request.spec;
        if spec.vcpu == 0 || spec.ram_mb == 0 {
            return Err(Error::InvalidParameter("A compute instance needs at least one vCPU and some RAM".to_string()));
        }
        if !self.config.images.is_empty() && !self.config.images.iter().any(|image| image.id == spec.image_id) {
            return Err(Error::InvalidParameter(format!("Unknown image {}", spec.image_id)));
        }

        let mut state = self.lock();
        for network_id in &request.network_ids {
            if !state.instances.get(network_id).is_some_and(|instance| instance.resource_type == ResourceType::Network) {
                return Err(Error::InvalidParameter(format!("Unknown network {}", network_id)));
            }
        }

        let allocation = Allocation::Compute(spec.requested_allocation());
        self.check_quota(&state, &token.user_id, allocation)?;

        let ip_addresses = std::iter::once(Self::random_private_ip()).chain(request.network_ids.iter().map(|_| Self::random_private_ip())).collect();
        let details = InstanceDetails::Compute { hostname: spec.name.clone(), vcpu: spec.vcpu, ram_mb: spec.ram_mb, disk_gb: spec.disk_gb, ip_addresses };

        Ok(self.insert(&mut state, "vm", ResourceType::Compute, details, &token.user_id, Some(allocation)))
    }

    fn get_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<Instance> {
        self.poll(instance_id, ResourceType::Compute)
    }

    fn delete_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<()> {
        self.remove(instance_id, ResourceType::Compute)
    }
}

impl InstancePlugin<VolumeSpec> for SimulatedCloud {
    fn request_instance(&self, request: &VolumeSpec, token: &CloudToken) -> Result<InstanceId> {
        if request.size_gb == 0 {
            return Err(Error::InvalidParameter("Volume size must be positive".to_string()));
        }

        let mut state = self.lock();
        let allocation = Allocation::Volume(VolumeAllocation::new(request.size_gb, 1));
        self.check_quota(&state, &token.user_id, allocation)?;

        let details = InstanceDetails::Volume { name: request.name.clone(), size_gb: request.size_gb };
        Ok(self.insert(&mut state, "vol", ResourceType::Volume, details, &token.user_id, Some(allocation)))
    }

    fn get_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<Instance> {
        self.poll(instance_id, ResourceType::Volume)
    }

    fn delete_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<()> {
        self.remove(instance_id, ResourceType::Volume)
    }
}

impl InstancePlugin<NetworkSpec> for SimulatedCloud {
    fn request_instance(&self, request: &NetworkSpec, token: &CloudToken) -> Result<InstanceId> {
        if request.cidr.trim().is_empty() {
            return Err(Error::InvalidParameter("A network needs a CIDR".to_string()));
        }

        let mut state = self.lock();
        let details = InstanceDetails::Network { name: request.name.clone(), cidr: request.cidr.clone(), gateway: request.gateway.clone() };
        Ok(self.insert(&mut state, "net", ResourceType::Network, details, &token.user_id, None))
    }

    fn get_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<Instance> {
        self.poll(instance_id, ResourceType::Network)
    }

    fn delete_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<()> {
        self.remove(instance_id, ResourceType::Network)
    }
}

impl InstancePlugin<AttachmentRequest> for SimulatedCloud {
    fn request_instance(&self, request: &AttachmentRequest, token: &CloudToken) -> Result<InstanceId> {
        let mut state = self.lock();

        let exists = |id: &InstanceId, resource_type: ResourceType| state.instances.get(id).is_some_and(|instance| instance.resource_type == resource_type);
        if !exists(&request.compute_id, ResourceType::Compute) || !exists(&request.volume_id, ResourceType::Volume) {
            return Err(Error::InvalidParameter(format!("Cannot attach {} to {}", request.volume_id, request.compute_id)));
        }

        let details = InstanceDetails::Attachment { compute_id: request.compute_id.clone(), volume_id: request.volume_id.clone(), device: request.device.clone() };
        Ok(self.insert(&mut state, "att", ResourceType::Attachment, details, &token.user_id, None))
    }

    fn get_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<Instance> {
        self.poll(instance_id, ResourceType::Attachment)
    }

    fn delete_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<()> {
        self.remove(instance_id, ResourceType::Attachment)
    }
}

impl ImagePlugin for SimulatedCloud {
    fn get_all_images(&self, _token: &CloudToken) -> Result<ImageCatalog> {
        Ok(self.config.images.iter().map(|image| (image.id.clone(), image.name.clone())).collect())
    }

    fn get_image(&self, image_id: &ImageId, _token: &CloudToken) -> Result<Image> {
        self.config
            .images
            .iter()
            .find(|image| &image.id == image_id)
            .cloned()
            .ok_or_else(|| Error::InstanceNotFound(format!("Cloud {} has no image {}", self.config.name, image_id)))
    }
}

impl QuotaPlugin for SimulatedCloud {
    fn get_user_quota(&self, resource_type: ResourceType, token: &CloudToken) -> Result<Quota> {
        let state = self.lock();
        match (self.limit_of(resource_type), Self::used_by(&state, &token.user_id, resource_type)) {
            (Some(total), Some(used)) => Ok(Quota::new(total, used)),
            _ => Err(Error::InvalidParameter(format!("No quota is kept for {}", resource_type))),
        }
    }
}

impl GenericRequestPlugin for SimulatedCloud {
    fn generic_request(&self, request: &GenericRequest, _token: &CloudToken) -> Result<GenericRequestResponse> {
        let content = serde_json::to_string(request).map_err(|e| Error::unexpected(format!("Could not echo generic request: {}", e)))?;
        Ok(GenericRequestResponse { content, status_code: 200 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::federation_model::order::generic_request::HttpMethod;
    use crate::domain::federation_model::order::order::ComputeSpec;

    fn cloud(spawn_polls: u32) -> SimulatedCloud {
        SimulatedCloud::new(SimulatedCloudConfig {
            name: CloudName::new("sim"),
            compute_limit: ComputeAllocation::new(4, 8192, 2),
            volume_limit: VolumeAllocation::new(100, 5),
            spawn_polls,
            images: vec![Image {
                id: ImageId::new("ubuntu"),
                name: "Ubuntu 24.04".to_string(),
                size_bytes: 1 << 30,
                min_disk_gb: 10,
                min_ram_mb: 512,
                status: "ACTIVE".to_string(),
            }],
        })
    }

    fn compute(vcpu: u32) -> ComputeRequest {
        ComputeRequest {
            spec: ComputeSpec {
                name: "vm".to_string(),
                vcpu,
                ram_mb: 1024,
                disk_gb: 10,
                image_id: ImageId::new("ubuntu"),
                public_key: None,
                network_order_ids: vec![],
                actual_allocation: None,
            },
            network_ids: vec![],
        }
    }

    fn token() -> CloudToken {
        CloudToken::new("m1", "alice", "secret")
    }

    #[test]
    fn test_instance_becomes_ready_after_polls() {
        let cloud = cloud(2);
        let id = InstancePlugin::<ComputeRequest>::request_instance(&cloud, &compute(1), &token()).unwrap();

        let first = InstancePlugin::<ComputeRequest>::get_instance(&cloud, &id, &token()).unwrap();
        let second = InstancePlugin::<ComputeRequest>::get_instance(&cloud, &id, &token()).unwrap();

        assert_eq!(first.state, InstanceState::Creating);
        assert_eq!(second.state, InstanceState::Ready);
    }

    #[test]
    fn test_compute_quota_is_enforced() {
        let cloud = cloud(0);

        InstancePlugin::<ComputeRequest>::request_instance(&cloud, &compute(3), &token()).unwrap();
        let result = InstancePlugin::<ComputeRequest>::request_instance(&cloud, &compute(2), &token());

        assert!(matches!(result, Err(Error::QuotaExceeded(_))));
        let quota = cloud.get_user_quota(ResourceType::Compute, &token()).unwrap();
        assert_eq!(quota.available(), Allocation::Compute(ComputeAllocation::new(1, 7168, 1)));
    }

    #[test]
    fn test_unknown_image_is_invalid() {
        let cloud = cloud(0);
        let mut request = compute(1);
        request.spec.image_id = ImageId::new("windows");

        let result = InstancePlugin::<ComputeRequest>::request_instance(&cloud, &request, &token());
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_attachment_needs_existing_instances() {
        let cloud = cloud(0);
        let vm = InstancePlugin::<ComputeRequest>::request_instance(&cloud, &compute(1), &token()).unwrap();
        let vol = InstancePlugin::<VolumeSpec>::request_instance(&cloud, &VolumeSpec { name: "data".to_string(), size_gb: 10 }, &token()).unwrap();

        let good = AttachmentRequest { compute_id: vm.clone(), volume_id: vol, device: None };
        let bad = AttachmentRequest { compute_id: vm, volume_id: InstanceId::new("vol-404"), device: None };

        assert!(InstancePlugin::<AttachmentRequest>::request_instance(&cloud, &good, &token()).is_ok());
        assert!(InstancePlugin::<AttachmentRequest>::request_instance(&cloud, &bad, &token()).is_err());
    }

    #[test]
    fn test_delete_and_type_mismatch() {
        let cloud = cloud(0);
        let vm = InstancePlugin::<ComputeRequest>::request_instance(&cloud, &compute(1), &token()).unwrap();

        assert!(InstancePlugin::<VolumeSpec>::delete_instance(&cloud, &vm, &token()).is_err());
        assert!(InstancePlugin::<ComputeRequest>::delete_instance(&cloud, &vm, &token()).is_ok());
        assert!(matches!(InstancePlugin::<ComputeRequest>::get_instance(&cloud, &vm, &token()), Err(Error::InstanceNotFound(_))));
        assert_eq!(cloud.instance_count(), 0);
    }

    #[test]
    fn test_images_and_generic_echo() {
        let cloud = cloud(0);

        let catalog = cloud.get_all_images(&token()).unwrap();
        assert_eq!(catalog.get(&ImageId::new("ubuntu")).map(String::as_str), Some("Ubuntu 24.04"));

        let response = cloud.generic_request(&GenericRequest::new(HttpMethod::Get, "/servers"), &token()).unwrap();
        assert_eq!(response.status_code, 200);
        assert!(response.content.contains("/servers"));
    }
}
