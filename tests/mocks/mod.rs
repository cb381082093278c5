#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use federation_broker::domain::federation_model::broker::broker_config::{AuthorizationConfig, BrokerConfig, MapperConfig, ProcessorIntervals};
use federation_broker::domain::federation_model::cloud_connector::cloud_connector_factory::CloudConnectorFactory;
use federation_broker::domain::federation_model::intercomponent::protocol::{Envelope, RemotePayload};
use federation_broker::domain::federation_model::intercomponent::rpc_channel::{RpcChannel, TransportError};
use federation_broker::domain::federation_model::order::allocation::{Allocation, ComputeAllocation, Quota, VolumeAllocation};
use federation_broker::domain::federation_model::order::federation_user::{CloudToken, FederationUser};
use federation_broker::domain::federation_model::order::generic_request::{GenericRequest, GenericRequestResponse};
use federation_broker::domain::federation_model::order::image::{Image, ImageCatalog};
use federation_broker::domain::federation_model::order::instance::{Instance, InstanceDetails, InstanceState};
use federation_broker::domain::federation_model::order::order::{ComputeSpec, NetworkSpec, Order, OrderPayload, VolumeSpec};
use federation_broker::domain::federation_model::order::resource_type::ResourceType;
use federation_broker::domain::federation_model::order_controller::order_controller::OrderController;
use federation_broker::domain::federation_model::order_registry::order_registry::OrderRegistry;
use federation_broker::domain::federation_model::plugins::interoperability::cloud_plugin_trait::{
    AttachmentRequest, CloudPlugins, ComputeRequest, GenericRequestPlugin, ImagePlugin, InstancePlugin, QuotaPlugin,
};
use federation_broker::domain::federation_model::plugins::mapper::one_to_one_mapper::OneToOneMapper;
use federation_broker::domain::federation_model::plugins::simulated_cloud::simulated_cloud::SimulatedCloudConfig;
use federation_broker::domain::federation_model::utils::id::{CloudName, ImageId, InstanceId, MemberId};
use federation_broker::error::{Error, Result};

pub const LOCAL: &str = "m1";
pub const PEER: &str = "m2";
pub const CLOUD: &str = "default";

pub fn user_of(member: &str) -> FederationUser {
    FederationUser::new(member, "token-alice", "alice", "Alice")
}

pub fn compute_spec(vcpu: u32, ram_mb: u64) -> ComputeSpec {
    ComputeSpec {
        name: "vm".to_string(),
        vcpu,
        ram_mb,
        disk_gb: 10,
        image_id: ImageId::new("ubuntu"),
        public_key: None,
        network_order_ids: vec![],
        actual_allocation: None,
    }
}

pub fn compute_order(requester: &str, provider: &str, vcpu: u32, ram_mb: u64) -> Order {
    Order::new(MemberId::new(requester), MemberId::new(provider), CloudName::new(CLOUD), user_of(requester), OrderPayload::Compute(compute_spec(vcpu, ram_mb)))
}

pub fn volume_order(requester: &str, provider: &str, size_gb: u64) -> Order {
    let payload = OrderPayload::Volume(VolumeSpec { name: "data".to_string(), size_gb });
    Order::new(MemberId::new(requester), MemberId::new(provider), CloudName::new(CLOUD), user_of(requester), payload)
}

/// Plugin set that records every call and answers with fixed values.
#[derive(Debug)]
pub struct CountingCloud {
    calls: Mutex<HashMap<&'static str, usize>>,
    instance_id: String,
    instance_state: Mutex<InstanceState>,
    fail_requests_with: Mutex<Option<Error>>,
    held: Mutex<bool>,
    released: Condvar,
}

impl CountingCloud {
    pub fn new(instance_id: &str) -> Arc<Self> {
        Arc::new(CountingCloud {
            calls: Mutex::new(HashMap::new()),
            instance_id: instance_id.to_string(),
            instance_state: Mutex::new(InstanceState::Ready),
            fail_requests_with: Mutex::new(None),
            held: Mutex::new(false),
            released: Condvar::new(),
        })
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn set_state(&self, state: InstanceState) {
        *self.instance_state.lock().unwrap() = state;
    }

    pub fn fail_requests_with(&self, error: Error) {
        *self.fail_requests_with.lock().unwrap() = Some(error);
    }

    /// Instance requests block after being counted until [`CountingCloud::release_requests`].
    pub fn hold_requests(&self) {
        *self.held.lock().unwrap() = true;
    }

    pub fn release_requests(&self) {
        *self.held.lock().unwrap() = false;
        self.released.notify_all();
    }

    fn record(&self, name: &'static str) {
        *self.calls.lock().unwrap().entry(name).or_insert(0) += 1;
    }

    fn request(&self, name: &'static str) -> Result<InstanceId> {
        self.record(name);
        let held = self.held.lock().unwrap();
        drop(self.released.wait_while(held, |held| *held).unwrap());
        match self.fail_requests_with.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(InstanceId::new(self.instance_id.clone())),
        }
    }

    fn instance(&self, name: &'static str, id: &InstanceId, resource_type: ResourceType, details: InstanceDetails) -> Result<Instance> {
        self.record(name);
        Ok(Instance::new(id.clone(), resource_type, *self.instance_state.lock().unwrap(), Some(details)))
    }
}

impl InstancePlugin<ComputeRequest> for CountingCloud {
    fn request_instance(&self, _request: &ComputeRequest, _token: &CloudToken) -> Result<InstanceId> {
        self.request("compute.request")
    }

    fn get_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<Instance> {
        let details = InstanceDetails::Compute { hostname: "vm".to_string(), vcpu: 2, ram_mb: 4096, disk_gb: 10, ip_addresses: vec!["10.0.0.5".to_string()] };
        self.instance("compute.get", instance_id, ResourceType::Compute, details)
    }

    fn delete_instance(&self, _instance_id: &InstanceId, _token: &CloudToken) -> Result<()> {
        self.record("compute.delete");
        Ok(())
    }
}

impl InstancePlugin<VolumeSpec> for CountingCloud {
    fn request_instance(&self, _request: &VolumeSpec, _token: &CloudToken) -> Result<InstanceId> {
        self.request("volume.request")
    }

    fn get_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<Instance> {
        self.instance("volume.get", instance_id, ResourceType::Volume, InstanceDetails::Volume { name: "data".to_string(), size_gb: 10 })
    }

    fn delete_instance(&self, _instance_id: &InstanceId, _token: &CloudToken) -> Result<()> {
        self.record("volume.delete");
        Ok(())
    }
}

impl InstancePlugin<NetworkSpec> for CountingCloud {
    fn request_instance(&self, _request: &NetworkSpec, _token: &CloudToken) -> Result<InstanceId> {
        self.request("network.request")
    }

    fn get_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<Instance> {
        let details = InstanceDetails::Network { name: "net".to_string(), cidr: "10.0.0.0/24".to_string(), gateway: None };
        self.instance("network.get", instance_id, ResourceType::Network, details)
    }

    fn delete_instance(&self, _instance_id: &InstanceId, _token: &CloudToken) -> Result<()> {
        self.record("network.delete");
        Ok(())
    }
}

impl InstancePlugin<AttachmentRequest> for CountingCloud {
    fn request_instance(&self, _request: &AttachmentRequest, _token: &CloudToken) -> Result<InstanceId> {
        self.request("attachment.request")
    }

    fn get_instance(&self, instance_id: &InstanceId, _token: &CloudToken) -> Result<Instance> {
        let details = InstanceDetails::Attachment { compute_id: InstanceId::new("vm-1"), volume_id: InstanceId::new("vol-1"), device: None };
        self.instance("attachment.get", instance_id, ResourceType::Attachment, details)
    }

    fn delete_instance(&self, _instance_id: &InstanceId, _token: &CloudToken) -> Result<()> {
        self.record("attachment.delete");
        Ok(())
    }
}

impl ImagePlugin for CountingCloud {
    fn get_all_images(&self, _token: &CloudToken) -> Result<ImageCatalog> {
        self.record("image.all");
        Ok(BTreeMap::from([(ImageId::new("ubuntu"), "Ubuntu".to_string())]))
    }

    fn get_image(&self, image_id: &ImageId, _token: &CloudToken) -> Result<Image> {
        self.record("image.get");
        Ok(Image { id: image_id.clone(), name: "Ubuntu".to_string(), size_bytes: 1, min_disk_gb: 1, min_ram_mb: 1, status: "ACTIVE".to_string() })
    }
}

impl QuotaPlugin for CountingCloud {
    fn get_user_quota(&self, resource_type: ResourceType, _token: &CloudToken) -> Result<Quota> {
        self.record("quota.get");
        match resource_type {
            ResourceType::Volume => Ok(Quota::new(Allocation::Volume(VolumeAllocation::new(100, 10)), Allocation::Volume(VolumeAllocation::new(0, 0)))),
            _ => Ok(Quota::new(Allocation::Compute(ComputeAllocation::new(8, 16384, 4)), Allocation::Compute(ComputeAllocation::new(0, 0, 0)))),
        }
    }
}

impl GenericRequestPlugin for CountingCloud {
    fn generic_request(&self, request: &GenericRequest, _token: &CloudToken) -> Result<GenericRequestResponse> {
        self.record("generic");
        Ok(GenericRequestResponse { content: request.url.clone(), status_code: 200 })
    }
}

#[derive(Debug, Clone)]
pub enum ChannelBehavior {
    Timeout,
    Unreachable,
    Reply(std::result::Result<RemotePayload, Error>),
}

/// Channel that never leaves the process and counts its calls.
#[derive(Debug)]
pub struct CountingChannel {
    calls: AtomicUsize,
    behavior: ChannelBehavior,
}

impl CountingChannel {
    pub fn new(behavior: ChannelBehavior) -> Arc<Self> {
        Arc::new(CountingChannel { calls: AtomicUsize::new(0), behavior })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RpcChannel for CountingChannel {
    fn call(&self, envelope: Envelope) -> std::result::Result<Envelope, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ChannelBehavior::Timeout => Err(TransportError::Timeout { peer: envelope.target.to_string(), timeout: Duration::from_millis(10) }),
            ChannelBehavior::Unreachable => Err(TransportError::Unreachable(envelope.target.to_string())),
            ChannelBehavior::Reply(result) => Ok(envelope.reply(result.clone())),
        }
    }
}

/// Controller of member `m1` serving the cloud `default` with `cloud`.
pub fn controller_with(cloud: Arc<CountingCloud>, channel: Option<Arc<dyn RpcChannel>>) -> OrderController {
    let registry = Arc::new(OrderRegistry::new());
    let mut factory = CloudConnectorFactory::new(MemberId::new(LOCAL), registry.clone()).with_cloud(CloudName::new(CLOUD), CloudPlugins::from_single(cloud), Arc::new(OneToOneMapper));
    if let Some(channel) = channel {
        factory = factory.with_channel(channel);
    }
    OrderController::new(MemberId::new(LOCAL), registry, Arc::new(factory))
}

pub fn simulated_cloud(name: &str, spawn_polls: u32) -> SimulatedCloudConfig {
    SimulatedCloudConfig {
        name: CloudName::new(name),
        compute_limit: ComputeAllocation::new(8, 16384, 4),
        volume_limit: VolumeAllocation::new(100, 4),
        spawn_polls,
        images: vec![Image {
            id: ImageId::new("ubuntu"),
            name: "Ubuntu 24.04".to_string(),
            size_bytes: 1 << 30,
            min_disk_gb: 10,
            min_ram_mb: 512,
            status: "ACTIVE".to_string(),
        }],
    }
}

pub fn broker_config(member: &str, spawn_polls: u32) -> BrokerConfig {
    BrokerConfig {
        local_member_id: MemberId::new(member),
        clouds: vec![simulated_cloud(CLOUD, spawn_polls)],
        mapper: MapperConfig::OneToOne,
        authorization: AuthorizationConfig::AllowAll,
        rpc: None,
        processors: ProcessorIntervals::default(),
        audit_file: None,
    }
}
