use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::federation_model::order::federation_user::CloudToken;
use crate::domain::federation_model::order::generic_request::{GenericRequest, GenericRequestResponse};
use crate::domain::federation_model::order::image::{Image, ImageCatalog};
use crate::domain::federation_model::order::instance::Instance;
use crate::domain::federation_model::order::order::{ComputeSpec, NetworkSpec, VolumeSpec};
use crate::domain::federation_model::order::allocation::Quota;
use crate::domain::federation_model::order::resource_type::ResourceType;
use crate::domain::federation_model::utils::id::{ImageId, InstanceId};
use crate::error::Result;

/// Compute request as seen by a cloud: network order ids are already resolved to instance ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeRequest {
    pub spec: ComputeSpec,
    pub network_ids: Vec<InstanceId>,
}

/// Attachment request with compute and volume order ids resolved to instance ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRequest {
    pub compute_id: InstanceId,
    pub volume_id: InstanceId,
    pub device: Option<String>,
}

/// Cloud-specific provisioning of one resource type.
///
/// Implementations talk to exactly one cloud and only know cloud credentials, never federation
/// identities. The type parameter is the request shape of the resource type.
pub trait InstancePlugin<S>: Send + Sync + Debug {
    /// Starts provisioning.
    ///
    /// # Returns
    /// The id the cloud assigned to the new instance. An empty id is a contract violation.
    ///
    /// # Errors
    /// `InvalidParameter`, `QuotaExceeded`, `NoAvailableResources` or `Unauthorized`.
    fn request_instance(&self, request: &S, token: &CloudToken) -> Result<InstanceId>;

    /// Live snapshot of the instance. Fails with `InstanceNotFound` if the cloud does not know it.
    fn get_instance(&self, instance_id: &InstanceId, token: &CloudToken) -> Result<Instance>;

    fn delete_instance(&self, instance_id: &InstanceId, token: &CloudToken) -> Result<()>;
}

pub type ComputePlugin = dyn InstancePlugin<ComputeRequest>;
pub type VolumePlugin = dyn InstancePlugin<VolumeSpec>;
pub type NetworkPlugin = dyn InstancePlugin<NetworkSpec>;
pub type AttachmentPlugin = dyn InstancePlugin<AttachmentRequest>;

pub trait ImagePlugin: Send + Sync + Debug {
    fn get_all_images(&self, token: &CloudToken) -> Result<ImageCatalog>;

    fn get_image(&self, image_id: &ImageId, token: &CloudToken) -> Result<Image>;
}

pub trait QuotaPlugin: Send + Sync + Debug {
    /// Limits and usage of the token's account for one resource type.
    fn get_user_quota(&self, resource_type: ResourceType, token: &CloudToken) -> Result<Quota>;
}

pub trait GenericRequestPlugin: Send + Sync + Debug {
    fn generic_request(&self, request: &GenericRequest, token: &CloudToken) -> Result<GenericRequestResponse>;
}

/// The fixed set of plugins serving one local cloud.
#[derive(Debug, Clone)]
pub struct CloudPlugins {
    pub compute: Arc<ComputePlugin>,
    pub volume: Arc<VolumePlugin>,
    pub network: Arc<NetworkPlugin>,
    pub attachment: Arc<AttachmentPlugin>,
    pub image: Arc<dyn ImagePlugin>,
    pub quota: Arc<dyn QuotaPlugin>,
    pub generic: Arc<dyn GenericRequestPlugin>,
}

impl CloudPlugins {
    /// Uses one object for every plugin slot, e.g. a simulated cloud.
    pub fn from_single<P>(plugin: Arc<P>) -> Self
    where
        P: InstancePlugin<ComputeRequest>
            + InstancePlugin<VolumeSpec>
            + InstancePlugin<NetworkSpec>
            + InstancePlugin<AttachmentRequest>
            + ImagePlugin
            + QuotaPlugin
            + GenericRequestPlugin
            + 'static,
    {
        CloudPlugins {
            compute: plugin.clone(),
            volume: plugin.clone(),
            network: plugin.clone(),
            attachment: plugin.clone(),
            image: plugin.clone(),
            quota: plugin.clone(),
            generic: plugin,
        }
    }
}
