use std::fmt::Debug;

use crate::domain::federation_model::order::allocation::Quota;
use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::generic_request::{GenericRequest, GenericRequestResponse};
use crate::domain::federation_model::order::image::{Image, ImageCatalog};
use crate::domain::federation_model::order::instance::Instance;
use crate::domain::federation_model::order::order::Order;
use crate::domain::federation_model::order::resource_type::ResourceType;
use crate::domain::federation_model::utils::id::{ImageId, InstanceId};
use crate::error::Result;

/// Performs the cloud side of an order, either through local plugins or through a peer.
///
/// Connectors receive order snapshots, never shared handles: no registry or order lock may be
/// held while a connector call is in flight. Local and remote implementations report the same
/// error kinds.
pub trait CloudConnector: Send + Sync + Debug {
    /// # Returns
    /// The id under which the instance can be looked up later.
    fn request_instance(&self, order: &Order) -> Result<InstanceId>;

    fn get_instance(&self, order: &Order) -> Result<Instance>;

    fn delete_instance(&self, order: &Order) -> Result<()>;

    fn get_user_quota(&self, user: &FederationUser, resource_type: ResourceType) -> Result<Quota>;

    fn get_image(&self, image_id: &ImageId, user: &FederationUser) -> Result<Image>;

    fn get_all_images(&self, user: &FederationUser) -> Result<ImageCatalog>;

    fn generic_request(&self, request: &GenericRequest, user: &FederationUser) -> Result<GenericRequestResponse>;
}
