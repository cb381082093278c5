use std::sync::Arc;

use crate::domain::federation_model::cloud_connector::cloud_connector_trait::CloudConnector;
use crate::domain::federation_model::order::allocation::Quota;
use crate::domain::federation_model::order::federation_user::{CloudToken, FederationUser};
use crate::domain::federation_model::order::generic_request::{GenericRequest, GenericRequestResponse};
use crate::domain::federation_model::order::image::{Image, ImageCatalog};
use crate::domain::federation_model::order::instance::Instance;
use crate::domain::federation_model::order::order::{Order, OrderPayload};
use crate::domain::federation_model::order::order_state::OrderState;
use crate::domain::federation_model::order::resource_type::ResourceType;
use crate::domain::federation_model::order_registry::order_registry::OrderRegistry;
use crate::domain::federation_model::plugins::interoperability::cloud_plugin_trait::{AttachmentRequest, CloudPlugins, ComputeRequest};
use crate::domain::federation_model::plugins::mapper::mapper_trait::FederationToLocalMapper;
use crate::domain::federation_model::utils::id::{CloudName, ImageId, InstanceId, OrderId};
use crate::error::{Error, Result};

/// Serves orders of one local cloud through its plugins.
#[derive(Debug, Clone)]
pub struct LocalCloudConnector {
    cloud_name: CloudName,
    plugins: CloudPlugins,
    mapper: Arc<dyn FederationToLocalMapper>,
    /// Used to resolve order ids referenced by compute and attachment orders.
    registry: Arc<OrderRegistry>,
}

impl LocalCloudConnector {
    pub fn new(cloud_name: CloudName, plugins: CloudPlugins, mapper: Arc<dyn FederationToLocalMapper>, registry: Arc<OrderRegistry>) -> Self {
        LocalCloudConnector { cloud_name, plugins, mapper, registry }
    }

    pub fn cloud_name(&self) -> &CloudName {
        &self.cloud_name
    }

    fn token_for(&self, user: &FederationUser) -> Result<CloudToken> {
        self.mapper.map(user)
    }

    /// Instance id behind the referenced order, which must be active and of `expected` type.
    fn resolve_instance_id(&self, order_id: &OrderId, expected: ResourceType) -> Result<InstanceId> {
        let order = self.registry.get(order_id).ok_or_else(|| Error::InvalidParameter(format!("Referenced order {} does not exist", order_id)))?;
        let order = order.read().expect("Order lock poisoned");

        if order.resource_type() != expected {
            return Err(Error::InvalidParameter(format!("Referenced order {} is not a {} order", order_id, expected)));
        }

        order.instance_id.clone().ok_or_else(|| Error::InvalidParameter(format!("Referenced order {} has no instance yet", order_id)))
    }
}

impl CloudConnector for LocalCloudConnector {
    fn request_instance(&self, order: &Order) -> Result<InstanceId> {
        let token = self.token_for(&order.federation_user)?;

        let instance_id = match &order.payload {
            OrderPayload::Compute(spec) => {
                let network_ids = spec.network_order_ids.iter().map(|id| self.resolve_instance_id(id, ResourceType::Network)).collect::<Result<Vec<_>>>()?;
                self.plugins.compute.request_instance(&ComputeRequest { spec: spec.clone(), network_ids }, &token)?
            }
            OrderPayload::Volume(spec) => self.plugins.volume.request_instance(spec, &token)?,
            OrderPayload::Network(spec) => self.plugins.network.request_instance(spec, &token)?,
            OrderPayload::Attachment(spec) => {
                let request = AttachmentRequest {
                    compute_id: self.resolve_instance_id(&spec.compute_order_id, ResourceType::Compute)?,
                    volume_id: self.resolve_instance_id(&spec.volume_order_id, ResourceType::Volume)?,
                    device: spec.device.clone(),
                };
                self.plugins.attachment.request_instance(&request, &token)?
            }
        };

        if instance_id.is_empty() {
            return Err(Error::unexpected(format!("{} plugin of cloud {} returned an empty instance id for order {}", order.resource_type(), self.cloud_name, order.id)));
        }

        Ok(instance_id)
    }

    fn get_instance(&self, order: &Order) -> Result<Instance> {
        if matches!(order.state(), Some(OrderState::Closed) | Some(OrderState::Deactivated)) {
            return Err(Error::InstanceNotFound(format!("Order {} is closed", order.id)));
        }

        let Some(instance_id) = &order.instance_id else {
            return Instance::placeholder_for(order);
        };

        let token = self.token_for(&order.federation_user)?;
        let mut instance = match &order.payload {
            OrderPayload::Compute(_) => self.plugins.compute.get_instance(instance_id, &token)?,
            OrderPayload::Volume(_) => self.plugins.volume.get_instance(instance_id, &token)?,
            OrderPayload::Network(_) => self.plugins.network.get_instance(instance_id, &token)?,
            OrderPayload::Attachment(_) => self.plugins.attachment.get_instance(instance_id, &token)?,
        };

        instance.provider = Some(order.provider.clone());
        Ok(instance)
    }

    fn delete_instance(&self, order: &Order) -> Result<()> {
        let Some(instance_id) = &order.instance_id else {
            return Ok(());
        };

        let token = self.token_for(&order.federation_user)?;
        match &order.payload {
            OrderPayload::Compute(_) => self.plugins.compute.delete_instance(instance_id, &token),
            OrderPayload::Volume(_) => self.plugins.volume.delete_instance(instance_id, &token),
            OrderPayload::Network(_) => self.plugins.network.delete_instance(instance_id, &token),
            OrderPayload::Attachment(_) => self.plugins.attachment.delete_instance(instance_id, &token),
        }
    }

    fn get_user_quota(&self, user: &FederationUser, resource_type: ResourceType) -> Result<Quota> {
        let token = self.token_for(user)?;
        self.plugins.quota.get_user_quota(resource_type, &token)
    }

    fn get_image(&self, image_id: &ImageId, user: &FederationUser) -> Result<Image> {
        let token = self.token_for(user)?;
        self.plugins.image.get_image(image_id, &token)
    }

    fn get_all_images(&self, user: &FederationUser) -> Result<ImageCatalog> {
        let token = self.token_for(user)?;
        self.plugins.image.get_all_images(&token)
    }

    fn generic_request(&self, request: &GenericRequest, user: &FederationUser) -> Result<GenericRequestResponse> {
        let token = self.token_for(user)?;
        self.plugins.generic.generic_request(request, &token)
    }
}
