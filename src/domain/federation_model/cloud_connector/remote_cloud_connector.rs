use std::sync::Arc;

use crate::domain::federation_model::cloud_connector::cloud_connector_trait::CloudConnector;
use crate::domain::federation_model::intercomponent::protocol::{Envelope, EnvelopeBody, RemotePayload, RemoteRequest};
use crate::domain::federation_model::intercomponent::rpc_channel::{RpcChannel, TransportError};
use crate::domain::federation_model::order::allocation::Quota;
use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::generic_request::{GenericRequest, GenericRequestResponse};
use crate::domain::federation_model::order::image::{Image, ImageCatalog};
use crate::domain::federation_model::order::instance::Instance;
use crate::domain::federation_model::order::order::Order;
use crate::domain::federation_model::order::resource_type::ResourceType;
use crate::domain::federation_model::utils::id::{CloudName, ImageId, InstanceId, MemberId};
use crate::error::{Error, Result};

/// Forwards every call to the provider member that owns the resource.
///
/// Transport failures (peer unreachable, timeout, garbled answer) all surface as
/// `UnavailableProvider`. Faults reported by the peer keep their kind.
#[derive(Debug, Clone)]
pub struct RemoteCloudConnector {
    local_member_id: MemberId,
    destination: MemberId,
    cloud_name: CloudName,
    channel: Arc<dyn RpcChannel>,
}

impl RemoteCloudConnector {
    pub fn new(local_member_id: MemberId, destination: MemberId, cloud_name: CloudName, channel: Arc<dyn RpcChannel>) -> Self {
        RemoteCloudConnector { local_member_id, destination, cloud_name, channel }
    }

    fn send(&self, request: RemoteRequest) -> Result<RemotePayload> {
        let operation = request.name();
        let envelope = Envelope::request(self.local_member_id.clone(), self.destination.clone(), request);
        let request_id = envelope.id.clone();

        let response = self.channel.call(envelope).map_err(|e| {
            log::warn!("{} to member {} failed: {}", operation, self.destination, e);
            Error::from(e)
        })?;

        if response.id != request_id || response.sender != self.destination {
            return Err(TransportError::Malformed(format!("Answer to {} from {} does not match the request", operation, self.destination)).into());
        }

        match response.body {
            EnvelopeBody::Response(result) => result.map_err(Error::from),
            EnvelopeBody::Request(_) => Err(TransportError::Malformed(format!("Member {} answered {} with a request", self.destination, operation)).into()),
        }
    }

    fn unexpected_payload(&self, operation: &str, payload: RemotePayload) -> Error {
        Error::UnavailableProvider(format!("Member {} answered {} with {:?}", self.destination, operation, payload))
    }
}

impl CloudConnector for RemoteCloudConnector {
    /// The provider keeps its own copy of the order under the same id, so the order id doubles as
    /// the instance id on the requesting side.
    fn request_instance(&self, order: &Order) -> Result<InstanceId> {
        match self.send(RemoteRequest::CreateOrder { order: order.clone() })? {
            RemotePayload::Done => Ok(order.id.cast()),
            other => Err(self.unexpected_payload("CreateOrder", other)),
        }
    }

    fn get_instance(&self, order: &Order) -> Result<Instance> {
        match self.send(RemoteRequest::GetInstance { order: order.clone() })? {
            RemotePayload::Instance(mut instance) => {
                instance.provider = Some(self.destination.clone());
                Ok(instance)
            }
            other => Err(self.unexpected_payload("GetInstance", other)),
        }
    }

    fn delete_instance(&self, order: &Order) -> Result<()> {
        match self.send(RemoteRequest::DeleteOrder { order: order.clone() })? {
            RemotePayload::Done => Ok(()),
            other => Err(self.unexpected_payload("DeleteOrder", other)),
        }
    }

    fn get_user_quota(&self, user: &FederationUser, resource_type: ResourceType) -> Result<Quota> {
        let request = RemoteRequest::GetUserQuota { cloud_name: self.cloud_name.clone(), user: user.clone(), resource_type };
        match self.send(request)? {
            RemotePayload::Quota(quota) => Ok(quota),
            other => Err(self.unexpected_payload("GetUserQuota", other)),
        }
    }

    fn get_image(&self, image_id: &ImageId, user: &FederationUser) -> Result<Image> {
        let request = RemoteRequest::GetImage { cloud_name: self.cloud_name.clone(), image_id: image_id.clone(), user: user.clone() };
        match self.send(request)? {
            RemotePayload::Image(image) => Ok(image),
            other => Err(self.unexpected_payload("GetImage", other)),
        }
    }

    fn get_all_images(&self, user: &FederationUser) -> Result<ImageCatalog> {
        match self.send(RemoteRequest::GetAllImages { cloud_name: self.cloud_name.clone(), user: user.clone() })? {
            RemotePayload::Images(images) => Ok(images),
            other => Err(self.unexpected_payload("GetAllImages", other)),
        }
    }

    fn generic_request(&self, request: &GenericRequest, user: &FederationUser) -> Result<GenericRequestResponse> {
        let request = RemoteRequest::GenericRequest { cloud_name: self.cloud_name.clone(), request: request.clone(), user: user.clone() };
        match self.send(request)? {
            RemotePayload::Generic(response) => Ok(response),
            other => Err(self.unexpected_payload("GenericRequest", other)),
        }
    }
}
