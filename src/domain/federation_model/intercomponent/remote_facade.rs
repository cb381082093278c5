use std::sync::Arc;

use crate::domain::federation_model::cloud_connector::cloud_connector_trait::CloudConnector;
use crate::domain::federation_model::intercomponent::protocol::{Envelope, EnvelopeBody, RemotePayload, RemoteRequest};
use crate::domain::federation_model::intercomponent::rpc_channel::EnvelopeHandler;
use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::order::Order;
use crate::domain::federation_model::order::resource_type::{Operation, ResourceType};
use crate::domain::federation_model::order_controller::order_controller::OrderController;
use crate::domain::federation_model::plugins::aaa::aaa_controller::AaaController;
use crate::domain::federation_model::utils::id::{CloudName, MemberId};
use crate::error::{Error, Result};

/// Entry point for requests coming from peers.
///
/// Every request is authenticated against the sending member, authorized, and then handed to the
/// order controller or the local connector exactly as a local request would be.
#[derive(Debug)]
pub struct RemoteFacade {
    aaa: AaaController,
    controller: OrderController,
}

impl RemoteFacade {
    pub fn new(aaa: AaaController, controller: OrderController) -> Self {
        RemoteFacade { aaa, controller }
    }

    fn local_member_id(&self) -> &MemberId {
        self.controller.local_member_id()
    }

    fn local_connector(&self, cloud_name: &CloudName) -> Result<Arc<dyn CloudConnector>> {
        self.controller.connectors().get_cloud_connector(self.local_member_id(), cloud_name)
    }

    fn authorize(&self, sender: &MemberId, user: &FederationUser, cloud_name: &CloudName, operation: Operation, resource_type: ResourceType) -> Result<()> {
        self.aaa.authenticate_and_authorize(sender, user, cloud_name, operation, resource_type)
    }

    /// Local copy of an order the sender created here.
    fn local_copy(&self, sender: &MemberId, order: &Order) -> Result<Order> {
        let local = self.controller.get_order(&order.id, &order.federation_user)?;
        if &local.requester != sender {
            return Err(Error::Unauthorized(format!("Order {} was not requested by {}", order.id, sender)));
        }
        Ok(local)
    }

    fn dispatch(&self, sender: &MemberId, request: RemoteRequest) -> Result<RemotePayload> {
        match request {
            RemoteRequest::CreateOrder { order } => {
                self.authorize(sender, &order.federation_user, &order.cloud_name, Operation::Create, order.resource_type())?;
                if &order.requester != sender {
                    return Err(Error::Unauthorized(format!("{} cannot create orders on behalf of {}", sender, order.requester)));
                }
                if &order.provider != self.local_member_id() {
                    return Err(Error::InvalidParameter(format!("Order {} is provided by {}, not by {}", order.id, order.provider, self.local_member_id())));
                }
                self.controller.activate(order)?;
                Ok(RemotePayload::Done)
            }
            RemoteRequest::GetInstance { order } => {
                self.authorize(sender, &order.federation_user, &order.cloud_name, Operation::Get, order.resource_type())?;
                let local = self.local_copy(sender, &order)?;
                self.controller.get_resource_instance(&local.id).map(RemotePayload::Instance)
            }
            RemoteRequest::DeleteOrder { order } => {
                self.authorize(sender, &order.federation_user, &order.cloud_name, Operation::Delete, order.resource_type())?;
                let local = self.local_copy(sender, &order)?;
                self.controller.delete_order(&local.id)?;
                Ok(RemotePayload::Done)
            }
            RemoteRequest::GetUserQuota { cloud_name, user, resource_type } => {
                self.authorize(sender, &user, &cloud_name, Operation::GetUserQuota, resource_type)?;
                self.local_connector(&cloud_name)?.get_user_quota(&user, resource_type).map(RemotePayload::Quota)
            }
            RemoteRequest::GetImage { cloud_name, image_id, user } => {
                self.authorize(sender, &user, &cloud_name, Operation::GetImage, ResourceType::Compute)?;
                self.local_connector(&cloud_name)?.get_image(&image_id, &user).map(RemotePayload::Image)
            }
            RemoteRequest::GetAllImages { cloud_name, user } => {
                self.authorize(sender, &user, &cloud_name, Operation::GetAllImages, ResourceType::Compute)?;
                self.local_connector(&cloud_name)?.get_all_images(&user).map(RemotePayload::Images)
            }
            RemoteRequest::GenericRequest { cloud_name, request, user } => {
                self.authorize(sender, &user, &cloud_name, Operation::GenericRequest, ResourceType::GenericRequest)?;
                self.local_connector(&cloud_name)?.generic_request(&request, &user).map(RemotePayload::Generic)
            }
        }
    }
}

impl EnvelopeHandler for RemoteFacade {
    fn handle(&self, envelope: Envelope) -> Envelope {
        let result = match &envelope.body {
            EnvelopeBody::Request(_) if &envelope.target != self.local_member_id() => {
                Err(Error::InvalidParameter(format!("Envelope for {} delivered to {}", envelope.target, self.local_member_id())))
            }
            EnvelopeBody::Request(request) => {
                log::debug!("{} request {} from {}", request.name(), envelope.id, envelope.sender);
                self.dispatch(&envelope.sender, request.clone())
            }
            EnvelopeBody::Response(_) => Err(Error::InvalidParameter(format!("Envelope {} is not a request", envelope.id))),
        };

        if let Err(e) = &result {
            log::warn!("Request {} from {} failed: {}", envelope.id, envelope.sender, e);
        }
        envelope.reply(result)
    }
}
