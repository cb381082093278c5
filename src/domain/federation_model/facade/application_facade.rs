use crate::domain::federation_model::order::allocation::{Allocation, Quota};
use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::generic_request::{GenericRequest, GenericRequestResponse};
use crate::domain::federation_model::order::image::{Image, ImageCatalog};
use crate::domain::federation_model::order::instance::{Instance, InstanceStatus};
use crate::domain::federation_model::order::order::Order;
use crate::domain::federation_model::order::resource_type::{Operation, ResourceType};
use crate::domain::federation_model::order_controller::order_controller::OrderController;
use crate::domain::federation_model::plugins::aaa::aaa_controller::AaaController;
use crate::domain::federation_model::utils::id::{CloudName, ImageId, MemberId, OrderId};
use crate::error::{Error, Result};

/// Entry point for users of this member.
///
/// Users authenticate against the local member. Orders may still be provided by a peer, routing
/// happens in the controller and the connectors.
#[derive(Debug)]
pub struct ApplicationFacade {
    aaa: AaaController,
    controller: OrderController,
}

impl ApplicationFacade {
    pub fn new(aaa: AaaController, controller: OrderController) -> Self {
        ApplicationFacade { aaa, controller }
    }

    pub fn controller(&self) -> &OrderController {
        &self.controller
    }

    fn local_member_id(&self) -> &MemberId {
        self.controller.local_member_id()
    }

    /// Empty provider means this member, empty cloud means the default cloud of this member.
    fn resolve_target(&self, provider: &MemberId, cloud_name: &CloudName) -> Result<(MemberId, CloudName)> {
        let provider = if provider.is_empty() { self.local_member_id().clone() } else { provider.clone() };

        if !cloud_name.is_empty() {
            return Ok((provider, cloud_name.clone()));
        }
        if &provider != self.local_member_id() {
            return Err(Error::InvalidParameter(format!("A cloud name is required for provider {}", provider)));
        }

        let default_cloud = self.controller.connectors().default_cloud().cloned();
        default_cloud.map(|cloud| (provider, cloud)).ok_or_else(|| Error::InvalidParameter("This member serves no cloud".to_string()))
    }

    fn authorize(&self, user: &FederationUser, cloud_name: &CloudName, operation: Operation, resource_type: ResourceType) -> Result<()> {
        self.aaa.authenticate_and_authorize(self.local_member_id(), user, cloud_name, operation, resource_type)
    }

    /// Owned order after authentication and authorization of `operation` on it.
    fn authorized_order(&self, user: &FederationUser, id: &OrderId, operation: Operation) -> Result<Order> {
        self.aaa.authenticate(self.local_member_id(), user)?;
        let order = self.controller.get_order(id, user)?;
        self.aaa.authorize(user, &order.cloud_name, operation, order.resource_type())?;
        Ok(order)
    }

    /// Creates an order on behalf of `user`. Requester and user are always taken from the call.
    pub fn create_order(&self, user: &FederationUser, mut order: Order) -> Result<OrderId> {
        let (provider, cloud_name) = self.resolve_target(&order.provider, &order.cloud_name)?;
        self.authorize(user, &cloud_name, Operation::Create, order.resource_type())?;

        order.requester = self.local_member_id().clone();
        order.provider = provider;
        order.cloud_name = cloud_name;
        order.federation_user = user.clone();

        self.controller.activate(order)
    }

    pub fn get_order(&self, user: &FederationUser, id: &OrderId) -> Result<Order> {
        self.authorized_order(user, id, Operation::Get)
    }

    pub fn delete_order(&self, user: &FederationUser, id: &OrderId) -> Result<()> {
        let order = self.authorized_order(user, id, Operation::Delete)?;
        self.controller.delete_order(&order.id)
    }

    pub fn get_instance(&self, user: &FederationUser, id: &OrderId) -> Result<Instance> {
        let order = self.authorized_order(user, id, Operation::Get)?;
        self.controller.get_resource_instance(&order.id)
    }

    pub fn get_instances_status(&self, user: &FederationUser, resource_type: ResourceType) -> Result<Vec<InstanceStatus>> {
        let (_, cloud_name) = self.resolve_target(&MemberId::new(""), &CloudName::new(""))?;
        self.authorize(user, &cloud_name, Operation::GetAll, resource_type)?;
        Ok(self.controller.get_instances_status(user, resource_type))
    }

    pub fn get_user_allocation(&self, user: &FederationUser, provider: &MemberId, cloud_name: &CloudName, resource_type: ResourceType) -> Result<Allocation> {
        let (provider, cloud_name) = self.resolve_target(provider, cloud_name)?;
        self.authorize(user, &cloud_name, Operation::GetUserAllocation, resource_type)?;
        self.controller.get_user_allocation(&provider, user, resource_type)
    }

    pub fn get_user_quota(&self, user: &FederationUser, provider: &MemberId, cloud_name: &CloudName, resource_type: ResourceType) -> Result<Quota> {
        let (provider, cloud_name) = self.resolve_target(provider, cloud_name)?;
        self.authorize(user, &cloud_name, Operation::GetUserQuota, resource_type)?;
        self.controller.connectors().get_cloud_connector(&provider, &cloud_name)?.get_user_quota(user, resource_type)
    }

    pub fn get_image(&self, user: &FederationUser, provider: &MemberId, cloud_name: &CloudName, image_id: &ImageId) -> Result<Image> {
        let (provider, cloud_name) = self.resolve_target(provider, cloud_name)?;
        self.authorize(user, &cloud_name, Operation::GetImage, ResourceType::Compute)?;
        self.controller.connectors().get_cloud_connector(&provider, &cloud_name)?.get_image(image_id, user)
    }

    pub fn get_all_images(&self, user: &FederationUser, provider: &MemberId, cloud_name: &CloudName) -> Result<ImageCatalog> {
        let (provider, cloud_name) = self.resolve_target(provider, cloud_name)?;
        self.authorize(user, &cloud_name, Operation::GetAllImages, ResourceType::Compute)?;
        self.controller.connectors().get_cloud_connector(&provider, &cloud_name)?.get_all_images(user)
    }

    pub fn generic_request(&self, user: &FederationUser, provider: &MemberId, cloud_name: &CloudName, request: &GenericRequest) -> Result<GenericRequestResponse> {
        let (provider, cloud_name) = self.resolve_target(provider, cloud_name)?;
        self.authorize(user, &cloud_name, Operation::GenericRequest, ResourceType::GenericRequest)?;
        self.controller.connectors().get_cloud_connector(&provider, &cloud_name)?.generic_request(request, user)
    }
}
