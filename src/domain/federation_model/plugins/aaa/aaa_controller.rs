use std::sync::Arc;

use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::resource_type::{Operation, ResourceType};
use crate::domain::federation_model::plugins::aaa::aaa_plugin_trait::{AuthenticationPlugin, AuthorizationPlugin};
use crate::domain::federation_model::utils::id::{CloudName, MemberId};
use crate::error::Result;

/// Authentication followed by authorization, shared by the local and the remote facade.
#[derive(Debug, Clone)]
pub struct AaaController {
    authentication: Arc<dyn AuthenticationPlugin>,
    authorization: Arc<dyn AuthorizationPlugin>,
}

impl AaaController {
    pub fn new(authentication: Arc<dyn AuthenticationPlugin>, authorization: Arc<dyn AuthorizationPlugin>) -> Self {
        AaaController { authentication, authorization }
    }

    pub fn authenticate(&self, requesting_member: &MemberId, user: &FederationUser) -> Result<()> {
        self.authentication.authenticate(requesting_member, user)
    }

    /// Authorization only, for callers that authenticated earlier in the same request.
    pub fn authorize(&self, user: &FederationUser, cloud_name: &CloudName, operation: Operation, resource_type: ResourceType) -> Result<()> {
        self.authorization.authorize(user, cloud_name, operation, resource_type)
    }

    pub fn authenticate_and_authorize(
        &self,
        requesting_member: &MemberId,
        user: &FederationUser,
        cloud_name: &CloudName,
        operation: Operation,
        resource_type: ResourceType,
    ) -> Result<()> {
        self.authentication.authenticate(requesting_member, user)?;
        self.authorization.authorize(user, cloud_name, operation, resource_type)
    }
}
