use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::resource_type::{Operation, ResourceType};
use crate::domain::federation_model::plugins::aaa::aaa_plugin_trait::AuthorizationPlugin;
use crate::domain::federation_model::utils::id::CloudName;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct AllowAllAuthorizationPlugin;

impl AuthorizationPlugin for AllowAllAuthorizationPlugin {
    fn authorize(&self, _user: &FederationUser, _cloud_name: &CloudName, _operation: Operation, _resource_type: ResourceType) -> Result<()> {
        Ok(())
    }
}
