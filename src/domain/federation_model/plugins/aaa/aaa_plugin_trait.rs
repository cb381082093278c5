use std::fmt::Debug;

use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::resource_type::{Operation, ResourceType};
use crate::domain::federation_model::utils::id::{CloudName, MemberId};
use crate::error::Result;

pub trait AuthenticationPlugin: Send + Sync + Debug {
    /// Checks that `user` is a genuine principal of `requesting_member`.
    ///
    /// # Errors
    /// `Unauthorized` if the credential does not belong to the member that presented it.
    fn authenticate(&self, requesting_member: &MemberId, user: &FederationUser) -> Result<()>;
}

pub trait AuthorizationPlugin: Send + Sync + Debug {
    /// Fails with `Unauthorized` if `user` may not run `operation` on `resource_type` in `cloud_name`.
    fn authorize(&self, user: &FederationUser, cloud_name: &CloudName, operation: Operation, resource_type: ResourceType) -> Result<()>;
}
