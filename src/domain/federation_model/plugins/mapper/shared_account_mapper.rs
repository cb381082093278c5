use crate::domain::federation_model::order::federation_user::{CloudToken, FederationUser};
use crate::domain::federation_model::plugins::mapper::mapper_trait::FederationToLocalMapper;
use crate::domain::federation_model::utils::id::MemberId;
use crate::error::Result;

/// Every federation user acts through the same cloud account of the local member.
#[derive(Debug, Clone)]
pub struct SharedAccountMapper {
    local_member_id: MemberId,
    user_id: String,
    token_value: String,
}

impl SharedAccountMapper {
    pub fn new(local_member_id: MemberId, user_id: impl Into<String>, token_value: impl Into<String>) -> Self {
        SharedAccountMapper { local_member_id, user_id: user_id.into(), token_value: token_value.into() }
    }
}

impl FederationToLocalMapper for SharedAccountMapper {
    fn map(&self, user: &FederationUser) -> Result<CloudToken> {
        log::trace!("Mapping federation user {} to shared account {}", user.user_id, self.user_id);
        Ok(CloudToken::new(self.local_member_id.to_string(), self.user_id.clone(), self.token_value.clone()))
    }
}
