use crate::domain::federation_model::order::federation_user::{CloudToken, FederationUser};
use crate::domain::federation_model::plugins::mapper::mapper_trait::FederationToLocalMapper;
use crate::error::{Error, Result};

/// The cloud accepts federation tokens as they are.
#[derive(Debug, Clone, Default)]
pub struct OneToOneMapper;

impl FederationToLocalMapper for OneToOneMapper {
    fn map(&self, user: &FederationUser) -> Result<CloudToken> {
        if user.token_value.is_empty() {
            return Err(Error::Unauthorized(format!("User {} has no token to map", user.user_id)));
        }
        Ok(CloudToken::new(user.token_provider.to_string(), user.user_id.clone(), user.token_value.clone()))
    }
}
