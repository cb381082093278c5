use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::plugins::aaa::aaa_plugin_trait::AuthenticationPlugin;
use crate::domain::federation_model::utils::id::MemberId;
use crate::error::{Error, Result};

/// Accepts a user only when the member presenting it is the one whose identity provider issued it.
/// A peer therefore cannot act on behalf of another member's users.
#[derive(Debug, Clone, Default)]
pub struct IssuerAuthenticationPlugin;

impl AuthenticationPlugin for IssuerAuthenticationPlugin {
    fn authenticate(&self, requesting_member: &MemberId, user: &FederationUser) -> Result<()> {
        if !user.is_valid() || user.token_value.trim().is_empty() {
            return Err(Error::Unauthorized("Missing or incomplete federation credential".to_string()));
        }

        if &user.token_provider != requesting_member {
            log::warn!("Member {} presented a credential issued by {}", requesting_member, user.token_provider);
            return Err(Error::Unauthorized(format!("Credential of user {} was not issued by {}", user.user_id, requesting_member)));
        }

        Ok(())
    }
}
