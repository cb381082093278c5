use std::time::Duration;

use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::resource_type::{Operation, ResourceType};
use crate::domain::federation_model::plugins::aaa::aaa_plugin_trait::AuthorizationPlugin;
use crate::domain::federation_model::utils::id::CloudName;
use crate::error::{Error, Result};

const AUTH_ENDPOINT: &str = "/auth";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Delegates every decision to an external authorization service.
///
/// The service answers `GET {server}/auth/{cloud}/{idp}/{user}/{type}/{operation}` with the body
/// `true` or `false`. A request that fails is treated as a denial.
#[derive(Debug, Clone)]
pub struct RemoteAuthorizationPlugin {
    server_url: String,
    client: reqwest::blocking::Client,
}

impl RemoteAuthorizationPlugin {
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::unexpected(format!("Could not build authorization client: {}", e)))?;

        Ok(RemoteAuthorizationPlugin { server_url: server_url.into().trim_end_matches('/').to_string(), client })
    }

    pub fn endpoint(&self, user: &FederationUser, cloud_name: &CloudName, operation: Operation, resource_type: ResourceType) -> String {
        format!("{}{}/{}/{}/{}/{}/{}", self.server_url, AUTH_ENDPOINT, cloud_name, user.token_provider, user.user_id, resource_type, operation)
    }

    fn ask(&self, url: &str) -> std::result::Result<bool, reqwest::Error> {
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        Ok(body.trim().eq_ignore_ascii_case("true"))
    }
}

impl AuthorizationPlugin for RemoteAuthorizationPlugin {
    fn authorize(&self, user: &FederationUser, cloud_name: &CloudName, operation: Operation, resource_type: ResourceType) -> Result<()> {
        let url = self.endpoint(user, cloud_name, operation, resource_type);

        let granted = match self.ask(&url) {
            Ok(granted) => granted,
            Err(e) => {
                log::warn!("Authorization service request {} failed: {}", url, e);
                false
            }
        };

        if granted {
            Ok(())
        } else {
            Err(Error::Unauthorized(format!("User {} may not {} {} in cloud {}", user.user_id, operation, resource_type, cloud_name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_layout() {
        let plugin = RemoteAuthorizationPlugin::new("http://auth.local:8080/").unwrap();
        let user = FederationUser::new("m1", "token", "alice", "alice");

        let url = plugin.endpoint(&user, &CloudName::new("default"), Operation::Create, ResourceType::Compute);

        assert_eq!(url, "http://auth.local:8080/auth/default/m1/alice/compute/create");
    }

    #[test]
    fn test_unreachable_service_denies() {
        let plugin = RemoteAuthorizationPlugin::new("http://127.0.0.1:1").unwrap();
        let user = FederationUser::new("m1", "token", "alice", "alice");

        let result = plugin.authorize(&user, &CloudName::new("default"), Operation::Get, ResourceType::Volume);

        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }
}
