use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::federation_model::utils::id::MemberId;

/// Identity under which a request was authorized. It travels with the order and is used for
/// every later dispatch of that order, locally or to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationUser {
    /// Member whose identity provider issued the token.
    pub token_provider: MemberId,
    pub user_id: String,
    pub user_name: String,
    pub token_value: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl FederationUser {
    pub fn new(token_provider: impl Into<MemberId>, token_value: impl Into<String>, user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            token_provider: token_provider.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            token_value: token_value.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.token_provider.is_empty() && !self.user_id.trim().is_empty()
    }

    /// Two users are the same principal if the same identity provider issued the same user id.
    /// The token value is deliberately ignored, tokens are renewed.
    pub fn is_same_principal(&self, other: &FederationUser) -> bool {
        self.token_provider == other.token_provider && self.user_id == other.user_id
    }
}

/// Cloud-specific credential produced by a mapper for one local cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudToken {
    pub token_provider: String,
    pub user_id: String,
    pub token_value: String,
}

impl CloudToken {
    pub fn new(token_provider: impl Into<String>, user_id: impl Into<String>, token_value: impl Into<String>) -> Self {
        Self { token_provider: token_provider.into(), user_id: user_id.into(), token_value: token_value.into() }
    }
}
