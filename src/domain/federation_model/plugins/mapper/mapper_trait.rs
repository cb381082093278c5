use std::fmt::Debug;

use crate::domain::federation_model::order::federation_user::{CloudToken, FederationUser};
use crate::error::Result;

/// Turns a federation identity into the credential of one local cloud.
pub trait FederationToLocalMapper: Send + Sync + Debug {
    fn map(&self, user: &FederationUser) -> Result<CloudToken>;
}
