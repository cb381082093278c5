use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Compute,
    Volume,
    Network,
    Attachment,
    GenericRequest,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Compute => "compute",
            ResourceType::Volume => "volume",
            ResourceType::Network => "network",
            ResourceType::Attachment => "attachment",
            ResourceType::GenericRequest => "genericRequest",
        };
        write!(f, "{}", name)
    }
}

/// Operations checked by the authorization plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Get,
    GetAll,
    Delete,
    GetUserQuota,
    GetUserAllocation,
    GetImage,
    GetAllImages,
    GenericRequest,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::GetAll => "getAll",
            Operation::Delete => "delete",
            Operation::GetUserQuota => "getUserQuota",
            Operation::GetUserAllocation => "getUserAllocation",
            Operation::GetImage => "getImage",
            Operation::GetAllImages => "getAllImages",
            Operation::GenericRequest => "genericRequest",
        };
        write!(f, "{}", name)
    }
}
