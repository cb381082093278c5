use serde::{Deserialize, Serialize};

use crate::domain::federation_model::order::allocation::Quota;
use crate::domain::federation_model::order::federation_user::FederationUser;
use crate::domain::federation_model::order::generic_request::{GenericRequest, GenericRequestResponse};
use crate::domain::federation_model::order::image::{Image, ImageCatalog};
use crate::domain::federation_model::order::instance::Instance;
use crate::domain::federation_model::order::order::Order;
use crate::domain::federation_model::order::resource_type::ResourceType;
use crate::domain::federation_model::utils::id::{CloudName, EnvelopeId, ImageId, MemberId};
use crate::error::{Error, ErrorKind};

/// Requests a member can send to a peer. Orders travel as full copies, the provider keeps its own.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum RemoteRequest {
    CreateOrder { order: Order },
    GetInstance { order: Order },
    DeleteOrder { order: Order },
    GetUserQuota { cloud_name: CloudName, user: FederationUser, resource_type: ResourceType },
    GetImage { cloud_name: CloudName, image_id: ImageId, user: FederationUser },
    GetAllImages { cloud_name: CloudName, user: FederationUser },
    GenericRequest { cloud_name: CloudName, request: GenericRequest, user: FederationUser },
}

impl RemoteRequest {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteRequest::CreateOrder { .. } => "CreateOrder",
            RemoteRequest::GetInstance { .. } => "GetInstance",
            RemoteRequest::DeleteOrder { .. } => "DeleteOrder",
            RemoteRequest::GetUserQuota { .. } => "GetUserQuota",
            RemoteRequest::GetImage { .. } => "GetImage",
            RemoteRequest::GetAllImages { .. } => "GetAllImages",
            RemoteRequest::GenericRequest { .. } => "GenericRequest",
        }
    }
}

/// Successful results, one variant per result shape.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum RemotePayload {
    Done,
    Instance(Instance),
    Quota(Quota),
    Image(Image),
    Images(ImageCatalog),
    Generic(GenericRequestResponse),
}

/// Error envelope of the RPC layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteFault {
    pub kind: ErrorKind,
    pub code: u16,
    pub message: String,
}

impl From<&Error> for RemoteFault {
    fn from(error: &Error) -> Self {
        RemoteFault { kind: error.kind(), code: error.kind().status_code(), message: error.message().to_string() }
    }
}

impl From<RemoteFault> for Error {
    fn from(fault: RemoteFault) -> Self {
        Error::from_kind(fault.kind, fault.message)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeBody {
    Request(RemoteRequest),
    Response(Result<RemotePayload, RemoteFault>),
}

/// Routing wrapper around every message exchanged between members.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Shared by a request and its response.
    pub id: EnvelopeId,
    pub sender: MemberId,
    pub target: MemberId,
    pub body: EnvelopeBody,
}

impl Envelope {
    pub fn request(sender: MemberId, target: MemberId, request: RemoteRequest) -> Self {
        Envelope { id: EnvelopeId::generate(), sender, target, body: EnvelopeBody::Request(request) }
    }

    /// Builds the answer to `self`, swapping sender and target.
    pub fn reply(&self, result: Result<RemotePayload, Error>) -> Self {
        let body = EnvelopeBody::Response(result.map_err(|e| RemoteFault::from(&e)));
        Envelope { id: self.id.clone(), sender: self.target.clone(), target: self.sender.clone(), body }
    }
}
