pub mod allocation;
pub mod federation_user;
pub mod generic_request;
pub mod image;
pub mod instance;
pub mod order;
pub mod order_state;
pub mod resource_type;
