pub mod mapper_trait;
pub mod one_to_one_mapper;
pub mod shared_account_mapper;
