pub mod aaa;
pub mod interoperability;
pub mod mapper;
pub mod simulated_cloud;
