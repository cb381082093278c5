pub mod broker;
pub mod broker_config;
