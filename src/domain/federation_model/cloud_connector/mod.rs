pub mod cloud_connector_factory;
pub mod cloud_connector_trait;
pub mod local_cloud_connector;
pub mod remote_cloud_connector;
