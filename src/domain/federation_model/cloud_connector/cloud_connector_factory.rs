use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::federation_model::cloud_connector::cloud_connector_trait::CloudConnector;
use crate::domain::federation_model::cloud_connector::local_cloud_connector::LocalCloudConnector;
use crate::domain::federation_model::cloud_connector::remote_cloud_connector::RemoteCloudConnector;
use crate::domain::federation_model::intercomponent::rpc_channel::RpcChannel;
use crate::domain::federation_model::order::order::Order;
use crate::domain::federation_model::order_registry::order_registry::OrderRegistry;
use crate::domain::federation_model::plugins::interoperability::cloud_plugin_trait::CloudPlugins;
use crate::domain::federation_model::plugins::mapper::mapper_trait::FederationToLocalMapper;
use crate::domain::federation_model::utils::id::{CloudName, MemberId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorRoute {
    Local,
    Remote,
}

/// Orders provided by this member are served locally, everything else goes to the provider.
pub fn route(provider: &MemberId, local_member_id: &MemberId) -> ConnectorRoute {
    if provider == local_member_id { ConnectorRoute::Local } else { ConnectorRoute::Remote }
}

/// Hands out the connector responsible for a `(provider, cloud)` pair.
#[derive(Debug)]
pub struct CloudConnectorFactory {
    local_member_id: MemberId,
    registry: Arc<OrderRegistry>,
    local_connectors: HashMap<CloudName, Arc<LocalCloudConnector>>,
    default_cloud: Option<CloudName>,
    channel: Option<Arc<dyn RpcChannel>>,
}

impl CloudConnectorFactory {
    pub fn new(local_member_id: MemberId, registry: Arc<OrderRegistry>) -> Self {
        CloudConnectorFactory { local_member_id, registry, local_connectors: HashMap::new(), default_cloud: None, channel: None }
    }

    /// Registers a local cloud. The first registered cloud is the default one.
    pub fn with_cloud(mut self, cloud_name: CloudName, plugins: CloudPlugins, mapper: Arc<dyn FederationToLocalMapper>) -> Self {
        let connector = LocalCloudConnector::new(cloud_name.clone(), plugins, mapper, self.registry.clone());
        self.default_cloud.get_or_insert_with(|| cloud_name.clone());
        self.local_connectors.insert(cloud_name, Arc::new(connector));
        self
    }

    pub fn with_channel(mut self, channel: Arc<dyn RpcChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn local_member_id(&self) -> &MemberId {
        &self.local_member_id
    }

    pub fn default_cloud(&self) -> Option<&CloudName> {
        self.default_cloud.as_ref()
    }

    /// # Errors
    /// `InvalidParameter` for an unknown local cloud, `UnavailableProvider` for a remote provider
    /// when no channel to peers is configured.
    pub fn get_cloud_connector(&self, provider: &MemberId, cloud_name: &CloudName) -> Result<Arc<dyn CloudConnector>> {
        match route(provider, &self.local_member_id) {
            ConnectorRoute::Local => {
                let connector = self
                    .local_connectors
                    .get(cloud_name)
                    .cloned()
                    .ok_or_else(|| Error::InvalidParameter(format!("Cloud {} is not served by member {}", cloud_name, self.local_member_id)))?;
                Ok(connector)
            }
            ConnectorRoute::Remote => {
                let channel = self.channel.clone().ok_or_else(|| Error::UnavailableProvider(format!("No channel to reach member {}", provider)))?;
                Ok(Arc::new(RemoteCloudConnector::new(self.local_member_id.clone(), provider.clone(), cloud_name.clone(), channel)))
            }
        }
    }

    pub fn connector_for(&self, order: &Order) -> Result<Arc<dyn CloudConnector>> {
        self.get_cloud_connector(&order.provider, &order.cloud_name)
    }
}
