use std::sync::Arc;

use crate::domain::federation_model::broker::broker_config::{AuthorizationConfig, BrokerConfig, MapperConfig, ProcessorIntervals};
use crate::domain::federation_model::cloud_connector::cloud_connector_factory::CloudConnectorFactory;
use crate::domain::federation_model::facade::application_facade::ApplicationFacade;
use crate::domain::federation_model::intercomponent::remote_facade::RemoteFacade;
use crate::domain::federation_model::intercomponent::rpc_channel::RpcChannel;
use crate::domain::federation_model::intercomponent::tcp_channel::TcpRpcChannel;
use crate::domain::federation_model::order_controller::order_controller::OrderController;
use crate::domain::federation_model::order_registry::order_registry::OrderRegistry;
use crate::domain::federation_model::plugins::aaa::aaa_controller::AaaController;
use crate::domain::federation_model::plugins::aaa::aaa_plugin_trait::AuthorizationPlugin;
use crate::domain::federation_model::plugins::aaa::allow_all_authorization_plugin::AllowAllAuthorizationPlugin;
use crate::domain::federation_model::plugins::aaa::issuer_authentication_plugin::IssuerAuthenticationPlugin;
use crate::domain::federation_model::plugins::aaa::remote_authorization_plugin::RemoteAuthorizationPlugin;
use crate::domain::federation_model::plugins::interoperability::cloud_plugin_trait::CloudPlugins;
use crate::domain::federation_model::plugins::mapper::mapper_trait::FederationToLocalMapper;
use crate::domain::federation_model::plugins::mapper::one_to_one_mapper::OneToOneMapper;
use crate::domain::federation_model::plugins::mapper::shared_account_mapper::SharedAccountMapper;
use crate::domain::federation_model::plugins::simulated_cloud::simulated_cloud::SimulatedCloud;
use crate::domain::federation_model::processors::closed_processor::ClosedProcessor;
use crate::domain::federation_model::processors::fulfilled_processor::FulfilledProcessor;
use crate::domain::federation_model::processors::open_processor::OpenProcessor;
use crate::domain::federation_model::processors::order_processor::OrderProcessor;
use crate::domain::federation_model::processors::processor_runner::ProcessorRunner;
use crate::domain::federation_model::processors::spawning_processor::SpawningProcessor;
use crate::domain::federation_model::utils::id::MemberId;
use crate::error::Result;

/// One federation member: registry, controller, both facades and the background processors.
///
/// The registry is created here and shared by reference with every component, there is exactly
/// one per broker.
#[derive(Debug)]
pub struct Broker {
    local_member_id: MemberId,
    registry: Arc<OrderRegistry>,
    controller: OrderController,
    application: Arc<ApplicationFacade>,
    remote: Arc<RemoteFacade>,
    clouds: Vec<Arc<SimulatedCloud>>,
    intervals: ProcessorIntervals,
    runner: Option<ProcessorRunner>,
}

impl Broker {
    /// Builds a broker whose peers are reached through `channel`. Without a channel only orders
    /// provided by this member can be served.
    pub fn build(config: &BrokerConfig, channel: Option<Arc<dyn RpcChannel>>) -> Result<Self> {
        let local_member_id = config.local_member_id.clone();
        let registry = Arc::new(OrderRegistry::new());

        let mapper: Arc<dyn FederationToLocalMapper> = match &config.mapper {
            MapperConfig::OneToOne => Arc::new(OneToOneMapper),
            MapperConfig::SharedAccount { user_id, token_value } => Arc::new(SharedAccountMapper::new(local_member_id.clone(), user_id.clone(), token_value.clone())),
        };

        let mut factory = CloudConnectorFactory::new(local_member_id.clone(), registry.clone());
        let mut clouds = Vec::with_capacity(config.clouds.len());
        for cloud_config in &config.clouds {
            let cloud = Arc::new(SimulatedCloud::new(cloud_config.clone()));
            factory = factory.with_cloud(cloud_config.name.clone(), CloudPlugins::from_single(cloud.clone()), mapper.clone());
            clouds.push(cloud);
        }
        if let Some(channel) = channel {
            factory = factory.with_channel(channel);
        }

        let authorization: Arc<dyn AuthorizationPlugin> = match &config.authorization {
            AuthorizationConfig::AllowAll => Arc::new(AllowAllAuthorizationPlugin),
            AuthorizationConfig::Remote { server_url } => Arc::new(RemoteAuthorizationPlugin::new(server_url.clone())?),
        };
        let aaa = AaaController::new(Arc::new(IssuerAuthenticationPlugin), authorization);

        let controller = OrderController::new(local_member_id.clone(), registry.clone(), Arc::new(factory));
        let application = Arc::new(ApplicationFacade::new(aaa.clone(), controller.clone()));
        let remote = Arc::new(RemoteFacade::new(aaa, controller.clone()));

        log::info!("Broker {} built with clouds {:?}.", local_member_id, config.clouds.iter().map(|c| c.name.to_string()).collect::<Vec<_>>());

        Ok(Broker { local_member_id, registry, controller, application, remote, clouds, intervals: config.processors, runner: None })
    }

    /// Builds a broker that reaches its peers over TCP, if peers are configured.
    pub fn from_config(config: &BrokerConfig) -> Result<Self> {
        let channel = config.rpc.as_ref().map(|rpc| Arc::new(TcpRpcChannel::new(rpc.peers.clone(), rpc.timeout)) as Arc<dyn RpcChannel>);
        Self::build(config, channel)
    }

    pub fn local_member_id(&self) -> &MemberId {
        &self.local_member_id
    }

    pub fn registry(&self) -> &Arc<OrderRegistry> {
        &self.registry
    }

    pub fn controller(&self) -> &OrderController {
        &self.controller
    }

    pub fn application_facade(&self) -> Arc<ApplicationFacade> {
        self.application.clone()
    }

    pub fn remote_facade(&self) -> Arc<RemoteFacade> {
        self.remote.clone()
    }

    pub fn clouds(&self) -> &[Arc<SimulatedCloud>] {
        &self.clouds
    }

    pub fn processors(&self) -> Vec<Arc<dyn OrderProcessor>> {
        vec![
            Arc::new(OpenProcessor::new(self.controller.clone())),
            Arc::new(SpawningProcessor::new(self.controller.clone())),
            Arc::new(FulfilledProcessor::new(self.controller.clone())),
            Arc::new(ClosedProcessor::new(self.controller.clone())),
        ]
    }

    /// One pass of every processor on the calling thread.
    pub fn run_processors_once(&self) -> usize {
        self.processors().iter().map(|processor| processor.run_pass(&self.registry)).sum()
    }

    pub fn start_processors(&mut self) -> Result<()> {
        if self.runner.is_some() {
            return Ok(());
        }

        let intervals = [self.intervals.open, self.intervals.spawning, self.intervals.fulfilled, self.intervals.closed];
        let processors = self.processors().into_iter().zip(intervals).collect();
        self.runner = Some(ProcessorRunner::start(self.registry.clone(), processors)?);
        Ok(())
    }

    pub fn stop_processors(&mut self) {
        if let Some(mut runner) = self.runner.take() {
            runner.stop();
        }
    }
}
