use anyhow::Context;

use crate::domain::federation_model::broker::broker::Broker;
use crate::domain::federation_model::broker::broker_config::BrokerConfig;
use crate::domain::federation_model::utils::statistics;
use crate::loader::parser::load_broker_config;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads the configuration at `file_path`, enables the audit log it names and builds the broker.
pub fn generate_broker(file_path: &str) -> anyhow::Result<(BrokerConfig, Broker)> {
    let config = load_broker_config(file_path).with_context(|| format!("Could not load broker configuration '{}'", file_path))?;
    log::info!("Configuration of member {} loaded.", config.local_member_id);

    statistics::init_global(config.audit_file.clone());

    let broker = Broker::from_config(&config).context("Could not build the broker")?;
    Ok((config, broker))
}
