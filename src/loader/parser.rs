use serde::de::DeserializeOwned;
use std::fs;

use crate::api::broker_config_dto::broker_config_dto::BrokerConfigDto;
use crate::domain::federation_model::broker::broker_config::BrokerConfig;
use crate::error::ConfigError;

/// Parses a JSON file into a given type `T`.
///
/// Errors are converted into `ConfigError` variants:
/// - `ConfigError::IoError` if the file cannot be read.
/// - `ConfigError::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &str) -> Result<T, ConfigError> {
    let data = fs::read_to_string(file_path)?;

    let parsed_data: T = serde_json::from_str(&data)?;

    Ok(parsed_data)
}

/// Reads and validates a broker configuration file.
pub fn load_broker_config(file_path: &str) -> Result<BrokerConfig, ConfigError> {
    let dto = parse_json_file::<BrokerConfigDto>(file_path)?;
    log::debug!("Configuration file '{}' parsed.", file_path);

    BrokerConfig::try_from(dto)
}
