use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::api::broker_config_dto::broker_config_dto::{AuthorizationDto, BrokerConfigDto, CloudDto, MapperDto, ProcessorsDto, RpcDto};
use crate::domain::federation_model::order::allocation::{ComputeAllocation, VolumeAllocation};
use crate::domain::federation_model::order::image::Image;
use crate::domain::federation_model::plugins::simulated_cloud::simulated_cloud::SimulatedCloudConfig;
use crate::domain::federation_model::utils::id::{CloudName, ImageId, MemberId};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapperConfig {
    OneToOne,
    SharedAccount { user_id: String, token_value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationConfig {
    AllowAll,
    Remote { server_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    pub listen_address: Option<String>,
    pub timeout: Duration,
    pub peers: HashMap<MemberId, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorIntervals {
    pub open: Duration,
    pub spawning: Duration,
    pub fulfilled: Duration,
    pub closed: Duration,
}

impl Default for ProcessorIntervals {
    fn default() -> Self {
        ProcessorIntervals { open: Duration::from_secs(1), spawning: Duration::from_secs(1), fulfilled: Duration::from_secs(5), closed: Duration::from_secs(1) }
    }
}

/// Validated configuration of one federation member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub local_member_id: MemberId,
    /// Local clouds, the first one is the default cloud.
    pub clouds: Vec<SimulatedCloudConfig>,
    pub mapper: MapperConfig,
    pub authorization: AuthorizationConfig,
    pub rpc: Option<RpcConfig>,
    pub processors: ProcessorIntervals,
    pub audit_file: Option<String>,
}

impl BrokerConfig {
    pub fn default_cloud(&self) -> Option<&CloudName> {
        self.clouds.first().map(|cloud| &cloud.name)
    }
}

fn required(value: &str, what: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::InvalidConfig(format!("{} must not be empty", what)));
    }
    Ok(value.to_string())
}

fn millis(value: u64, what: &str) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidConfig(format!("{} must be greater than zero", what)));
    }
    Ok(Duration::from_millis(value))
}

impl TryFrom<CloudDto> for SimulatedCloudConfig {
    type Error = ConfigError;

    fn try_from(dto: CloudDto) -> Result<Self, Self::Error> {
        let name = CloudName::new(required(&dto.name, "Cloud name")?);
        let sim = dto.simulated;

        let images = sim
            .images
            .into_iter()
            .map(|image| {
                Ok(Image {
                    id: ImageId::new(required(&image.id, "Image id")?),
                    name: image.name,
                    size_bytes: image.size_bytes,
                    min_disk_gb: image.min_disk_gb,
                    min_ram_mb: image.min_ram_mb,
                    status: "ACTIVE".to_string(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(SimulatedCloudConfig {
            name,
            compute_limit: ComputeAllocation::new(sim.vcpu, sim.ram_mb, sim.instances),
            volume_limit: VolumeAllocation::new(sim.storage_gb, sim.volumes),
            spawn_polls: sim.spawn_polls,
            images,
        })
    }
}

impl TryFrom<ProcessorsDto> for ProcessorIntervals {
    type Error = ConfigError;

    fn try_from(dto: ProcessorsDto) -> Result<Self, Self::Error> {
        Ok(ProcessorIntervals {
            open: millis(dto.open_ms, "processors.openMs")?,
            spawning: millis(dto.spawning_ms, "processors.spawningMs")?,
            fulfilled: millis(dto.fulfilled_ms, "processors.fulfilledMs")?,
            closed: millis(dto.closed_ms, "processors.closedMs")?,
        })
    }
}

impl TryFrom<(RpcDto, &MemberId)> for RpcConfig {
    type Error = ConfigError;

    fn try_from((dto, local_member_id): (RpcDto, &MemberId)) -> Result<Self, Self::Error> {
        let mut peers = HashMap::new();
        for peer in dto.peers {
            let member_id = MemberId::new(required(&peer.member_id, "Peer member id")?);
            if &member_id == local_member_id {
                return Err(ConfigError::InvalidConfig(format!("Member {} is listed as its own peer", member_id)));
            }
            let address = required(&peer.address, "Peer address")?;
            if peers.insert(member_id.clone(), address).is_some() {
                return Err(ConfigError::InvalidConfig(format!("Peer {} is listed twice", member_id)));
            }
        }

        Ok(RpcConfig {
            listen_address: dto.listen_address.map(|address| address.trim().to_string()).filter(|address| !address.is_empty()),
            timeout: millis(dto.timeout_ms, "rpc.timeoutMs")?,
            peers,
        })
    }
}

impl TryFrom<BrokerConfigDto> for BrokerConfig {
    type Error = ConfigError;

    fn try_from(dto: BrokerConfigDto) -> Result<Self, Self::Error> {
        let local_member_id = MemberId::new(required(&dto.local_member_id, "localMemberId")?);

        if dto.clouds.is_empty() {
            return Err(ConfigError::InvalidConfig("At least one cloud must be configured".to_string()));
        }
        let clouds = dto.clouds.into_iter().map(SimulatedCloudConfig::try_from).collect::<Result<Vec<_>, _>>()?;
        let mut names = HashSet::new();
        if let Some(duplicate) = clouds.iter().find(|cloud| !names.insert(cloud.name.clone())) {
            return Err(ConfigError::InvalidConfig(format!("Cloud {} is configured twice", duplicate.name)));
        }

        let mapper = match dto.mapper {
            MapperDto::OneToOne => MapperConfig::OneToOne,
            MapperDto::SharedAccount { user_id, token_value } => {
                MapperConfig::SharedAccount { user_id: required(&user_id, "mapper.userId")?, token_value: required(&token_value, "mapper.tokenValue")? }
            }
        };

        let authorization = match dto.authorization {
            AuthorizationDto::AllowAll => AuthorizationConfig::AllowAll,
            AuthorizationDto::Remote { server_url } => AuthorizationConfig::Remote { server_url: required(&server_url, "authorization.serverUrl")? },
        };

        let rpc = dto.rpc.map(|rpc| RpcConfig::try_from((rpc, &local_member_id))).transpose()?;

        Ok(BrokerConfig {
            local_member_id,
            clouds,
            mapper,
            authorization,
            rpc,
            processors: ProcessorIntervals::try_from(dto.processors)?,
            audit_file: dto.audit.file.filter(|file| !file.trim().is_empty()),
        })
    }
}
