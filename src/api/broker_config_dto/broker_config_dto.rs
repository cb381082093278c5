use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerConfigDto {
    pub local_member_id: String,
    pub clouds: Vec<CloudDto>,
    #[serde(default)]
    pub mapper: MapperDto,
    #[serde(default)]
    pub authorization: AuthorizationDto,
    #[serde(default)]
    pub rpc: Option<RpcDto>,
    #[serde(default)]
    pub processors: ProcessorsDto,
    #[serde(default)]
    pub audit: AuditDto,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDto {
    pub name: String,
    pub simulated: SimulatedCloudDto,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedCloudDto {
    pub vcpu: u32,
    pub ram_mb: u64,
    pub instances: u32,
    pub storage_gb: u64,
    pub volumes: u32,
    #[serde(default)]
    pub spawn_polls: u32,
    #[serde(default)]
    pub images: Vec<ImageDto>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub min_disk_gb: u64,
    #[serde(default)]
    pub min_ram_mb: u64,
}

#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(tag = "type")]
pub enum MapperDto {
    #[default]
    OneToOne,
    SharedAccount {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "tokenValue")]
        token_value: String,
    },
}

#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(tag = "type")]
pub enum AuthorizationDto {
    #[default]
    AllowAll,
    Remote {
        #[serde(rename = "serverUrl")]
        server_url: String,
    },
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcDto {
    #[serde(default)]
    pub listen_address: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub peers: Vec<PeerDto>,
}

fn default_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerDto {
    pub member_id: String,
    pub address: String,
}

/// Sleep between two passes of each background processor, in milliseconds.
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorsDto {
    pub open_ms: u64,
    pub spawning_ms: u64,
    pub fulfilled_ms: u64,
    pub closed_ms: u64,
}

impl Default for ProcessorsDto {
    fn default() -> Self {
        ProcessorsDto { open_ms: 1000, spawning_ms: 1000, fulfilled_ms: 5000, closed_ms: 1000 }
    }
}

#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditDto {
    #[serde(default)]
    pub file: Option<String>,
}
