use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::federation_model::utils::id::ImageId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub name: String,
    pub size_bytes: u64,
    pub min_disk_gb: u64,
    pub min_ram_mb: u64,
    pub status: String,
}

/// Image catalog summary, id -> name.
pub type ImageCatalog = BTreeMap<ImageId, String>;
