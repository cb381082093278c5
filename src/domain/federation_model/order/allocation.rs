use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

use crate::domain::federation_model::order::resource_type::ResourceType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeAllocation {
    pub vcpu: u32,
    pub ram_mb: u64,
    pub instances: u32,
}

impl ComputeAllocation {
    pub fn new(vcpu: u32, ram_mb: u64, instances: u32) -> Self {
        Self { vcpu, ram_mb, instances }
    }

    /// True if `request` still fits into this (available) allocation.
    pub fn fits(&self, request: &ComputeAllocation) -> bool {
        request.vcpu <= self.vcpu && request.ram_mb <= self.ram_mb && request.instances <= self.instances
    }
}

impl Add for ComputeAllocation {
    type Output = ComputeAllocation;

    fn add(self, other: ComputeAllocation) -> ComputeAllocation {
        ComputeAllocation {
            vcpu: self.vcpu.saturating_add(other.vcpu),
            ram_mb: self.ram_mb.saturating_add(other.ram_mb),
            instances: self.instances.saturating_add(other.instances),
        }
    }
}

impl Sub for ComputeAllocation {
    type Output = ComputeAllocation;

    fn sub(self, other: ComputeAllocation) -> ComputeAllocation {
        ComputeAllocation {
            vcpu: self.vcpu.saturating_sub(other.vcpu),
            ram_mb: self.ram_mb.saturating_sub(other.ram_mb),
            instances: self.instances.saturating_sub(other.instances),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAllocation {
    pub storage_gb: u64,
    pub volumes: u32,
}

impl VolumeAllocation {
    pub fn new(storage_gb: u64, volumes: u32) -> Self {
        Self { storage_gb, volumes }
    }

    pub fn fits(&self, request: &VolumeAllocation) -> bool {
        request.storage_gb <= self.storage_gb && request.volumes <= self.volumes
    }
}

impl Add for VolumeAllocation {
    type Output = VolumeAllocation;

    fn add(self, other: VolumeAllocation) -> VolumeAllocation {
        VolumeAllocation { storage_gb: self.storage_gb.saturating_add(other.storage_gb), volumes: self.volumes.saturating_add(other.volumes) }
    }
}

impl Sub for VolumeAllocation {
    type Output = VolumeAllocation;

    fn sub(self, other: VolumeAllocation) -> VolumeAllocation {
        VolumeAllocation { storage_gb: self.storage_gb.saturating_sub(other.storage_gb), volumes: self.volumes.saturating_sub(other.volumes) }
    }
}

/// Resource usage of one user, for the resource types that have an allocation concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Allocation {
    Compute(ComputeAllocation),
    Volume(VolumeAllocation),
}

impl Allocation {
    /// Zero allocation of the given type, `None` if the type has no allocation concept.
    pub fn empty(resource_type: ResourceType) -> Option<Allocation> {
        match resource_type {
            ResourceType::Compute => Some(Allocation::Compute(ComputeAllocation::default())),
            ResourceType::Volume => Some(Allocation::Volume(VolumeAllocation::default())),
            ResourceType::Network | ResourceType::Attachment | ResourceType::GenericRequest => None,
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            Allocation::Compute(_) => ResourceType::Compute,
            Allocation::Volume(_) => ResourceType::Volume,
        }
    }

    /// Adds two allocations of the same type. Mixed types yield `None`.
    pub fn checked_add(&self, other: &Allocation) -> Option<Allocation> {
        match (self, other) {
            (Allocation::Compute(a), Allocation::Compute(b)) => Some(Allocation::Compute(*a + *b)),
            (Allocation::Volume(a), Allocation::Volume(b)) => Some(Allocation::Volume(*a + *b)),
            _ => None,
        }
    }

    pub fn saturating_sub(&self, other: &Allocation) -> Option<Allocation> {
        match (self, other) {
            (Allocation::Compute(a), Allocation::Compute(b)) => Some(Allocation::Compute(*a - *b)),
            (Allocation::Volume(a), Allocation::Volume(b)) => Some(Allocation::Volume(*a - *b)),
            _ => None,
        }
    }
}

/// Limits of a user at one cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub total: Allocation,
    pub used: Allocation,
}

impl Quota {
    pub fn new(total: Allocation, used: Allocation) -> Self {
        Self { total, used }
    }

    pub fn available(&self) -> Allocation {
        self.total.saturating_sub(&self.used).unwrap_or(self.total)
    }
}
