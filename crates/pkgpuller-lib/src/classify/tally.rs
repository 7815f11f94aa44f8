use super::rules::Ownership;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Per-run classification counters. `amd` includes the `amdgpu` driver packages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClassificationTally {
    pub total: usize,
    pub amd: usize,
    pub amdgpu: usize,
    pub other: usize,
}

impl ClassificationTally {
    pub fn record(&mut self, ownership: Ownership) {
        self.total += 1;
        match ownership {
            Ownership::AmdFirstParty => self.amd += 1,
            Ownership::AmdGpuDriver => {
                self.amd += 1;
                self.amdgpu += 1;
            }
            Ownership::ThirdParty => self.other += 1,
        }
    }
}

impl AddAssign for ClassificationTally {
    fn add_assign(&mut self, rhs: Self) {
        self.total += rhs.total;
        self.amd += rhs.amd;
        self.amdgpu += rhs.amdgpu;
        self.other += rhs.other;
    }
}
