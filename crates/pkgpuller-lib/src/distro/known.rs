use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFamily {
    Deb,
    Rpm,
}

impl PackageFamily {
    pub fn extension(self) -> &'static str {
        match self {
            PackageFamily::Deb => "deb",
            PackageFamily::Rpm => "rpm",
        }
    }
}

impl Display for PackageFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct KnownDistribution {
    pub tag: &'static str,
    pub family: PackageFamily,
    pub name: &'static str,
}

/// Distribution tags the puller knows how to handle, in the order a full run visits them.
pub const KNOWN_DISTRIBUTIONS: &[KnownDistribution] = &[
    KnownDistribution {
        tag: "ub22",
        family: PackageFamily::Deb,
        name: "Ubuntu 22.04",
    },
    KnownDistribution {
        tag: "ub24",
        family: PackageFamily::Deb,
        name: "Ubuntu 24.04",
    },
    KnownDistribution {
        tag: "deb12",
        family: PackageFamily::Deb,
        name: "Debian 12",
    },
    KnownDistribution {
        tag: "deb13",
        family: PackageFamily::Deb,
        name: "Debian 13",
    },
    KnownDistribution {
        tag: "el8",
        family: PackageFamily::Rpm,
        name: "RHEL 8",
    },
    KnownDistribution {
        tag: "el9",
        family: PackageFamily::Rpm,
        name: "RHEL 9",
    },
    KnownDistribution {
        tag: "el10",
        family: PackageFamily::Rpm,
        name: "RHEL 10",
    },
    KnownDistribution {
        tag: "sle15",
        family: PackageFamily::Rpm,
        name: "SLES 15",
    },
    KnownDistribution {
        tag: "sle16",
        family: PackageFamily::Rpm,
        name: "SLES 16",
    },
    KnownDistribution {
        tag: "amzn23",
        family: PackageFamily::Rpm,
        name: "Amazon Linux 2023",
    },
];

pub fn find_known_distribution(tag: &str) -> Option<&'static KnownDistribution> {
    KNOWN_DISTRIBUTIONS.iter().find(|known| known.tag == tag)
}
