use super::metadata::PackageMetadata;
use crate::distro::PackageFamily;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    AmdFirstParty,
    AmdGpuDriver,
    ThirdParty,
}

impl Ownership {
    pub fn is_amd(self) -> bool {
        matches!(self, Ownership::AmdFirstParty | Ownership::AmdGpuDriver)
    }

    /// Directory, relative to the distro directory, packages of this class are dumped into.
    pub fn dump_dir_name(self) -> &'static str {
        match self {
            Ownership::AmdFirstParty => "packages-amd",
            Ownership::AmdGpuDriver => "packages-amdgpu",
            Ownership::ThirdParty => "packages-other",
        }
    }
}

impl Display for Ownership {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Ownership::AmdFirstParty => "AMD",
            Ownership::AmdGpuDriver => "AMD GPU driver",
            Ownership::ThirdParty => "third-party",
        })
    }
}

fn default_name_markers() -> Vec<String> {
    ["amdgpu", "rocm", "hip"].map(String::from).to_vec()
}

fn default_driver_identities() -> Vec<String> {
    ["gpudriverdevsupport@amd.com", "Advanced Micro Devices"]
        .map(String::from)
        .to_vec()
}

fn default_distro_identities() -> Vec<String> {
    [
        "Ubuntu Developers",
        "Debian",
        "Red Hat",
        "Fedora Project",
        "SUSE",
        "Amazon Linux",
    ]
    .map(String::from)
    .to_vec()
}

fn default_identity_markers() -> Vec<String> {
    ["Advanced Micro Devices", "ROCm", "AMD", "amd.com"]
        .map(String::from)
        .to_vec()
}

fn default_description_markers() -> Vec<String> {
    ["AMD", "ROCm", "Radeon", "Instinct"].map(String::from).to_vec()
}

fn default_driver_team_addresses() -> Vec<String> {
    ["gpudriverdevsupport@amd.com", "amd-gfx@lists.freedesktop.org"]
        .map(String::from)
        .to_vec()
}

/// Substring tables the ownership rules match against. All matches are case-sensitive.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClassifierSettings {
    #[serde(default = "default_name_markers")]
    pub name_markers: Vec<String>,
    #[serde(default = "default_driver_identities")]
    pub driver_identities: Vec<String>,
    #[serde(default = "default_distro_identities")]
    pub distro_identities: Vec<String>,
    #[serde(default = "default_identity_markers")]
    pub identity_markers: Vec<String>,
    #[serde(default = "default_description_markers")]
    pub description_markers: Vec<String>,
    #[serde(default = "default_driver_team_addresses")]
    pub driver_team_addresses: Vec<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            name_markers: default_name_markers(),
            driver_identities: default_driver_identities(),
            distro_identities: default_distro_identities(),
            identity_markers: default_identity_markers(),
            description_markers: default_description_markers(),
            driver_team_addresses: default_driver_team_addresses(),
        }
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| !needle.is_empty() && haystack.contains(needle.as_str()))
}

pub type RuleFn = fn(&PackageMetadata, &ClassifierSettings) -> Option<Ownership>;

pub struct Rule {
    pub name: &'static str,
    pub apply: RuleFn,
}

fn by_package_name(meta: &PackageMetadata, settings: &ClassifierSettings) -> Option<Ownership> {
    if !contains_any(&meta.name, &settings.name_markers) {
        return None;
    }

    // Distros ship their own amdgpu userspace (libdrm-amdgpu, ...) and hip builds.
    let identity = meta.identity();
    if meta.name.contains("amdgpu")
        && identity.is_some_and(|id| !contains_any(id, &settings.driver_identities))
    {
        return Some(Ownership::ThirdParty);
    }
    if meta.name.contains("hip")
        && identity.is_some_and(|id| contains_any(id, &settings.distro_identities))
    {
        return Some(Ownership::ThirdParty);
    }

    Some(Ownership::AmdFirstParty)
}

fn by_identity(meta: &PackageMetadata, settings: &ClassifierSettings) -> Option<Ownership> {
    meta.identity()
        .filter(|id| contains_any(id, &settings.identity_markers))
        .map(|_| Ownership::AmdFirstParty)
}

fn by_description(meta: &PackageMetadata, settings: &ClassifierSettings) -> Option<Ownership> {
    meta.description
        .as_deref()
        .filter(|description| contains_any(description, &settings.description_markers))
        .map(|_| Ownership::AmdFirstParty)
}

/// Evaluated in order; the first rule returning a verdict decides.
pub const RULES: &[Rule] = &[
    Rule {
        name: "package-name",
        apply: by_package_name,
    },
    Rule {
        name: "maintainer",
        apply: by_identity,
    },
    Rule {
        name: "description",
        apply: by_description,
    },
];

fn is_driver_package(meta: &PackageMetadata, settings: &ClassifierSettings) -> bool {
    match meta.family {
        PackageFamily::Deb => meta
            .maintainer
            .as_deref()
            .is_some_and(|maintainer| contains_any(maintainer, &settings.driver_team_addresses)),
        PackageFamily::Rpm => meta.has_epoch(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub ownership: Ownership,
    /// Name of the rule that decided, `fallback` when none did.
    pub rule: &'static str,
}

pub fn classify(meta: &PackageMetadata, settings: &ClassifierSettings) -> Classification {
    let (ownership, rule) = RULES
        .iter()
        .find_map(|rule| (rule.apply)(meta, settings).map(|ownership| (ownership, rule.name)))
        .unwrap_or((Ownership::ThirdParty, "fallback"));

    let ownership = if ownership.is_amd() && is_driver_package(meta, settings) {
        Ownership::AmdGpuDriver
    } else {
        ownership
    };

    Classification { ownership, rule }
}
