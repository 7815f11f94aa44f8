use crate::distro::PackageFamily;
use crate::repository::IndexEntry;
use debian_packaging::deb::reader::resolve_control_file;
use std::path::Path;

/// Text fields the ownership rules look at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageMetadata {
    pub family: PackageFamily,
    pub name: String,
    pub maintainer: Option<String>,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub epoch: Option<String>,
}

impl PackageMetadata {
    pub fn from_index_entry(family: PackageFamily, entry: &IndexEntry) -> Self {
        Self {
            family,
            name: entry.name.clone(),
            maintainer: entry.maintainer.clone(),
            vendor: entry.vendor.clone(),
            description: entry.description.clone(),
            epoch: entry.epoch.clone(),
        }
    }

    /// Who published the package: the `Maintainer` of a deb, the `Vendor` of an rpm (its
    /// packager when no vendor is recorded).
    pub fn identity(&self) -> Option<&str> {
        let identity = match self.family {
            PackageFamily::Deb => self.maintainer.as_deref(),
            PackageFamily::Rpm => self.vendor.as_deref().or(self.maintainer.as_deref()),
        };
        identity.map(str::trim).filter(|value| !value.is_empty())
    }

    /// rpm epochs of `0` are how repodata spells "no epoch".
    pub fn has_epoch(&self) -> bool {
        self.epoch
            .as_deref()
            .map(str::trim)
            .is_some_and(|epoch| !epoch.is_empty() && epoch != "0" && epoch != "(none)")
    }
}

/// Reads `Package`, `Maintainer` and `Description` from the control member of a `.deb`.
pub fn read_deb_metadata(
    path: &Path,
) -> Result<PackageMetadata, debian_packaging::error::DebianError> {
    let file = std::fs::File::open(path)?;
    let control = resolve_control_file(std::io::BufReader::new(file))?;

    let field = |name: &str| {
        control
            .field_str(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    Ok(PackageMetadata {
        family: PackageFamily::Deb,
        name: control.package()?.to_string(),
        maintainer: field("Maintainer"),
        vendor: None,
        description: field("Description"),
        epoch: None,
    })
}
