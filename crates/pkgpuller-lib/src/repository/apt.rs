use super::types::{IndexEntry, IndexError, RepositoryIndex};
use crate::distro::PackageFamily;
use crate::verification::{Checksum, ChecksumAlgorithm};
use debian_packaging::control::{ControlFile, ControlParagraph};

fn field(paragraph: &ControlParagraph<'_>, name: &str) -> Option<String> {
    paragraph
        .field_str(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn preferred_checksum(paragraph: &ControlParagraph<'_>, package: &str) -> Option<Checksum> {
    ChecksumAlgorithm::PREFERRED_ORDER
        .iter()
        .find_map(|algorithm| {
            let value = paragraph.field_str(algorithm.apt_field_name())?;
            match Checksum::from_hex(*algorithm, value) {
                Ok(checksum) => Some(checksum),
                Err(e) => {
                    tracing::warn!(package = package, "Ignoring checksum: {}", e);
                    None
                }
            }
        })
}

/// Parses the stanzas of a decompressed APT `Packages` file.
pub fn parse_packages_index(content: &str) -> Result<RepositoryIndex, IndexError> {
    let control_file = ControlFile::parse_str(content)?;
    let mut entries = Vec::new();

    for paragraph in control_file.paragraphs() {
        let Some(name) = field(paragraph, "Package") else {
            tracing::warn!("Skipping stanza, no package name specified");
            continue;
        };
        let Some(filename) = field(paragraph, "Filename") else {
            tracing::warn!(package = %name, "Skipping stanza, no Filename specified");
            continue;
        };

        entries.push(IndexEntry {
            location: filename
                .strip_prefix("./")
                .unwrap_or(&filename)
                .to_string(),
            size: paragraph
                .field_str("Size")
                .and_then(|size| size.trim().parse().ok()),
            checksum: preferred_checksum(paragraph, &name),
            maintainer: field(paragraph, "Maintainer"),
            vendor: None,
            description: field(paragraph, "Description"),
            epoch: None,
            name,
        });
    }

    Ok(RepositoryIndex {
        family: PackageFamily::Deb,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGES: &str = "\
Package: amdgpu-core
Version: 1:6.12.12-2187269.24.04
Architecture: all
Maintainer: Advanced Micro Devices (AMD) <gpudriverdevsupport@amd.com>
Filename: pool/main/a/amdgpu-core/amdgpu-core_6.12.12-2187269.24.04_all.deb
Size: 2100
Description: Core meta package for unified amdgpu driver.

Package: amdgpu-dkms
Version: 1.0
Architecture: amd64
Maintainer: Advanced Micro Devices (AMD) <gpudriverdevsupport@amd.com>
Filename: pool/main/a/amdgpu-dkms_1.0_amd64.deb
Size: 12345
SHA256: 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824
Description: amdgpu driver in DKMS format.
 Multi-line description
 continues here.

Package: amdgpu-dkms-firmware
Version: 1.0
Architecture: all
Filename: pool/main/a/amdgpu-dkms-firmware_1.0_all.deb
Description: firmware
";

    #[test]
    fn test_apt_happy_path() {
        let index = parse_packages_index(PACKAGES).unwrap();

        let entry = index.locate("amdgpu-dkms").unwrap();
        assert_eq!(entry.location, "pool/main/a/amdgpu-dkms_1.0_amd64.deb");
        assert_eq!(entry.size, Some(12345));
        assert_eq!(
            entry.checksum.as_ref().map(|c| c.algorithm),
            Some(ChecksumAlgorithm::Sha256)
        );
        assert_eq!(
            entry.maintainer.as_deref(),
            Some("Advanced Micro Devices (AMD) <gpudriverdevsupport@amd.com>")
        );
        assert!(
            entry
                .description
                .as_deref()
                .is_some_and(|d| d.contains("continues here"))
        );
    }

    #[test]
    fn test_stanzas_kept_in_document_order() {
        let index = parse_packages_index(PACKAGES).unwrap();
        let names: Vec<&str> = index.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["amdgpu-core", "amdgpu-dkms", "amdgpu-dkms-firmware"]
        );
        assert_eq!(index.family, PackageFamily::Deb);
    }

    #[test]
    fn test_prefix_request_resolves_suffixed_variant() {
        let index = parse_packages_index(
            "Package: amdrocm-amdsmi7.11-gfx950\nFilename: ./pool/main/amdsmi.deb\n",
        )
        .unwrap();

        assert_eq!(
            index.locate("amdrocm-amdsmi7.11").map(|e| e.location.as_str()),
            Some("pool/main/amdsmi.deb")
        );
    }

    #[test]
    fn test_stanza_without_filename_is_skipped() {
        let index =
            parse_packages_index("Package: broken\nVersion: 1\n\nPackage: ok\nFilename: ok.deb\n")
                .unwrap();
        assert_eq!(index.entries.len(), 1);
        assert_eq!(index.entries[0].name, "ok");
    }
}
