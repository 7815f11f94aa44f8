use super::types::{IndexEntry, IndexError, RepositoryIndex};
use crate::distro::PackageFamily;
use crate::verification::{Checksum, ChecksumAlgorithm};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

fn xml_error(document: &'static str) -> impl Fn(quick_xml::Error) -> IndexError {
    move |e| IndexError::Xml {
        document,
        reason: e.to_string(),
    }
}

fn attribute(
    element: &BytesStart<'_>,
    name: &str,
    document: &'static str,
) -> Result<Option<String>, IndexError> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| xml_error(document)(e.into()))?;
    attr.map(|attr| attr.unescape_value().map(|value| value.into_owned()))
        .transpose()
        .map_err(xml_error(document))
}

/// Finds the `href` of the `primary` metadata file listed in `repomd.xml`.
pub fn primary_location(repomd: &str) -> Result<String, IndexError> {
    const DOCUMENT: &str = "repomd.xml";

    let mut reader = Reader::from_str(repomd);
    reader.config_mut().trim_text(true);
    let mut in_primary = false;

    loop {
        match reader.read_event().map_err(xml_error(DOCUMENT))? {
            Event::Start(e) if e.local_name().as_ref() == b"data" => {
                in_primary = attribute(&e, "type", DOCUMENT)?.as_deref() == Some("primary");
            }
            Event::Start(e) | Event::Empty(e)
                if in_primary && e.local_name().as_ref() == b"location" =>
            {
                if let Some(href) = attribute(&e, "href", DOCUMENT)? {
                    return Ok(href);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"data" => in_primary = false,
            Event::Eof => break,
            _ => {}
        }
    }

    Err(IndexError::MissingPrimary)
}

#[derive(Default)]
struct PackageBuilder {
    name: Option<String>,
    arch: Option<String>,
    location: Option<String>,
    size: Option<u64>,
    checksum_type: Option<String>,
    checksum_value: Option<String>,
    packager: Option<String>,
    vendor: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    epoch: Option<String>,
}

impl PackageBuilder {
    fn element_start(&mut self, element: &BytesStart<'_>, parent: &[u8]) -> Result<(), IndexError> {
        const DOCUMENT: &str = "primary.xml";

        match (parent, element.local_name().as_ref()) {
            (b"package", b"location") => self.location = attribute(element, "href", DOCUMENT)?,
            (b"package", b"version") => self.epoch = attribute(element, "epoch", DOCUMENT)?,
            (b"package", b"checksum") => {
                self.checksum_type = attribute(element, "type", DOCUMENT)?;
            }
            (b"package", b"size") => {
                self.size = attribute(element, "package", DOCUMENT)?
                    .and_then(|size| size.parse().ok());
            }
            _ => {}
        }
        Ok(())
    }

    fn element_text(&mut self, parent: &[u8], element: &[u8], text: String) {
        let text = Some(text).filter(|t| !t.trim().is_empty());
        match (parent, element) {
            (b"package", b"name") => self.name = text,
            (b"package", b"arch") => self.arch = text,
            (b"package", b"checksum") => self.checksum_value = text,
            (b"package", b"packager") => self.packager = text,
            (b"package", b"summary") => self.summary = text,
            (b"package", b"description") => self.description = text,
            (b"format", b"vendor") => self.vendor = text,
            _ => {}
        }
    }

    fn finish(self) -> Option<IndexEntry> {
        let name = self.name?;
        if self.arch.as_deref() == Some("src") {
            tracing::trace!(package = %name, "Skipping source package");
            return None;
        }
        let Some(location) = self.location else {
            tracing::warn!(package = %name, "Skipping package, no location specified");
            return None;
        };

        let checksum = match (self.checksum_type, self.checksum_value) {
            (Some(kind), Some(value)) => ChecksumAlgorithm::from_rpm_type(&kind)
                .and_then(|algorithm| Checksum::from_hex(algorithm, &value).ok()),
            _ => None,
        };
        let description = match (self.summary, self.description) {
            (Some(summary), Some(description)) => Some(format!("{summary}\n{description}")),
            (summary, description) => summary.or(description),
        };

        Some(IndexEntry {
            name,
            location,
            size: self.size,
            checksum,
            maintainer: self.packager,
            vendor: self.vendor,
            description,
            epoch: self.epoch,
        })
    }
}

/// Parses the `<package>` elements of a decompressed `primary.xml`.
pub fn parse_primary(primary: &str) -> Result<RepositoryIndex, IndexError> {
    const DOCUMENT: &str = "primary.xml";

    let mut reader = Reader::from_str(primary);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();
    let mut current: Option<PackageBuilder> = None;
    let mut entries = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error(DOCUMENT))? {
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();
                if local == b"package" {
                    current = Some(PackageBuilder::default());
                } else if let Some(builder) = current.as_mut() {
                    builder.element_start(&e, stack.last().map(Vec::as_slice).unwrap_or(b""))?;
                }
                stack.push(local);
                text.clear();
            }
            Event::Empty(e) => {
                if let Some(builder) = current.as_mut() {
                    builder.element_start(&e, stack.last().map(Vec::as_slice).unwrap_or(b""))?;
                }
            }
            Event::Text(t) => text.push_str(&t.unescape().map_err(xml_error(DOCUMENT))?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(c.as_ref())),
            Event::End(_) => {
                let Some(local) = stack.pop() else {
                    continue;
                };
                if local == b"package" {
                    if let Some(entry) = current.take().and_then(PackageBuilder::finish) {
                        entries.push(entry);
                    }
                } else if let Some(builder) = current.as_mut() {
                    let parent = stack.last().map(Vec::as_slice).unwrap_or(b"");
                    builder.element_text(parent, &local, std::mem::take(&mut text));
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(RepositoryIndex {
        family: PackageFamily::Rpm,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPOMD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo" xmlns:rpm="http://linux.duke.edu/metadata/rpm">
  <revision>1736900000</revision>
  <data type="filelists">
    <checksum type="sha256">aaaa</checksum>
    <location href="repodata/abc-filelists.xml.gz"/>
  </data>
  <data type="primary">
    <checksum type="sha256">bbbb</checksum>
    <location href="repodata/def-primary.xml.gz"/>
    <size>1024</size>
  </data>
</repomd>
"#;

    const PRIMARY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" xmlns:rpm="http://linux.duke.edu/metadata/rpm" packages="3">
<package type="rpm">
  <name>amdgpu-dkms</name>
  <arch>noarch</arch>
  <version epoch="1" ver="1.0" rel="1.el9"/>
  <checksum type="sha256" pkgid="YES">2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824</checksum>
  <summary>amdgpu driver in DKMS format</summary>
  <description><![CDATA[AMD GPU kernel driver & firmware]]></description>
  <packager>Advanced Micro Devices (AMD) &lt;gpudriverdevsupport@amd.com&gt;</packager>
  <size package="4096" installed="8192" archive="8300"/>
  <location href="Packages/a/amdgpu-dkms-1.0.rpm"/>
  <format>
    <rpm:license>GPL-2.0</rpm:license>
    <rpm:vendor>Advanced Micro Devices (AMD)</rpm:vendor>
    <rpm:provides>
      <rpm:entry name="amdgpu-dkms" flags="EQ" epoch="1" ver="1.0" rel="1.el9"/>
    </rpm:provides>
  </format>
</package>
<package type="rpm">
  <name>amdgpu-dkms</name>
  <arch>src</arch>
  <version epoch="1" ver="1.0" rel="1.el9"/>
  <location href="SRPMS/amdgpu-dkms-1.0.src.rpm"/>
</package>
<package type="rpm">
  <name>libdrm-amdgpu</name>
  <arch>x86_64</arch>
  <version epoch="0" ver="2.4" rel="1"/>
  <summary>Userspace interface to amdgpu kernel DRM services</summary>
  <location href="Packages/l/libdrm-amdgpu-2.4.rpm"/>
  <format>
    <rpm:vendor>Red Hat, Inc.</rpm:vendor>
  </format>
</package>
</metadata>
"#;

    #[test]
    fn test_primary_location_from_repomd() {
        assert_eq!(
            primary_location(REPOMD).unwrap(),
            "repodata/def-primary.xml.gz"
        );
    }

    #[test]
    fn test_repomd_without_primary() {
        let repomd = r#"<repomd><data type="other"><location href="x.xml.gz"/></data></repomd>"#;
        assert!(matches!(
            primary_location(repomd),
            Err(IndexError::MissingPrimary)
        ));
    }

    #[test]
    fn test_rpm_happy_path() {
        let index = parse_primary(PRIMARY).unwrap();
        let entry = index.locate("amdgpu-dkms").unwrap();

        assert_eq!(entry.location, "Packages/a/amdgpu-dkms-1.0.rpm");
        assert_eq!(entry.epoch.as_deref(), Some("1"));
        assert_eq!(entry.size, Some(4096));
        assert_eq!(entry.vendor.as_deref(), Some("Advanced Micro Devices (AMD)"));
        assert_eq!(
            entry.maintainer.as_deref(),
            Some("Advanced Micro Devices (AMD) <gpudriverdevsupport@amd.com>")
        );
        assert_eq!(
            entry.description.as_deref(),
            Some("amdgpu driver in DKMS format\nAMD GPU kernel driver & firmware")
        );
        assert_eq!(
            entry.checksum.as_ref().map(|c| c.algorithm),
            Some(ChecksumAlgorithm::Sha256)
        );
    }

    #[test]
    fn test_source_packages_and_nested_names_ignored() {
        let index = parse_primary(PRIMARY).unwrap();
        let names: Vec<&str> = index.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["amdgpu-dkms", "libdrm-amdgpu"]);
        assert_eq!(index.entries[1].vendor.as_deref(), Some("Red Hat, Inc."));
    }

    #[test]
    fn test_malformed_primary_is_an_error() {
        assert!(matches!(
            parse_primary("<metadata><package><name>x</metadata>"),
            Err(IndexError::Xml { .. })
        ));
    }
}
