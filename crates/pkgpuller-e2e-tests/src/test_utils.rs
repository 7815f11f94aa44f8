use debian_packaging::control::ControlParagraph;
use debian_packaging::deb::builder::DebBuilder;
use eyre::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockito::{Mock, ServerGuard};
use pkgpuller_lib::cli::{Command, PullParams, ResolvedCommand, resolve_command};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ROCM_VERSION: &str = "7.11.0";

/// A package served by a fake repository.
#[derive(Clone, Debug)]
pub struct FakePackage {
    pub name: String,
    pub location: String,
    pub content: Vec<u8>,
    pub maintainer: String,
    pub description: String,
    pub epoch: Option<String>,
    /// Overrides the digest advertised in the index.
    pub advertised_sha256: Option<String>,
}

impl FakePackage {
    pub fn new(name: &str, location: &str, maintainer: &str) -> Self {
        Self {
            name: name.to_string(),
            location: location.to_string(),
            content: format!("payload of {name}\n").into_bytes(),
            maintainer: maintainer.to_string(),
            description: format!("{name} test package"),
            epoch: None,
            advertised_sha256: None,
        }
    }

    pub fn with_epoch(mut self, epoch: &str) -> Self {
        self.epoch = Some(epoch.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Replaces the served bytes, e.g. with a real archive from [`build_deb`].
    pub fn with_content(mut self, content: Vec<u8>) -> Self {
        self.content = content;
        self
    }

    pub fn with_advertised_sha256(mut self, digest: &str) -> Self {
        self.advertised_sha256 = Some(digest.to_string());
        self
    }

    pub fn file_name(&self) -> &str {
        self.location.rsplit('/').next().unwrap_or(&self.location)
    }

    pub fn sha256(&self) -> String {
        self.advertised_sha256
            .clone()
            .unwrap_or_else(|| sha256_hex(&self.content))
    }
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Builds a `.deb` whose control member carries the given fields.
pub fn build_deb(name: &str, maintainer: &str, description: &str) -> Result<Vec<u8>> {
    let mut control = ControlParagraph::default();
    control.set_field_from_string("Package".into(), name.to_string().into());
    control.set_field_from_string("Version".into(), "1.0".into());
    control.set_field_from_string("Architecture".into(), "amd64".into());
    control.set_field_from_string("Maintainer".into(), maintainer.to_string().into());
    control.set_field_from_string("Description".into(), description.to_string().into());

    let mut deb = Vec::new();
    DebBuilder::new(control).write(&mut deb)?;
    Ok(deb)
}

pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

pub fn apt_packages_index(packages: &[FakePackage]) -> String {
    packages
        .iter()
        .map(|package| {
            format!(
                "Package: {}\nVersion: 1.0\nArchitecture: amd64\nMaintainer: {}\nFilename: {}\nSize: {}\nSHA256: {}\nDescription: {}\n",
                package.name,
                package.maintainer,
                package.location,
                package.content.len(),
                package.sha256(),
                package.description,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn rpm_primary_xml(packages: &[FakePackage]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata xmlns=\"http://linux.duke.edu/metadata/common\" xmlns:rpm=\"http://linux.duke.edu/metadata/rpm\" packages=\"{}\">\n",
        packages.len()
    );
    for package in packages {
        xml.push_str(&format!(
            r#"<package type="rpm">
  <name>{name}</name>
  <arch>x86_64</arch>
  <version epoch="{epoch}" ver="1.0" rel="1"/>
  <checksum type="sha256" pkgid="YES">{sha256}</checksum>
  <summary>{summary}</summary>
  <packager>{packager}</packager>
  <size package="{size}" installed="{size}" archive="{size}"/>
  <location href="{location}"/>
  <format>
    <rpm:vendor>{packager}</rpm:vendor>
  </format>
</package>
"#,
            name = package.name,
            epoch = package.epoch.as_deref().unwrap_or("0"),
            sha256 = package.sha256(),
            summary = xml_escape(&package.description),
            packager = xml_escape(&package.maintainer),
            size = package.content.len(),
            location = package.location,
        ));
    }
    xml.push_str("</metadata>\n");
    xml
}

pub fn rpm_repomd_xml(primary_href: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <revision>1</revision>
  <data type="primary">
    <location href="{primary_href}"/>
  </data>
</repomd>
"#
    )
}

/// Serves `body` at `path` for both `GET` and `HEAD`.
pub async fn serve_file(server: &mut ServerGuard, path: &str, body: Vec<u8>) -> Vec<Mock> {
    let mut mocks = Vec::with_capacity(2);
    for method in ["GET", "HEAD"] {
        mocks.push(
            server
                .mock(method, path)
                .with_status(200)
                .with_body(body.clone())
                .create_async()
                .await,
        );
    }
    mocks
}

pub async fn serve_missing(server: &mut ServerGuard, path: &str) -> Vec<Mock> {
    let mut mocks = Vec::with_capacity(2);
    for method in ["GET", "HEAD"] {
        mocks.push(
            server
                .mock(method, path)
                .with_status(404)
                .create_async()
                .await,
        );
    }
    mocks
}

/// Publishes an APT repository rooted at `prefix` with suite `noble`, component `main`.
pub async fn serve_apt_repository(
    server: &mut ServerGuard,
    prefix: &str,
    packages: &[FakePackage],
) -> Result<Vec<Mock>> {
    let mut mocks = serve_file(
        server,
        &format!("{prefix}/dists/noble/main/binary-amd64/Packages.gz"),
        gzip(apt_packages_index(packages).as_bytes())?,
    )
    .await;
    for package in packages {
        mocks.extend(
            serve_file(
                server,
                &format!("{prefix}/{}", package.location),
                package.content.clone(),
            )
            .await,
        );
    }
    Ok(mocks)
}

/// Publishes an rpm repository rooted at `prefix` with gzipped primary metadata.
pub async fn serve_rpm_repository(
    server: &mut ServerGuard,
    prefix: &str,
    packages: &[FakePackage],
) -> Result<Vec<Mock>> {
    let primary_href = "repodata/0123-primary.xml.gz";
    let mut mocks = serve_file(
        server,
        &format!("{prefix}/repodata/repomd.xml"),
        rpm_repomd_xml(primary_href).into_bytes(),
    )
    .await;
    mocks.extend(
        serve_file(
            server,
            &format!("{prefix}/{primary_href}"),
            gzip(rpm_primary_xml(packages).as_bytes())?,
        )
        .await,
    );
    for package in packages {
        mocks.extend(
            serve_file(
                server,
                &format!("{prefix}/{}", package.location),
                package.content.clone(),
            )
            .await,
        );
    }
    Ok(mocks)
}

pub fn apt_line(server_url: &str, prefix: &str) -> String {
    format!("deb [arch=amd64] {server_url}{prefix} noble main")
}

pub fn rpm_baseurl(server_url: &str, prefix: &str) -> String {
    format!("baseurl={server_url}{prefix}")
}

/// A distribution entry of the generated configuration file.
pub struct TestDistribution {
    pub tag: String,
    pub repositories: Vec<String>,
}

impl TestDistribution {
    pub fn new(tag: &str, repositories: &[String]) -> Self {
        Self {
            tag: tag.to_string(),
            repositories: repositories.to_vec(),
        }
    }
}

pub struct TestEnvironment {
    pub dir: TempDir,
    pub config_path: PathBuf,
}

impl TestEnvironment {
    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn distro_dir(&self, tag: &str) -> PathBuf {
        self.output_dir().join(tag)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.path().join("summary.json")
    }
}

fn yaml_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn write_config(
    dir: &Path,
    packages: &[&str],
    distributions: &[TestDistribution],
) -> Result<PathBuf> {
    let mut yaml = format!("rocm_version: '{ROCM_VERSION}'\ngfx_arch: gfx950-dcgpu\npackages:\n");
    for package in packages {
        yaml.push_str(&format!("  - {}\n", yaml_quote(package)));
    }
    yaml.push_str("distributions:\n");
    for distro in distributions {
        yaml.push_str(&format!("  - tag: {}\n    repositories:\n", distro.tag));
        for repository in &distro.repositories {
            yaml.push_str(&format!("      - {}\n", yaml_quote(repository)));
        }
    }
    yaml.push_str(&format!(
        "output:\n  path: {}\nnetwork:\n  timeout_secs: 10\n  max_retries: 1\n",
        yaml_quote(&dir.join("out").to_string_lossy())
    ));

    let config_path = dir.join("config.yaml");
    std::fs::write(&config_path, yaml)?;
    Ok(config_path)
}

pub fn setup_test_environment(
    packages: &[&str],
    distributions: &[TestDistribution],
) -> Result<TestEnvironment> {
    let dir = tempfile::tempdir()?;
    let config_path = write_config(dir.path(), packages, distributions)?;
    Ok(TestEnvironment { dir, config_path })
}

/// Resolves a `pull` the way the binary does.
pub fn build_pull_params(
    env: &TestEnvironment,
    distros: &[&str],
    dump_amd: bool,
    dump_other: bool,
) -> Result<PullParams> {
    let command = Command::Pull {
        config_path: env.config_path.to_string_lossy().into_owned(),
        distros: distros.iter().map(|tag| tag.to_string()).collect(),
        all: distros.is_empty(),
        packages: vec![],
        output_dir: None,
        dump_amd,
        dump_other,
        summary_json: Some(env.summary_path().to_string_lossy().into_owned()),
        distro_parallelism: None,
    };
    match resolve_command(command)? {
        ResolvedCommand::Pull(params) => Ok(params),
        other => Err(eyre::eyre!("Resolved command type mismatch: {other:?}")),
    }
}

pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    Ok(names)
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("pkgpuller_lib=debug,pkgpuller_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
