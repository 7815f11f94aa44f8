use crate::config::PackageRequest;
use crate::distro::PackageFamily;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NamingError {
    #[error("{package} is versioned but no ROCm version is configured")]
    MissingVersion { package: String },
    #[error("version {version} does not have major.minor components")]
    InvalidVersion { version: String },
    #[error("{package} is GPU architecture specific but no gfx_arch is configured")]
    MissingGfxArch { package: String },
}

/// Release parameters that select which variant of a logical package a repository carries.
#[derive(Clone, Debug, Default)]
pub struct VariantContext<'a> {
    pub rocm_version: Option<&'a str>,
    pub gfx_arch: Option<&'a str>,
}

fn leading_digits(component: &str) -> Option<&str> {
    let end = component
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(component.len());
    (end > 0).then(|| &component[..end])
}

/// `7.11.0rc2` -> `7.11`
pub fn major_minor(version: &str) -> Result<String, NamingError> {
    let mut parts = version.split('.');
    let invalid = || NamingError::InvalidVersion {
        version: version.to_string(),
    };
    let major = parts.next().and_then(leading_digits).ok_or_else(invalid)?;
    let minor = parts.next().and_then(leading_digits).ok_or_else(invalid)?;
    Ok(format!("{major}.{minor}"))
}

/// `gfx950-dcgpu` -> `gfx950`, `gfx94X-dcgpu` -> `gfx94x`
pub fn gfx_suffix(gfx_arch: &str) -> String {
    gfx_arch
        .split('-')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Concrete name under which `request` is published for `family`.
pub fn variant_name(
    request: &PackageRequest,
    family: PackageFamily,
    context: &VariantContext<'_>,
) -> Result<String, NamingError> {
    let mut name = request.name().to_string();

    if family == PackageFamily::Deb {
        if let Some(stem) = name.strip_suffix("-devel") {
            name = format!("{stem}-dev");
        }
    }

    if request.versioned() {
        let version = context
            .rocm_version
            .ok_or_else(|| NamingError::MissingVersion {
                package: request.name().to_string(),
            })?;
        name.push_str(&major_minor(version)?);
    }

    if request.gfx_specific() {
        let gfx_arch = context
            .gfx_arch
            .filter(|arch| !arch.is_empty())
            .ok_or_else(|| NamingError::MissingGfxArch {
                package: request.name().to_string(),
            })?;
        name.push('-');
        name.push_str(&gfx_suffix(gfx_arch));
    }

    Ok(name)
}
