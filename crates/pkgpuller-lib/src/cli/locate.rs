use crate::cli::LocateParams;
use crate::error::PullError;
use crate::http::build_http_operator;
use crate::naming::{VariantContext, variant_name};
use crate::repository::{FetchOutcome, fetch_index};

/// Prints the artifact URL every requested package resolves to, one per line.
pub async fn run_locate(params: LocateParams) -> Result<(), PullError> {
    let LocateParams {
        distribution,
        packages,
        rocm_version,
        gfx_arch,
        network,
    } = params;

    let context = VariantContext {
        rocm_version: rocm_version.as_deref(),
        gfx_arch: gfx_arch.as_deref(),
    };
    let names = packages
        .iter()
        .map(|request| variant_name(request, distribution.family, &context))
        .collect::<Result<Vec<_>, _>>()?;

    let scratch_dir = tempfile::tempdir()?;
    let mut indices = Vec::new();
    for source in &distribution.sources {
        let op = build_http_operator(source.base_url(), &network)?;
        match fetch_index(&op, source, scratch_dir.path()).await? {
            FetchOutcome::Fetched(fetched) => indices.push((source.base_url(), fetched)),
            FetchOutcome::Unavailable { url, reason } => {
                tracing::warn!(distro = %distribution.tag, "Skipping {}: {}", url, reason);
            }
        }
    }
    if indices.is_empty() {
        tracing::warn!(distro = %distribution.tag, "No repository available for this release");
        return Ok(());
    }

    for name in names {
        let located = indices.iter().find_map(|(base_url, fetched)| {
            fetched
                .index
                .locate(&name)
                .map(|entry| (*base_url, entry))
        });
        match located {
            Some((base_url, entry)) => println!(
                "{}\t{}\t{}/{}",
                name, entry.name, base_url, entry.location
            ),
            None => tracing::warn!(package = %name, "Package not found in any repository index"),
        }
    }

    Ok(())
}
