use super::outcome::{DistroOutcome, DistroReport, PullOutcome, RunSummary};
use crate::classify::{ClassificationTally, ClassifierSettings, DumpOptions, classify_package_file};
use crate::config::{NetworkConfig, PackageRequest};
use crate::distro::{Distribution, RepositorySource};
use crate::download::{DownloadItem, download_package};
use crate::http::build_http_operator;
use crate::naming::{VariantContext, variant_name};
use crate::repository::{FetchOutcome, FetchedIndex, IndexEntry, fetch_index};
use futures::stream::{FuturesUnordered, StreamExt};
use opendal::Operator;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;

/// Everything a pull needs besides the distributions themselves.
#[derive(Clone, Debug)]
pub struct PullSettings {
    pub packages: Vec<PackageRequest>,
    pub rocm_version: Option<String>,
    pub gfx_arch: Option<String>,
    pub output_dir: PathBuf,
    pub dump: DumpOptions,
    pub classifier: ClassifierSettings,
    pub network: NetworkConfig,
}

impl PullSettings {
    fn variant_context(&self) -> VariantContext<'_> {
        VariantContext {
            rocm_version: self.rocm_version.as_deref(),
            gfx_arch: self.gfx_arch.as_deref(),
        }
    }
}

struct OpenRepository<'a> {
    source: &'a RepositorySource,
    op: Operator,
    fetched: FetchedIndex,
}

struct PlannedDownload {
    item: DownloadItem,
    entry: IndexEntry,
    repository: usize,
}

/// Pulls the requested packages of one distribution into `<output_dir>/<tag>`.
pub async fn pull_distribution(distro: &Distribution, settings: &PullSettings) -> PullOutcome {
    let distro_dir = distro.output_dir(&settings.output_dir);

    let context = settings.variant_context();
    let mut requested = Vec::with_capacity(settings.packages.len());
    for request in &settings.packages {
        match variant_name(request, distro.family, &context) {
            Ok(name) => requested.push(name),
            Err(e) => return PullOutcome::failed(e),
        }
    }

    tracing::info!(repositories = distro.sources.len(), "Fetching repository indices");
    let mut repositories = Vec::with_capacity(distro.sources.len());
    let mut unavailable = Vec::new();
    for source in &distro.sources {
        let op = match build_http_operator(source.base_url(), &settings.network) {
            Ok(op) => op,
            Err(e) => return PullOutcome::failed(e),
        };
        match fetch_index(&op, source, &distro_dir).await {
            Ok(FetchOutcome::Fetched(fetched)) => repositories.push(OpenRepository {
                source,
                op,
                fetched,
            }),
            Ok(FetchOutcome::Unavailable { url, reason }) => {
                unavailable.push(format!("{url}: {reason}"));
            }
            Err(e) => return PullOutcome::failed(e),
        }
    }

    // Nothing is created under the output root for a skipped distribution.
    if repositories.is_empty() {
        return PullOutcome::Skipped {
            reason: unavailable.join("; "),
        };
    }
    if let Err(e) = std::fs::create_dir_all(&distro_dir) {
        return PullOutcome::failed(format!(
            "Failed to create {}: {}",
            distro_dir.display(),
            e
        ));
    }

    tracing::info!(packages = requested.len(), "Resolving packages");
    let mut report = DistroReport::default();
    let mut planned = Vec::new();
    let mut seen_outputs = HashSet::new();
    for name in requested {
        let located = repositories.iter().enumerate().find_map(|(i, repo)| {
            repo.fetched.index.locate(&name).map(|entry| (i, entry))
        });
        let Some((repository, entry)) = located else {
            tracing::warn!(package = %name, "Package not found in any repository index");
            report.not_found.push(name);
            continue;
        };

        let output_path = distro_dir.join(entry.file_name());
        if !seen_outputs.insert(output_path.clone()) {
            tracing::debug!(package = %name, output = %output_path.display(), "Already scheduled");
            continue;
        }
        if entry.name != name {
            tracing::debug!(requested = %name, package = %entry.name, "Resolved by prefix");
        }

        planned.push(PlannedDownload {
            item: DownloadItem {
                requested: name,
                package: entry.name.clone(),
                rel_path: entry.location.clone(),
                size: entry.size,
                checksum: entry.checksum.clone(),
                output_path,
            },
            entry: entry.clone(),
            repository,
        });
    }

    let operators: Vec<(Operator, &RepositorySource)> = repositories
        .into_iter()
        .map(|repo| (repo.op, repo.source))
        .collect();

    let mut failures = Vec::new();
    let mut tally = ClassificationTally::default();
    for plan in &planned {
        let (op, source) = &operators[plan.repository];
        if let Err(e) = download_package(op, source.base_url(), &plan.item).await {
            tracing::error!(package = %plan.item.package, "Download failed: {:#}", e);
            failures.push(plan.item.package.clone());
            continue;
        }

        match classify_package_file(
            &plan.item.output_path,
            distro.family,
            Some(&plan.entry),
            &settings.classifier,
            settings.dump,
            &mut tally,
        )
        .await
        {
            Ok(_) => report.downloaded.push(plan.item.output_path.clone()),
            Err(e) => {
                tracing::error!(package = %plan.item.package, "Classification failed: {}", e);
                failures.push(plan.item.package.clone());
            }
        }
    }
    report.tally = tally;

    if failures.is_empty() {
        tracing::info!(
            downloaded = report.downloaded.len(),
            not_found = report.not_found.len(),
            "Distribution pulled"
        );
        PullOutcome::Success(report)
    } else {
        PullOutcome::Failed {
            error: format!(
                "{} of {} packages failed: {}",
                failures.len(),
                planned.len(),
                failures.join(", ")
            ),
        }
    }
}

/// Pulls every distribution, at most `network.distro_parallelism` at a time.
pub async fn pull_all(distributions: &[Distribution], settings: Arc<PullSettings>) -> RunSummary {
    let parallelism = settings.network.distro_parallelism.max(1);
    let semaphore = Arc::new(tokio::sync::Semaphore::new(parallelism));

    let mut futs = FuturesUnordered::new();
    for (position, distro) in distributions.iter().enumerate() {
        let semaphore = semaphore.clone();
        let settings = settings.clone();
        let span = tracing::info_span!("distro", tag = %distro.tag);
        futs.push(
            async move {
                let _permit = semaphore.acquire_owned().await.ok();
                tracing::info!(family = %distro.family, "Pulling distribution");
                (position, pull_distribution(distro, &settings).await)
            }
            .instrument(span),
        );
    }

    let mut outcomes: Vec<Option<PullOutcome>> = vec![None; distributions.len()];
    while let Some((position, outcome)) = futs.next().await {
        match &outcome {
            PullOutcome::Success(_) => {}
            PullOutcome::Skipped { reason } => {
                tracing::warn!(distro = %distributions[position].tag, "Skipped: {}", reason);
            }
            PullOutcome::Failed { error } => {
                tracing::error!(distro = %distributions[position].tag, "Failed: {}", error);
            }
        }
        outcomes[position] = Some(outcome);
    }

    RunSummary {
        distributions: distributions
            .iter()
            .zip(outcomes)
            .filter_map(|(distro, outcome)| {
                outcome.map(|outcome| DistroOutcome {
                    tag: distro.tag.clone(),
                    outcome,
                })
            })
            .collect(),
    }
}
