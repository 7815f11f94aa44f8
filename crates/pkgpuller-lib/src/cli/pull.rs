use crate::cli::PullParams;
use crate::driver::pull_all;
use crate::error::PullError;
use crate::output::{render_summary, write_summary_json};
use std::sync::Arc;

pub async fn run_pull(params: PullParams) -> Result<(), PullError> {
    let PullParams {
        distributions,
        settings,
        summary_json,
    } = params;

    tracing::info!(
        distributions = distributions.len(),
        packages = settings.packages.len(),
        output = %settings.output_dir.display(),
        "Pulling packages"
    );

    let summary = pull_all(&distributions, Arc::new(settings)).await;

    print!("{}", render_summary(&summary));
    if let Some(path) = summary_json {
        write_summary_json(&summary, &path)?;
        tracing::info!("Run summary written to {}", path.display());
    }

    summary.into_result().map(|_| ())
}
