use crate::driver::{PullOutcome, RunSummary};
use crate::error::PullError;
use console::style;
use std::fmt::Write as _;
use std::io::BufWriter;
use std::path::Path;

/// Renders the end-of-run report shown on the console.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style("Package pull summary").bold());

    for distro in &summary.distributions {
        let line = match &distro.outcome {
            PullOutcome::Success(report) => format!(
                "  {} {:<8} {} downloaded, {} not found (AMD {}, amdgpu {}, other {})",
                style("OK  ").green(),
                distro.tag,
                report.downloaded.len(),
                report.not_found.len(),
                report.tally.amd,
                report.tally.amdgpu,
                report.tally.other,
            ),
            PullOutcome::Skipped { reason } => format!(
                "  {} {:<8} {}",
                style("SKIP").yellow(),
                distro.tag,
                reason
            ),
            PullOutcome::Failed { error } => {
                format!("  {} {:<8} {}", style("FAIL").red(), distro.tag, error)
            }
        };
        let _ = writeln!(out, "{line}");
    }

    let succeeded = summary.succeeded();
    let skipped = summary.skipped();
    let failed = summary.failed();
    let tally = summary.tally();
    let _ = writeln!(
        out,
        "Succeeded: {} [{}]",
        succeeded.len(),
        succeeded.join(" ")
    );
    let _ = writeln!(out, "Skipped:   {} [{}]", skipped.len(), skipped.join(" "));
    let _ = writeln!(out, "Failed:    {} [{}]", failed.len(), failed.join(" "));
    let _ = writeln!(
        out,
        "Packages:  {} total, {} AMD ({} amdgpu), {} third-party",
        tally.total, tally.amd, tally.amdgpu, tally.other
    );
    out
}

pub fn write_summary_json(summary: &RunSummary, path: &Path) -> Result<(), PullError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PullError::OutputDirectoryCreation {
            path: parent.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
    Ok(())
}
