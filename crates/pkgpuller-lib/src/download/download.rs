use super::types::{DownloadItem, DownloadStatus};
use crate::verification::{ChecksumVerifier, file_matches};
use eyre::{Result, WrapErr, eyre};
use futures::StreamExt;
use opendal::Operator;
use std::path::PathBuf;
use tracing::info;

fn partial_path(output_path: &std::path::Path) -> PathBuf {
    let mut name = output_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    output_path.with_file_name(name)
}

/// Streams one package to `item.output_path`, verifying it when the index carried a checksum.
///
/// Data lands in a `.part` file first and is renamed into place only once complete and
/// verified, so a failed download never leaves a truncated package behind.
pub async fn download_package(
    op: &Operator,
    base_url: &str,
    item: &DownloadItem,
) -> Result<DownloadStatus> {
    let rel = item.rel_path.as_str();
    let output_path = &item.output_path;

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if let Some(checksum) = &item.checksum {
        if output_path.exists() {
            let matches = file_matches(output_path, checksum).await.wrap_err_with(|| {
                format!("Failed to read existing file: {}", output_path.display())
            })?;
            if matches {
                tracing::debug!(
                    base = %base_url,
                    path = %rel,
                    output = %output_path.display(),
                    "File exists with matching digest, skipping download"
                );
                return Ok(DownloadStatus::AlreadyPresent);
            }
            tracing::info!(
                base = %base_url,
                path = %rel,
                output = %output_path.display(),
                "File exists with incorrect digest, replacing"
            );
        }
    }

    info!(
        base = %base_url,
        path = %rel,
        output = %output_path.display(),
        expected_digest = item.checksum.as_ref().map(|c| c.hex()).unwrap_or_default(),
        "Downloading"
    );

    let mut verifier = item.checksum.clone().map(ChecksumVerifier::new);

    let mut reader = op
        .reader(rel)
        .await
        .wrap_err_with(|| format!("Failed to create reader for {}/{}", base_url, rel))?
        .into_stream(..)
        .await
        .wrap_err_with(|| format!("Failed to create reader for {}/{}", base_url, rel))?;

    let part_path = partial_path(output_path);
    let file = tokio::fs::File::create(&part_path)
        .await
        .wrap_err_with(|| format!("Failed to create output file: {}", part_path.display()))?;
    let mut writer = tokio::io::BufWriter::new(file);

    let mut written: u64 = 0;
    let result: Result<()> = async {
        while let Some(reader_res) = reader.next().await {
            let buffer = reader_res
                .wrap_err_with(|| format!("Failed to read from {}/{}", base_url, rel))?
                .to_bytes();

            if let Some(verifier) = verifier.as_mut() {
                verifier.update(&buffer);
            }
            written += buffer.len() as u64;

            tokio::io::AsyncWriteExt::write_all(&mut writer, &buffer)
                .await
                .wrap_err_with(|| format!("Failed to write to {}", part_path.display()))?;
        }

        tokio::io::AsyncWriteExt::flush(&mut writer)
            .await
            .wrap_err_with(|| format!("Failed to flush {}", part_path.display()))?;

        if let Some(expected) = item.size {
            if expected != written {
                return Err(eyre!(
                    "Size mismatch for {}: expected {} bytes, got {}",
                    rel,
                    expected,
                    written
                ));
            }
        }
        if let Some(verifier) = verifier.take() {
            verifier
                .verify()
                .wrap_err_with(|| format!("Failed to verify {}", output_path.display()))?;
        }
        Ok(())
    }
    .await;

    if let Err(err) = result {
        drop(writer);
        if let Err(e) = tokio::fs::remove_file(&part_path).await {
            tracing::debug!(
                path = %part_path.display(),
                "Failed to remove partial download: {}",
                e
            );
        }
        return Err(err);
    }

    drop(writer);
    tokio::fs::rename(&part_path, output_path)
        .await
        .wrap_err_with(|| format!("Failed to move {} into place", part_path.display()))?;

    info!(base = %base_url, path = %rel, output = %output_path.display(), "Downloaded");
    Ok(DownloadStatus::Downloaded)
}
