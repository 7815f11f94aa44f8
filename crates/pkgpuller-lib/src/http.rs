use crate::config::NetworkConfig;
use eyre::Result;
use opendal::Operator;
use opendal::layers::{ConcurrentLimitLayer, RetryLayer, TimeoutLayer, TracingLayer};
use opendal::services::Http;
use std::time::Duration;

/// Builds an OpenDAL HTTP operator rooted at a repository base URL. Paths passed to it are
/// relative to that URL.
pub fn build_http_operator(base_url: &str, network: &NetworkConfig) -> Result<Operator> {
    let builder = Http::default().endpoint(base_url);

    let op = Operator::new(builder)?
        .layer(
            TimeoutLayer::new()
                .with_timeout(Duration::from_secs(network.timeout_secs))
                .with_io_timeout(Duration::from_secs(network.timeout_secs)),
        )
        .layer(
            RetryLayer::new()
                .with_max_times(network.max_retries)
                .with_min_delay(Duration::from_millis(500))
                .with_factor(2.0)
                .with_jitter(),
        )
        .layer(ConcurrentLimitLayer::new(network.max_concurrency_per_host))
        .layer(TracingLayer)
        .finish();
    Ok(op)
}

/// Whether an operator error means the remote document is simply not there.
pub fn is_not_found(err: &opendal::Error) -> bool {
    err.kind() == opendal::ErrorKind::NotFound
}
