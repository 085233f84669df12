//! Polling until a point-in-time condition holds.
//!
//! Every "wait for X" in a launch is a [`Readiness`] predicate handed to [`wait_for`].

use crate::process::{self, ProcessTable};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// A stateless readiness check evaluated once per poll.
#[async_trait]
pub trait Readiness: Send + Sync {
    async fn check(&self) -> bool;
}

/// Evaluate `predicate` every `interval` until it holds or `timeout` elapses.
///
/// The predicate is always evaluated once more after the last sleep, even when
/// that sleep carried the clock past the deadline.
pub async fn wait_for(predicate: &dyn Readiness, interval: Duration, timeout: Duration) -> bool {
    let start = Instant::now();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        if predicate.check().await {
            trace!(attempts, "condition met");
            return true;
        }
        if start.elapsed() >= timeout {
            trace!(attempts, "condition timed out");
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

/// True while any of `names` is a live process.
pub struct ProcessPresence<'a> {
    pub table: &'a dyn ProcessTable,
    pub names: &'a [&'a str],
}

#[async_trait]
impl Readiness for ProcessPresence<'_> {
    async fn check(&self) -> bool {
        process::any_running(self.table, self.names)
    }
}

/// True when a plain GET to `url` answers with status 200.
pub struct HttpReady {
    client: reqwest::Client,
    url: String,
}

impl HttpReady {
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

/// HTTP client for readiness probes.
///
/// Redirects are not followed so that only a literal 200 counts. Proxy settings
/// from the environment are ignored: the target is always a local service.
pub fn http_client(request_timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .user_agent(format!("webui-launcher/{}", env!("CARGO_PKG_VERSION")))
        .build()
}

#[async_trait]
impl Readiness for HttpReady {
    async fn check(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(resp) => {
                trace!(url = %self.url, status = %resp.status(), "readiness probe");
                resp.status() == reqwest::StatusCode::OK
            }
            Err(e) => {
                trace!(url = %self.url, error = %e, "readiness probe failed");
                false
            }
        }
    }
}
