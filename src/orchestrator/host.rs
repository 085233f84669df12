//! Operating-system facilities the launcher drives.

use crate::elevated::{self, ElevationError, Launched};
use crate::process::{ProcessTable, SysinfoTable};
use crate::readiness::{self, HttpReady, Readiness};
use async_trait::async_trait;
use std::time::Duration;

/// Everything the orchestrator touches outside its own process.
#[async_trait]
pub(crate) trait ServiceHost: Send + Sync {
    fn processes(&self) -> &dyn ProcessTable;

    /// A readiness predicate for an HTTP endpoint.
    fn http_probe(&self, url: &str) -> Box<dyn Readiness + '_>;

    /// Launch-and-forget: `Ok` only says the privileged shell started.
    async fn launch_elevated(&self, command_line: &str) -> Result<Launched, ElevationError>;

    fn open_browser(&self, url: &str) -> std::io::Result<()>;
}

pub(crate) struct SystemHost {
    table: SysinfoTable,
    http: reqwest::Client,
}

impl SystemHost {
    pub(crate) fn new(request_timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            table: SysinfoTable::new(),
            http: readiness::http_client(request_timeout)?,
        })
    }
}

#[async_trait]
impl ServiceHost for SystemHost {
    fn processes(&self) -> &dyn ProcessTable {
        &self.table
    }

    fn http_probe(&self, url: &str) -> Box<dyn Readiness + '_> {
        Box::new(HttpReady::with_client(self.http.clone(), url))
    }

    async fn launch_elevated(&self, command_line: &str) -> Result<Launched, ElevationError> {
        elevated::launch_elevated(command_line).await
    }

    fn open_browser(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}
