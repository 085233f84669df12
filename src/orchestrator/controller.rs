//! Launch lifecycle controller.
//!
//! Drives the services through a fixed sequence of phases and emits events for
//! the presentation layer. Each phase runs to completion before the next begins.

use super::host::ServiceHost;
use super::shutdown::run_shutdown;
use crate::config::{self, ConfigError, LauncherConfig};
use crate::model::{InfoEvent, LaunchSettings, LauncherEvent, Phase, PresentationMode};
use crate::process::{self, ProcessError};
use crate::readiness::{wait_for, ProcessPresence};
use crate::services;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// Failures that end a launch with a non-zero exit code.
#[derive(Debug, Error)]
pub(crate) enum LaunchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("could not start {service}: {source}")]
    Start {
        service: &'static str,
        #[source]
        source: ProcessError,
    },
}

/// Per-launch context shared by the phases.
pub(super) struct Launch<'a> {
    pub host: &'a dyn ServiceHost,
    pub settings: &'a LaunchSettings,
    pub events: UnboundedSender<LauncherEvent>,
}

impl Launch<'_> {
    pub(super) fn phase(&self, phase: Phase) {
        debug!(?phase, "entering phase");
        let _ = self.events.send(LauncherEvent::PhaseStarted { phase });
    }

    pub(super) fn info(&self, ev: InfoEvent) {
        let _ = self.events.send(LauncherEvent::Info(ev));
    }

    pub(super) fn warn(&self, msg: String) {
        debug!(warning = %msg, "non-fatal launch issue");
        let _ = self.events.send(LauncherEvent::Warning(msg));
    }

    /// Move from `current` to `next`, announcing the change only when there is one.
    pub(super) fn present(
        &self,
        current: PresentationMode,
        next: PresentationMode,
    ) -> PresentationMode {
        match current.switch_to(next) {
            Some(mode) => {
                let _ = self.events.send(LauncherEvent::Presentation(mode));
                mode
            }
            None => current,
        }
    }

    fn load_config(&self, path: &Path) -> Result<LauncherConfig, LaunchError> {
        self.phase(Phase::Loading);
        self.info(InfoEvent::LoadingConfig {
            path: path.to_path_buf(),
        });
        match config::load(path) {
            Ok(cfg) => {
                self.info(InfoEvent::ConfigLoaded);
                Ok(cfg)
            }
            Err(ConfigError::Missing { path }) => {
                self.info(InfoEvent::TemplateWritten { path: path.clone() });
                Err(ConfigError::Missing { path }.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Start one runtime and wait until one of its identities shows up.
    ///
    /// A timeout is not fatal: the launch continues without confirmation.
    async fn start_runtime(
        &self,
        phase: Phase,
        service: &'static str,
        path: &Path,
        identities: &[&str],
        timeout: Duration,
    ) -> Result<(), LaunchError> {
        self.phase(phase);
        let table = self.host.processes();
        let pid = process::start(table, path)
            .map_err(|source| LaunchError::Start { service, source })?;
        self.info(InfoEvent::Started { service, pid });

        let presence = ProcessPresence {
            table,
            names: identities,
        };
        let interval = self.settings.timings.process_poll_interval;
        if wait_for(&presence, interval, timeout).await {
            self.info(InfoEvent::Ready { service });
        } else {
            self.warn(format!(
                "{service} did not appear within {}; continuing anyway",
                humantime::format_duration(timeout)
            ));
        }
        Ok(())
    }

    async fn launch_container(&self) {
        self.phase(Phase::LaunchingContainer);
        match self
            .host
            .launch_elevated(services::CONTAINER_LAUNCH_COMMAND)
            .await
        {
            Ok(_launched) => self.info(InfoEvent::ElevatedLaunched {
                command: services::CONTAINER_LAUNCH_COMMAND,
            }),
            Err(e) => self.warn(format!("container launch was not started: {e}")),
        }
    }

    async fn await_readiness(&self) {
        self.phase(Phase::AwaitingReadiness);
        let timings = &self.settings.timings;
        let probe = self.host.http_probe(services::WEBUI_URL);
        if !wait_for(probe.as_ref(), timings.http_poll_interval, timings.http_timeout).await {
            self.warn(format!(
                "{} did not answer within {}; not opening the browser",
                services::WEBUI,
                humantime::format_duration(timings.http_timeout)
            ));
            return;
        }
        self.info(InfoEvent::Ready {
            service: services::WEBUI,
        });

        if !self.settings.open_browser {
            return;
        }
        match self.host.open_browser(services::WEBUI_URL) {
            Ok(()) => self.info(InfoEvent::BrowserOpened {
                url: services::WEBUI_URL,
            }),
            Err(e) => self.warn(format!("failed to open browser: {e}")),
        }
    }

    /// Block until Docker Desktop is gone. Output stays hidden while waiting.
    async fn monitor(&self, mode: PresentationMode) -> PresentationMode {
        self.phase(Phase::Monitoring);
        let mode = self.present(mode, PresentationMode::Hidden);
        let table = self.host.processes();
        while process::is_running(table, services::DOCKER_PROCESS) {
            tokio::time::sleep(self.settings.timings.monitor_interval).await;
        }
        info!("docker process exited");
        mode
    }
}

/// Run a full launch: start everything, wait for Docker to exit, then tear down.
pub(crate) async fn run_launcher(
    host: &dyn ServiceHost,
    config_path: &Path,
    settings: &LaunchSettings,
    events: UnboundedSender<LauncherEvent>,
) -> Result<(), LaunchError> {
    let launch = Launch {
        host,
        settings,
        events,
    };

    let cfg = launch.load_config(config_path)?;

    launch
        .start_runtime(
            Phase::StartingOllama,
            services::OLLAMA,
            cfg.ollama(),
            services::OLLAMA_PROCESSES,
            settings.timings.ollama_timeout,
        )
        .await?;
    launch
        .start_runtime(
            Phase::StartingDocker,
            services::DOCKER,
            cfg.docker(),
            &[services::DOCKER_PROCESS],
            settings.timings.docker_timeout,
        )
        .await?;

    launch.launch_container().await;
    launch.await_readiness().await;

    let mode = launch.monitor(PresentationMode::Visible).await;
    run_shutdown(&launch, mode).await;

    launch.phase(Phase::Done);
    tokio::time::sleep(settings.timings.exit_delay).await;
    Ok(())
}
