//! Teardown after Docker Desktop exits.

use super::controller::Launch;
use crate::model::{InfoEvent, Phase, PresentationMode};
use crate::process;
use crate::services;

/// Restore output, kill every Ollama process and shut the WSL VM down.
///
/// Runs exactly once per launch. Each step is best effort and none can abort the others.
pub(super) async fn run_shutdown(launch: &Launch<'_>, mode: PresentationMode) -> PresentationMode {
    let mode = launch.present(mode, PresentationMode::Visible);
    launch.phase(Phase::ShuttingDown);

    let table = launch.host.processes();
    for &name in services::OLLAMA_PROCESSES {
        let report = process::kill_all(table, name);
        if report.terminated > 0 {
            launch.info(InfoEvent::Terminated {
                name,
                count: report.terminated,
            });
        }
        if report.failed > 0 {
            launch.warn(format!(
                "{} of {} {name} process(es) could not be terminated",
                report.failed, report.matched
            ));
        }
    }

    launch.info(InfoEvent::Message("Shutting down WSL...".into()));
    match launch
        .host
        .launch_elevated(services::VM_SHUTDOWN_COMMAND)
        .await
    {
        Ok(_launched) => launch.info(InfoEvent::ElevatedLaunched {
            command: services::VM_SHUTDOWN_COMMAND,
        }),
        Err(e) => launch.warn(format!("WSL shutdown was not started: {e}")),
    }

    launch.info(InfoEvent::ShutdownComplete);
    mode
}
