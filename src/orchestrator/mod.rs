//! Service lifecycle orchestration.
//!
//! The controller sequences startup, readiness waits and monitoring; the shutdown
//! module owns the teardown cascade. All OS access goes through [`ServiceHost`] so
//! the CLI layer only supplies a host and consumes events.

mod controller;
mod host;
mod shutdown;

pub(crate) use controller::run_launcher;
pub(crate) use host::SystemHost;

#[cfg(test)]
mod tests {
    use super::controller::LaunchError;
    use super::host::ServiceHost;
    use super::*;
    use crate::config::{ConfigError, CONFIG_FILE_NAME};
    use crate::elevated::{ElevationError, Launched};
    use crate::model::{LaunchSettings, LauncherEvent, Phase, PresentationMode};
    use crate::process::mock::MockTable;
    use crate::process::ProcessTable;
    use crate::readiness::Readiness;
    use crate::services;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    struct Fixed(bool);

    #[async_trait]
    impl Readiness for Fixed {
        async fn check(&self) -> bool {
            self.0
        }
    }

    struct MockHost {
        table: MockTable,
        http_ready: bool,
        reject_elevation: bool,
        /// Elevated command lines with the number of spawns seen before each.
        launched: Mutex<Vec<(String, usize)>>,
        browsed: Mutex<Vec<String>>,
    }

    impl MockHost {
        fn new(table: MockTable) -> Self {
            Self {
                table,
                http_ready: true,
                reject_elevation: false,
                launched: Mutex::new(Vec::new()),
                browsed: Mutex::new(Vec::new()),
            }
        }

        fn launched(&self) -> Vec<(String, usize)> {
            self.launched.lock().unwrap().clone()
        }

        fn browsed(&self) -> Vec<String> {
            self.browsed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ServiceHost for MockHost {
        fn processes(&self) -> &dyn ProcessTable {
            &self.table
        }

        fn http_probe(&self, _url: &str) -> Box<dyn Readiness + '_> {
            Box::new(Fixed(self.http_ready))
        }

        async fn launch_elevated(&self, command_line: &str) -> Result<Launched, ElevationError> {
            let spawns = self.table.spawned().len();
            self.launched
                .lock()
                .unwrap()
                .push((command_line.to_string(), spawns));
            if self.reject_elevation {
                return Err(ElevationError::Rejected { code: Some(1) });
            }
            Ok(Launched)
        }

        fn open_browser(&self, url: &str) -> std::io::Result<()> {
            self.browsed.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        config: PathBuf,
        ollama: String,
        docker: String,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let ollama = dir.path().join("ollama app.exe");
        let docker = dir.path().join("Docker Desktop.exe");
        std::fs::write(&ollama, b"").unwrap();
        std::fs::write(&docker, b"").unwrap();
        let config = dir.path().join(CONFIG_FILE_NAME);
        let body = serde_json::json!({ "ollamaPath": ollama, "dockerPath": docker });
        std::fs::write(&config, body.to_string()).unwrap();
        Fixture {
            config,
            ollama: ollama.display().to_string(),
            docker: docker.display().to_string(),
            dir,
        }
    }

    /// Ollama always up, Docker visible for the first `docker_until` snapshots.
    fn running_services(docker_until: usize) -> MockTable {
        MockTable::with(&[
            (11, "ollama app.exe", None),
            (12, "ollama.exe", None),
            (13, "ollama_llama_server.exe", None),
            (14, "ollama_llama_server.exe", None),
            (20, "Docker Desktop.exe", Some(docker_until)),
        ])
    }

    async fn launch(
        host: &MockHost,
        config: &Path,
    ) -> (Result<(), LaunchError>, Vec<LauncherEvent>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let res = run_launcher(host, config, &LaunchSettings::default(), tx).await;
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        (res, events)
    }

    fn phases(events: &[LauncherEvent]) -> Vec<Phase> {
        events
            .iter()
            .filter_map(|e| match e {
                LauncherEvent::PhaseStarted { phase } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_aborts_before_starting_anything() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(CONFIG_FILE_NAME);
        for body in [
            r#"{"ollamaPath":"","dockerPath":""}"#.to_string(),
            serde_json::json!({
                "ollamaPath": dir.path().join("missing.exe"),
                "dockerPath": dir.path().join("missing-too.exe"),
            })
            .to_string(),
        ] {
            std::fs::write(&config, body).unwrap();
            let host = MockHost::new(running_services(usize::MAX));

            let (res, events) = launch(&host, &config).await;
            assert!(matches!(res, Err(LaunchError::Config(_))));
            assert!(host.table.spawned().is_empty());
            assert!(host.launched().is_empty());
            assert_eq!(phases(&events), vec![Phase::Loading]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn missing_config_writes_template_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(CONFIG_FILE_NAME);
        let host = MockHost::new(running_services(usize::MAX));

        let (res, _) = launch(&host, &config).await;
        assert!(matches!(
            res,
            Err(LaunchError::Config(ConfigError::Missing { .. }))
        ));
        assert!(config.exists());
        assert!(host.table.spawned().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn runtimes_start_in_order_before_the_container() {
        let fx = fixture();
        let host = MockHost::new(running_services(4));

        let (res, _) = launch(&host, &fx.config).await;
        assert!(res.is_ok());
        assert_eq!(host.table.spawned(), vec![fx.ollama.clone(), fx.docker.clone()]);

        let launched = host.launched();
        assert_eq!(launched[0].0, services::CONTAINER_LAUNCH_COMMAND);
        assert_eq!(launched[0].1, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn docker_exit_runs_one_shutdown_cascade() {
        let fx = fixture();
        let host = MockHost::new(running_services(4));

        let (res, events) = launch(&host, &fx.config).await;
        assert!(res.is_ok());

        let mut killed = host.table.terminated();
        killed.sort_unstable();
        assert_eq!(killed, vec![11, 12, 13, 14]);

        let commands: Vec<String> = host.launched().into_iter().map(|(c, _)| c).collect();
        assert_eq!(
            commands,
            vec![
                services::CONTAINER_LAUNCH_COMMAND.to_string(),
                services::VM_SHUTDOWN_COMMAND.to_string(),
            ]
        );

        assert_eq!(
            phases(&events),
            vec![
                Phase::Loading,
                Phase::StartingOllama,
                Phase::StartingDocker,
                Phase::LaunchingContainer,
                Phase::AwaitingReadiness,
                Phase::Monitoring,
                Phase::ShuttingDown,
                Phase::Done,
            ]
        );
        assert_eq!(host.browsed(), vec![services::WEBUI_URL.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn output_is_hidden_only_while_monitoring() {
        let fx = fixture();
        let host = MockHost::new(running_services(4));

        let (_, events) = launch(&host, &fx.config).await;
        let modes: Vec<PresentationMode> = events
            .iter()
            .filter_map(|e| match e {
                LauncherEvent::Presentation(m) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(
            modes,
            vec![PresentationMode::Hidden, PresentationMode::Visible]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn webui_timeout_skips_browser_but_keeps_monitoring() {
        let fx = fixture();
        let mut host = MockHost::new(running_services(4));
        host.http_ready = false;

        let (res, events) = launch(&host, &fx.config).await;
        assert!(res.is_ok());
        assert!(host.browsed().is_empty());
        let seen = phases(&events);
        assert!(seen.contains(&Phase::Monitoring));
        assert!(events
            .iter()
            .any(|e| matches!(e, LauncherEvent::Warning(w) if w.contains("not opening the browser"))));
    }

    #[tokio::test(start_paused = true)]
    async fn ollama_start_failure_is_fatal() {
        let fx = fixture();
        let mut table = running_services(4);
        table.fail_spawn = vec![fx.ollama.clone()];
        let host = MockHost::new(table);

        let (res, _) = launch(&host, &fx.config).await;
        match res {
            Err(LaunchError::Start { service, .. }) => assert_eq!(service, services::OLLAMA),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(host.table.spawned(), vec![fx.ollama.clone()]);
        assert!(host.launched().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn docker_start_failure_is_fatal() {
        let fx = fixture();
        let mut table = running_services(4);
        table.fail_spawn = vec![fx.docker.clone()];
        let host = MockHost::new(table);

        let (res, _) = launch(&host, &fx.config).await;
        assert!(matches!(
            res,
            Err(LaunchError::Start { service: services::DOCKER, .. })
        ));
        assert!(host.launched().is_empty());
        assert!(host.table.terminated().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_elevation_is_not_fatal() {
        let fx = fixture();
        let mut host = MockHost::new(running_services(4));
        host.reject_elevation = true;

        let (res, events) = launch(&host, &fx.config).await;
        assert!(res.is_ok());
        assert_eq!(host.launched().len(), 2);
        let warnings = events
            .iter()
            .filter(|e| matches!(e, LauncherEvent::Warning(_)))
            .count();
        assert_eq!(warnings, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn runtimes_that_never_appear_do_not_abort() {
        let fx = fixture();
        let host = MockHost::new(MockTable::default());

        let (res, events) = launch(&host, &fx.config).await;
        assert!(res.is_ok());
        assert_eq!(host.table.spawned().len(), 2);
        assert!(phases(&events).contains(&Phase::ShuttingDown));
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn bin_true_config_passes_loading() {
        if !Path::new("/bin/true").is_file() {
            return;
        }
        let fx = fixture();
        std::fs::write(
            &fx.config,
            r#"{"ollamaPath":"/bin/true","dockerPath":"/bin/true"}"#,
        )
        .unwrap();
        let host = MockHost::new(running_services(4));

        let (res, events) = launch(&host, &fx.config).await;
        assert!(res.is_ok());
        assert_eq!(&phases(&events)[..2], [Phase::Loading, Phase::StartingOllama]);
        assert_eq!(host.table.spawned(), vec!["/bin/true", "/bin/true"]);
        drop(fx.dir);
    }
}
