use crate::model::{LaunchSettings, LauncherEvent, PresentationMode, Timings};
use crate::orchestrator::{run_launcher, SystemHost};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Which stream a rendered event goes to.
#[derive(Debug, PartialEq, Eq)]
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking task that renders launcher events to stdout/stderr.
///
/// The task tracks the presentation mode itself, so status lines stop while
/// monitoring hides the console. With `silent` nothing is written at all.
fn spawn_output_writer(
    silent: bool,
) -> (
    mpsc::UnboundedSender<LauncherEvent>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<LauncherEvent>();
    let handle = tokio::task::spawn_blocking(move || {
        let mut out = std::io::LineWriter::new(std::io::stdout().lock());
        let mut err = std::io::LineWriter::new(std::io::stderr().lock());
        let mut mode = PresentationMode::Visible;

        while let Some(ev) = rx.blocking_recv() {
            let line = render(ev, &mut mode);
            if silent {
                continue;
            }
            let _ = match line {
                Some(OutputLine::Stdout(msg)) => writeln!(out, "{msg}"),
                Some(OutputLine::Stderr(msg)) => writeln!(err, "{msg}"),
                None => Ok(()),
            };
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "webui-launcher",
    version,
    about = "Start Ollama, Docker Desktop and Open WebUI; shut them down when Docker exits"
)]
pub struct Cli {
    /// Path to config.json (defaults to the file next to the executable)
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Do not open the browser once Open WebUI is reachable
    #[arg(long)]
    pub no_browser: bool,

    /// Suppress status lines; errors are still printed
    #[arg(long)]
    pub silent: bool,

    /// Diagnostic log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "WEBUI_LAUNCHER_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Poll interval while waiting for Ollama or Docker to appear
    #[arg(long, default_value = "1s")]
    pub process_poll_interval: humantime::Duration,

    /// How long to wait for an Ollama process before continuing unconfirmed
    #[arg(long, default_value = "30s")]
    pub ollama_timeout: humantime::Duration,

    /// How long to wait for Docker Desktop before continuing unconfirmed
    #[arg(long, default_value = "60s")]
    pub docker_timeout: humantime::Duration,

    /// Poll interval for the Open WebUI readiness check
    #[arg(long, default_value = "2s")]
    pub http_poll_interval: humantime::Duration,

    /// How long to wait for Open WebUI before giving up on the browser
    #[arg(long, default_value = "120s")]
    pub http_timeout: humantime::Duration,

    /// Timeout of a single readiness request
    #[arg(long, default_value = "3s")]
    pub http_request_timeout: humantime::Duration,

    /// Poll interval while watching Docker Desktop
    #[arg(long, default_value = "5s")]
    pub monitor_interval: humantime::Duration,

    /// Pause before exiting after shutdown
    #[arg(long, default_value = "2s")]
    pub exit_delay: humantime::Duration,
}

/// Build `LaunchSettings` from CLI arguments.
pub fn build_settings(args: &Cli) -> LaunchSettings {
    LaunchSettings {
        timings: Timings {
            process_poll_interval: Duration::from(args.process_poll_interval),
            ollama_timeout: Duration::from(args.ollama_timeout),
            docker_timeout: Duration::from(args.docker_timeout),
            http_poll_interval: Duration::from(args.http_poll_interval),
            http_timeout: Duration::from(args.http_timeout),
            http_request_timeout: Duration::from(args.http_request_timeout),
            monitor_interval: Duration::from(args.monitor_interval),
            exit_delay: Duration::from(args.exit_delay),
        },
        open_browser: !args.no_browser,
    }
}

/// Render one event, honouring the current presentation mode.
fn render(ev: LauncherEvent, mode: &mut PresentationMode) -> Option<OutputLine> {
    match ev {
        LauncherEvent::Presentation(next) => {
            *mode = next;
            None
        }
        _ if !mode.is_visible() => None,
        LauncherEvent::PhaseStarted { phase } => Some(OutputLine::Stdout(phase.banner().into())),
        LauncherEvent::Info(info) => Some(OutputLine::Stdout(info.to_message())),
        LauncherEvent::Warning(msg) => Some(OutputLine::Stderr(format!("Warning: {msg}"))),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let config_path = match args.config.clone() {
        Some(p) => p,
        None => crate::config::default_path().context("cannot locate the launcher executable")?,
    };
    let settings = build_settings(&args);
    let host = SystemHost::new(settings.timings.http_request_timeout)
        .context("failed to build HTTP client")?;

    let (evt_tx, out_handle) = spawn_output_writer(args.silent);
    let res = run_launcher(&host, &config_path, &settings, evt_tx).await;
    let _ = out_handle.await;
    res.context("launch failed")
}
