use std::path::PathBuf;
use std::time::Duration;

/// Polling cadence and deadlines for every wait in a launch.
#[derive(Debug, Clone)]
pub struct Timings {
    pub process_poll_interval: Duration,
    pub ollama_timeout: Duration,
    pub docker_timeout: Duration,
    pub http_poll_interval: Duration,
    pub http_timeout: Duration,
    pub http_request_timeout: Duration,
    pub monitor_interval: Duration,
    pub exit_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            process_poll_interval: Duration::from_secs(1),
            ollama_timeout: Duration::from_secs(30),
            docker_timeout: Duration::from_secs(60),
            http_poll_interval: Duration::from_secs(2),
            http_timeout: Duration::from_secs(120),
            http_request_timeout: Duration::from_secs(3),
            monitor_interval: Duration::from_secs(5),
            exit_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub timings: Timings,
    pub open_browser: bool,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            open_browser: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    StartingOllama,
    StartingDocker,
    LaunchingContainer,
    AwaitingReadiness,
    Monitoring,
    ShuttingDown,
    Done,
}

/// Whether status output is currently shown to the user.
///
/// Monitoring takes the mode by value and hands back the hidden mode, shutdown
/// turns it visible again. Nothing else toggles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    Visible,
    Hidden,
}

impl PresentationMode {
    /// The mode after switching to `next`, or `None` when already there.
    pub fn switch_to(self, next: Self) -> Option<Self> {
        (self != next).then_some(next)
    }

    pub fn is_visible(self) -> bool {
        self == PresentationMode::Visible
    }
}

#[derive(Debug, Clone)]
pub enum LauncherEvent {
    PhaseStarted { phase: Phase },
    Info(InfoEvent),
    Warning(String),
    Presentation(PresentationMode),
}

/// Structured progress events emitted by the orchestrator and rendered by the CLI.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Message(String),
    LoadingConfig { path: PathBuf },
    TemplateWritten { path: PathBuf },
    ConfigLoaded,
    Started { service: &'static str, pid: u32 },
    Ready { service: &'static str },
    ElevatedLaunched { command: &'static str },
    BrowserOpened { url: &'static str },
    Terminated { name: &'static str, count: usize },
    ShutdownComplete,
}

impl InfoEvent {
    /// Render a human-readable status line.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::LoadingConfig { path } => {
                format!("Loading config from {}", path.display())
            }
            InfoEvent::TemplateWritten { path } => format!(
                "Created default config in {}\n\
                 Please edit it and set the following paths:\n\
                 - ollamaPath (path to the Ollama executable)\n\
                 - dockerPath (path to Docker Desktop)",
                path.display()
            ),
            InfoEvent::ConfigLoaded => "Configuration loaded successfully".to_string(),
            InfoEvent::Started { service, pid } => format!("Started {service} (pid {pid})"),
            InfoEvent::Ready { service } => format!("{service} is up"),
            InfoEvent::ElevatedLaunched { command } => {
                format!("Launched elevated command: {command}")
            }
            InfoEvent::BrowserOpened { url } => format!("Opened {url}"),
            InfoEvent::Terminated { name, count } => {
                format!("Terminated {count} instance(s) of {name}")
            }
            InfoEvent::ShutdownComplete => "Shutdown process completed".to_string(),
        }
    }
}

impl Phase {
    /// Status banner shown when the phase begins.
    pub fn banner(self) -> &'static str {
        match self {
            Phase::Loading => "Loading configuration...",
            Phase::StartingOllama => "Starting Ollama...",
            Phase::StartingDocker => "Starting Docker...",
            Phase::LaunchingContainer => "Starting Open WebUI container...",
            Phase::AwaitingReadiness => "Waiting for Open WebUI...",
            Phase::Monitoring => "Monitoring Docker process...",
            Phase::ShuttingDown => "Docker closed, shutting down...",
            Phase::Done => "Done.",
        }
    }
}
