//! Fixed identities and command lines of the managed services.

pub const OLLAMA: &str = "Ollama";
pub const DOCKER: &str = "Docker";
pub const WEBUI: &str = "Open WebUI";

/// Image names Ollama may run under; the tray app spawns the server and runner as helpers.
pub const OLLAMA_PROCESSES: &[&str] = &["ollama app.exe", "ollama.exe", "ollama_llama_server.exe"];

/// Docker Desktop's main process. Its exit triggers the shutdown cascade.
pub const DOCKER_PROCESS: &str = "Docker Desktop.exe";

pub const WEBUI_URL: &str = "http://localhost:3000/";

pub const CONTAINER_LAUNCH_COMMAND: &str = "docker run -d -p 3000:8080 \
    --add-host=host.docker.internal:host-gateway \
    -v open-webui:/app/backend/data --name open-webui --restart always \
    ghcr.io/open-webui/open-webui:main";

pub const VM_SHUTDOWN_COMMAND: &str = "wsl --shutdown";
