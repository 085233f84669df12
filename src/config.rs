//! Launcher configuration: two executable paths read from `config.json`.
//!
//! The file lives next to the launcher binary unless `--config` points elsewhere.
//! A missing file is replaced by an empty template so the user has something to fill in.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherConfig {
    #[serde(default)]
    pub ollama_path: String,
    #[serde(default)]
    pub docker_path: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found; a template was written to {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to write config template to {}: {source}", path.display())]
    TemplateWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("`{field}` is not set")]
    EmptyField { field: &'static str },

    #[error("`{field}` does not point to an existing file: {}", path.display())]
    PathNotFound { field: &'static str, path: PathBuf },
}

impl LauncherConfig {
    pub fn ollama(&self) -> &Path {
        Path::new(&self.ollama_path)
    }

    pub fn docker(&self) -> &Path {
        Path::new(&self.docker_path)
    }

    /// Both paths must be set and reference existing files.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("ollamaPath", &self.ollama_path),
            ("dockerPath", &self.docker_path),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField { field });
            }
            let path = Path::new(value);
            if !path.is_file() {
                return Err(ConfigError::PathNotFound {
                    field,
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

/// `config.json` in the directory holding the running executable.
pub fn default_path() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Read, parse and validate the config at `path`.
///
/// When the file does not exist a template is written in its place and
/// [`ConfigError::Missing`] is returned.
pub fn load(path: &Path) -> Result<LauncherConfig, ConfigError> {
    if !path.exists() {
        write_template(path)?;
        return Err(ConfigError::Missing {
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: LauncherConfig =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn write_template(path: &Path) -> Result<(), ConfigError> {
    let to_err = |source: std::io::Error| ConfigError::TemplateWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    LauncherConfig::default()
        .serialize(&mut ser)
        .map_err(|e| to_err(std::io::Error::other(e)))?;
    buf.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_err)?;
    }
    std::fs::write(path, buf).map_err(to_err)
}
