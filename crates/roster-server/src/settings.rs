//! Runtime server configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Deserialised from `config.toml` layered under `ROSTER_*` environment
/// variables. Every key has a default, so an empty config is valid.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  /// SQLite database file. A leading `~/` is expanded.
  pub store_path: PathBuf,
  /// Prefix the API is mounted under. Empty or `/` mounts at the root.
  pub api_prefix: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("roster.db"),
      api_prefix: "/api/v1".to_string(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The API prefix in the form `Router::nest` expects, or `None` to mount at
  /// the root.
  pub fn mount_point(&self) -> Option<String> {
    let trimmed = self.api_prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
      return None;
    }
    Some(if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{trimmed}") })
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn with_prefix(prefix: &str) -> ServerConfig {
    ServerConfig { api_prefix: prefix.to_string(), ..ServerConfig::default() }
  }

  #[test]
  fn defaults() {
    let cfg = ServerConfig::default();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_path, PathBuf::from("roster.db"));
    assert_eq!(cfg.mount_point().as_deref(), Some("/api/v1"));
  }

  #[test]
  fn mount_point_is_normalised() {
    assert_eq!(with_prefix("").mount_point(), None);
    assert_eq!(with_prefix("/").mount_point(), None);
    assert_eq!(with_prefix("api/").mount_point().as_deref(), Some("/api"));
    assert_eq!(with_prefix("/api/v2/").mount_point().as_deref(), Some("/api/v2"));
  }

  #[test]
  fn partial_config_keeps_defaults() {
    let cfg: ServerConfig = config::Config::builder()
      .set_override("port", 9000)
      .unwrap()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.api_prefix, "/api/v1");
  }

  #[test]
  fn absolute_paths_are_untouched() {
    assert_eq!(expand_tilde(Path::new("/var/roster.db")), PathBuf::from("/var/roster.db"));
  }
}
