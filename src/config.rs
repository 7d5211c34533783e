use crate::{info, warn};
use dotenv::dotenv;

pub const DEFAULT_FILENAME: &str = "folder_map.txt";
pub const DEFAULT_API_ROOT: &str = "https://www.googleapis.com";
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
pub const DEFAULT_PORT: u16 = 8080;

/// Everything the function needs, read once at process start and then handed
/// to the credential resolver, the Drive client, the builder and the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// Shared drive whose folders are mapped.
  pub drive_id: String,
  /// Folder the map file is written into.
  pub folder_id: String,
  pub filename: String,
  /// Scheme and host for Drive calls, without trailing slash.
  pub api_root: String,
  /// Host (optionally host:port) of the compute metadata server.
  pub metadata_host: String,
  /// Service account key used when running outside Google Cloud.
  pub credentials_file: Option<String>,
  pub port: u16,
  pub log_dir: Option<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      drive_id: String::new(),
      folder_id: String::new(),
      filename: DEFAULT_FILENAME.to_string(),
      api_root: DEFAULT_API_ROOT.to_string(),
      metadata_host: DEFAULT_METADATA_HOST.to_string(),
      credentials_file: None,
      port: DEFAULT_PORT,
      log_dir: None,
    }
  }
}

impl Config {
  /// Loads `.env` if present, then reads the process environment.
  pub fn from_env() -> Self {
    dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Builds the config from any key lookup. Missing drive or folder ids are
  /// left empty; the provider rejects the call that uses them.
  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let defaults = Self::default();

    let port = match non_empty("PORT") {
      Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
        eprintln!("PORT '{raw}' is not a valid port, using default {DEFAULT_PORT}.");
        DEFAULT_PORT
      }),
      None => defaults.port,
    };

    Self {
      drive_id: non_empty("SHARED_DRIVE_ID").unwrap_or_default(),
      folder_id: non_empty("SHARED_DRIVE_FOLDER").unwrap_or_default(),
      filename: non_empty("FOLDER_MAP_FILENAME").unwrap_or(defaults.filename),
      api_root: non_empty("DRIVE_API_ROOT")
        .map(|root| root.trim_end_matches('/').to_string())
        .unwrap_or(defaults.api_root),
      metadata_host: non_empty("GCE_METADATA_HOST")
        .unwrap_or(defaults.metadata_host),
      credentials_file: non_empty("GOOGLE_APPLICATION_CREDENTIALS"),
      port,
      log_dir: non_empty("LOG_DIR"),
    }
  }

  /// Logs the effective settings. Called once logging is up.
  pub fn report(&self) {
    if self.drive_id.is_empty() {
      warn!("SHARED_DRIVE_ID environment variable not set, folder listing will fail.");
    }
    if self.folder_id.is_empty() {
      warn!("SHARED_DRIVE_FOLDER environment variable not set, map upload will fail.");
    }

    info!(
      drive_id = %self.drive_id,
      folder_id = %self.folder_id,
      filename = %self.filename,
      api_root = %self.api_root,
      credentials_file = ?self.credentials_file,
      "Configuration loaded"
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |key: &str| map.get(key).cloned()
  }

  #[test]
  fn reads_drive_and_folder_ids() {
    let config = Config::from_lookup(lookup_from(&[
      ("SHARED_DRIVE_ID", "0AbcDrive"),
      ("SHARED_DRIVE_FOLDER", "1FolderXyz"),
    ]));

    assert_eq!(config.drive_id, "0AbcDrive");
    assert_eq!(config.folder_id, "1FolderXyz");
    assert_eq!(config.filename, "folder_map.txt");
    assert_eq!(config.api_root, DEFAULT_API_ROOT);
    assert_eq!(config.metadata_host, DEFAULT_METADATA_HOST);
    assert_eq!(config.port, 8080);
    assert!(config.credentials_file.is_none());
    assert!(config.log_dir.is_none());
  }

  #[test]
  fn missing_ids_are_left_empty_not_rejected() {
    let config = Config::from_lookup(lookup_from(&[("SHARED_DRIVE_ID", "  ")]));
    assert_eq!(config.drive_id, "");
    assert_eq!(config.folder_id, "");
  }

  #[test]
  fn overrides_and_bad_port() {
    let config = Config::from_lookup(lookup_from(&[
      ("FOLDER_MAP_FILENAME", "map.json"),
      ("DRIVE_API_ROOT", "http://127.0.0.1:9000/"),
      ("GCE_METADATA_HOST", "127.0.0.1:9001"),
      ("GOOGLE_APPLICATION_CREDENTIALS", "/tmp/key.json"),
      ("PORT", "not-a-port"),
      ("LOG_DIR", "logs"),
    ]));

    assert_eq!(config.filename, "map.json");
    assert_eq!(config.api_root, "http://127.0.0.1:9000");
    assert_eq!(config.metadata_host, "127.0.0.1:9001");
    assert_eq!(config.credentials_file.as_deref(), Some("/tmp/key.json"));
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.log_dir.as_deref(), Some("logs"));
  }
}
