use crate::config::Config;

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
pub const TEXT_MIME: &str = "text/plain";

/// Remote endpoints this function talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ep {
  /// files.list
  Files,
  /// resumable create / update sessions
  Uploads,
  MetadataToken,
}

impl Ep {
  pub fn base_url(&self, config: &Config) -> String {
    match self {
      Ep::Files => format!("{}/drive/v3/files", config.api_root),
      Ep::Uploads => format!("{}/upload/drive/v3/files", config.api_root),
      Ep::MetadataToken => format!(
        "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
        config.metadata_host
      ),
    }
  }
}

/// Escapes a value for use inside a single-quoted Drive query literal.
pub fn escape_query_literal(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for c in value.chars() {
    if c == '\\' || c == '\'' {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn endpoints_follow_configured_roots() {
    let config = Config {
      api_root: "http://127.0.0.1:4000".to_string(),
      metadata_host: "127.0.0.1:4001".to_string(),
      ..Config::default()
    };

    assert_eq!(
      Ep::Files.base_url(&config),
      "http://127.0.0.1:4000/drive/v3/files"
    );
    assert_eq!(
      Ep::Uploads.base_url(&config),
      "http://127.0.0.1:4000/upload/drive/v3/files"
    );
    assert_eq!(
      Ep::MetadataToken.base_url(&config),
      "http://127.0.0.1:4001/computeMetadata/v1/instance/service-accounts/default/token"
    );
  }

  #[test]
  fn escapes_quotes_and_backslashes() {
    assert_eq!(escape_query_literal("folder_map.txt"), "folder_map.txt");
    assert_eq!(escape_query_literal("it's"), r"it\'s");
    assert_eq!(
      escape_query_literal(r"x' or name contains '\"),
      r"x\' or name contains \'\\"
    );
  }
}
