use serde_json::Value;

/// Parse Google API error JSON and extract clean error information
pub fn parse_google_api_error(error_text: &str) -> String {
  if let Ok(error_json) = serde_json::from_str::<Value>(error_text)
    && let Some(error_obj) = error_json.get("error")
  {
    // OAuth token endpoints answer {"error": "invalid_grant", "error_description": ...}
    if let Some(kind) = error_obj.as_str() {
      return match error_json.get("error_description").and_then(|d| d.as_str())
      {
        Some(description) => format!("{}: {}", kind, description),
        None => kind.to_string(),
      };
    }

    let code = error_obj
      .get("code")
      .and_then(|c| c.as_u64())
      .map(|c| format!("Code: {}", c))
      .unwrap_or_default();

    let status = error_obj
      .get("status")
      .and_then(|s| s.as_str())
      .map(|s| format!("Status: {}", s))
      .unwrap_or_default();

    let message = error_obj
      .get("message")
      .and_then(|m| m.as_str())
      .map(|m| format!("Message: {}", m))
      .unwrap_or_default();

    let parts: Vec<String> = [code, status, message]
      .into_iter()
      .filter(|s| !s.is_empty())
      .collect();

    if !parts.is_empty() {
      return parts.join("\n");
    }
  }

  error_text.to_string()
}

/// Get human-readable status code name
pub fn get_status_code_name(status: u16) -> &'static str {
  match status {
    400 => "BAD_REQUEST",
    401 => "UNAUTHORIZED",
    403 => "FORBIDDEN",
    404 => "NOT_FOUND",
    409 => "CONFLICT",
    412 => "PRECONDITION_FAILED",
    429 => "RATE_LIMIT_EXCEEDED",
    500 => "INTERNAL_SERVER_ERROR",
    502 => "BAD_GATEWAY",
    503 => "SERVICE_UNAVAILABLE",
    _ => "UNKNOWN_ERROR",
  }
}

/// One-line description of a failed Drive call, used as the error message
/// that eventually reaches the HTTP caller.
pub fn format_drive_error(operation: &str, status: u16, error_text: &str) -> String {
  let hint = match status {
    401 => " - ambient credentials were rejected",
    403 => " - the service identity lacks access to this drive or folder",
    404 => " - drive, folder or file id does not exist",
    429 => " - Google Drive API rate limit exceeded",
    503 => " - Google Drive API service temporarily unavailable",
    _ => "",
  };

  format!(
    "{} failed - Status: {} {}{}\n{}",
    operation,
    status,
    get_status_code_name(status),
    hint,
    parse_google_api_error(error_text)
  )
}
