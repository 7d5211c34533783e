use crate::AppResult;
use crate::apis::{Ep, FOLDER_MIME, TEXT_MIME, escape_query_literal};
use crate::config::Config;
use crate::error_utils::format_drive_error;
use crate::goauth::get_drive_token;
use crate::tracer::ContextExt;
use crate::{bail, debug};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::LazyLock;

pub const FOLDER_PAGE_SIZE: u32 = 1000;
const FOLDER_FIELDS: &str = "nextPageToken,files(id,name,parents)";
const UPLOAD_CONTENT_TYPE: &str = "x-upload-content-type";
const UPLOAD_CONTENT_LENGTH: &str = "x-upload-content-length";

// Built on first use, read-only afterwards.
pub static CL: LazyLock<Client> = LazyLock::new(|| {
  Client::builder()
    .tcp_keepalive(std::time::Duration::from_secs(60))
    .tcp_nodelay(true)
    .timeout(std::time::Duration::from_secs(45))
    .build()
    .expect("Failed to create HTTP client")
});

/// A Drive object as projected by the list calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriveFile {
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub parents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
  #[serde(default)]
  pub files: Vec<DriveFile>,
  pub next_page_token: Option<String>,
}

/// Authorized handle on the Drive v3 files API.
#[derive(Debug, Clone)]
pub struct DriveClient {
  files_url: String,
  uploads_url: String,
  token: String,
}

impl DriveClient {
  pub fn new(config: &Config, token: String) -> Self {
    Self {
      files_url: Ep::Files.base_url(config),
      uploads_url: Ep::Uploads.base_url(config),
      token,
    }
  }

  /// Resolves ambient credentials and returns a ready client.
  pub async fn connect(config: &Config) -> AppResult<Self> {
    let token = get_drive_token(config)
      .await
      .cwl("Failed to initialize Google Drive client")?;
    Ok(Self::new(config, token))
  }

  fn req_build(
    &self,
    method: Method,
    url: &str,
    query: &Value,
  ) -> RequestBuilder {
    let token_preview: String = self.token.chars().take(18).collect();
    debug!(
      method = %method,
      url = %url,
      token_len = self.token.len(),
      token_preview = %token_preview,
      "req_build: applying header token"
    );

    CL.request(method, url)
      .header(AUTHORIZATION, &self.token)
      .query(query)
  }

  /// One page of non-trashed folders in `drive_id`.
  pub async fn list_folders_page(
    &self,
    drive_id: &str,
    page_token: Option<&str>,
  ) -> AppResult<FilePage> {
    let mut query = json!({
      "q": format!("mimeType='{}' and trashed=false", FOLDER_MIME),
      "corpora": "drive",
      "driveId": drive_id,
      "includeItemsFromAllDrives": "true",
      "supportsAllDrives": "true",
      "fields": FOLDER_FIELDS,
      "pageSize": FOLDER_PAGE_SIZE,
    });

    if let Some(token_val) = page_token {
      query["pageToken"] = json!(token_val);
    }

    let res = self
      .req_build(Method::GET, &self.files_url, &query)
      .send()
      .await
      .cwl("Failed to send list folders request")?;

    let rfin = check_response(res, "List folders").await?;
    serde_json::from_value(rfin).cwl("Failed to parse list folders response")
  }

  /// Ids of non-trashed files named exactly `name` directly under `folder_id`,
  /// in the order the provider returns them.
  pub async fn find_files_by_name(
    &self,
    folder_id: &str,
    name: &str,
  ) -> AppResult<Vec<String>> {
    let query_str = format!(
      "name = '{}' and '{}' in parents and trashed = false",
      escape_query_literal(name),
      escape_query_literal(folder_id)
    );
    debug!("Searching for existing file with query: {}", query_str);

    let query = json!({
      "q": query_str,
      "fields": "files(id)",
      "includeItemsFromAllDrives": "true",
      "supportsAllDrives": "true",
    });

    let res = self
      .req_build(Method::GET, &self.files_url, &query)
      .send()
      .await
      .cwl("Failed to send file search request")?;

    let rfin = check_response(res, "Search existing file").await?;
    let page: FilePage = serde_json::from_value(rfin)
      .cwl("Failed to parse file search response")?;

    Ok(page.files.into_iter().map(|f| f.id).collect())
  }

  /// Creates `name` under `folder_id` with `content` as its text body.
  pub async fn create_text_file(
    &self,
    folder_id: &str,
    name: &str,
    content: &str,
  ) -> AppResult<String> {
    let metadata = json!({
      "name": name,
      "parents": [folder_id],
      "mimeType": TEXT_MIME,
    });

    let req = self
      .req_build(Method::POST, &self.uploads_url, &resumable_query())
      .json(&metadata);
    let session = start_upload_session(req, content, "Create file").await?;

    self.upload_to_session(&session, content, "Create file").await
  }

  /// Replaces the content of `file_id`, leaving its other metadata alone.
  pub async fn update_file_content(
    &self,
    file_id: &str,
    content: &str,
  ) -> AppResult<String> {
    let url = format!("{}/{}", self.uploads_url, file_id);

    let req = self.req_build(Method::PATCH, &url, &resumable_query());
    let session = start_upload_session(req, content, "Update file").await?;

    self.upload_to_session(&session, content, "Update file").await
  }

  /// Sends the whole body to an open resumable session in one request.
  async fn upload_to_session(
    &self,
    session_url: &str,
    content: &str,
    operation: &str,
  ) -> AppResult<String> {
    debug!(
      session = %session_url,
      bytes = content.len(),
      "{operation}: uploading content"
    );

    let res = CL
      .put(session_url)
      .header(AUTHORIZATION, &self.token)
      .header(CONTENT_TYPE, TEXT_MIME)
      .body(content.to_string())
      .send()
      .await
      .cwl(&format!("Failed to send {operation} content"))?;

    let rfin = check_response(res, operation).await?;
    file_id_from(&rfin, operation)
  }
}

fn resumable_query() -> Value {
  json!({
    "uploadType": "resumable",
    "supportsAllDrives": "true",
    "fields": "id",
  })
}

/// Opens a resumable session and returns its upload URL from `Location`.
async fn start_upload_session(
  req: RequestBuilder,
  content: &str,
  operation: &str,
) -> AppResult<String> {
  let res = req
    .header(UPLOAD_CONTENT_TYPE, TEXT_MIME)
    .header(UPLOAD_CONTENT_LENGTH, content.len().to_string())
    .send()
    .await
    .cwl(&format!("Failed to start {operation} upload session"))?;

  let status = res.status().as_u16();
  if !(200..=299).contains(&status) {
    let error_text = res
      .text()
      .await
      .unwrap_or_else(|_| "Unknown error".to_string());
    bail!(format_drive_error(operation, status, &error_text));
  }

  res
    .headers()
    .get(LOCATION)
    .and_then(|loc| loc.to_str().ok())
    .map(|loc| loc.to_string())
    .cwl(&format!("No upload session location returned for {operation}"))
}

async fn check_response(res: Response, operation: &str) -> AppResult<Value> {
  match res.status().as_u16() {
    200..=299 => res
      .json()
      .await
      .cwl(&format!("Failed to parse JSON response for {operation}")),
    status => {
      let error_text = res
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
      bail!(format_drive_error(operation, status, &error_text))
    }
  }
}

fn file_id_from(rfin: &Value, operation: &str) -> AppResult<String> {
  rfin
    .get("id")
    .and_then(|id| id.as_str())
    .map(|id| id.to_string())
    .cwl(&format!("No file id returned from {operation}"))
}
