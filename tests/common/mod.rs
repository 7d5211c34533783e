#![allow(dead_code)]

use drive_folder_map::config::Config;
use drive_folder_map::drive::DriveClient;
use serde_json::{Value, json};
use wiremock::matchers::{
  body_string_contains, header, method, path, query_param,
  query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "Bearer test-token";
pub const DRIVE_ID: &str = "0ADriveTest";
pub const FOLDER_ID: &str = "1MapFolder";
pub const FILES_PATH: &str = "/drive/v3/files";
pub const UPLOAD_PATH: &str = "/upload/drive/v3/files";
pub const TOKEN_PATH: &str =
  "/computeMetadata/v1/instance/service-accounts/default/token";

pub fn config_for(server: &MockServer) -> Config {
  Config {
    drive_id: DRIVE_ID.to_string(),
    folder_id: FOLDER_ID.to_string(),
    api_root: server.uri(),
    metadata_host: server.address().to_string(),
    ..Config::default()
  }
}

pub fn client_for(server: &MockServer) -> DriveClient {
  DriveClient::new(&config_for(server), TOKEN.to_string())
}

pub fn folder(id: &str, name: &str, parents: &[&str]) -> Value {
  json!({"id": id, "name": name, "parents": parents})
}

pub async fn mount_metadata_token(server: &MockServer) {
  Mock::given(method("GET"))
    .and(path(TOKEN_PATH))
    .and(header("Metadata-Flavor", "Google"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "access_token": "test-token",
      "expires_in": 3599,
      "token_type": "Bearer"
    })))
    .mount(server)
    .await;
}

/// Single folder listing page with no continuation cursor.
pub async fn mount_single_page(server: &MockServer, files: Vec<Value>) {
  Mock::given(method("GET"))
    .and(path(FILES_PATH))
    .and(query_param("driveId", DRIVE_ID))
    .and(query_param_is_missing("pageToken"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(json!({"files": files})),
    )
    .mount(server)
    .await;
}

pub async fn mount_search(server: &MockServer, ids: &[&str]) {
  let files: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
  Mock::given(method("GET"))
    .and(path(FILES_PATH))
    .and(query_param("fields", "files(id)"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(json!({"files": files})),
    )
    .mount(server)
    .await;
}

/// Upload URL handed back in `Location` when a resumable session opens.
pub fn session_url(server: &MockServer, file_path: &str, upload_id: &str) -> String {
  format!(
    "{}{}?uploadType=resumable&upload_id={}",
    server.uri(),
    file_path,
    upload_id
  )
}

/// Session start for a new file in FOLDER_ID plus the content PUT that
/// returns `new_id`.
pub async fn mount_resumable_create(server: &MockServer, new_id: &str, times: u64) {
  let upload_id = format!("create-{new_id}");

  Mock::given(method("POST"))
    .and(path(UPLOAD_PATH))
    .and(header("authorization", TOKEN))
    .and(query_param("uploadType", "resumable"))
    .and(query_param("supportsAllDrives", "true"))
    .and(header("x-upload-content-type", "text/plain"))
    .and(body_string_contains("\"parents\":[\"1MapFolder\"]"))
    .and(body_string_contains("\"mimeType\":\"text/plain\""))
    .respond_with(
      ResponseTemplate::new(200)
        .insert_header("Location", session_url(server, UPLOAD_PATH, &upload_id)),
    )
    .expect(times)
    .mount(server)
    .await;

  Mock::given(method("PUT"))
    .and(path(UPLOAD_PATH))
    .and(query_param("upload_id", upload_id.as_str()))
    .and(header("content-type", "text/plain"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": new_id})))
    .expect(times)
    .mount(server)
    .await;
}

/// Session start on an existing file plus the content PUT.
pub async fn mount_resumable_update(server: &MockServer, file_id: &str, times: u64) {
  let file_path = format!("{UPLOAD_PATH}/{file_id}");
  let upload_id = format!("update-{file_id}");

  Mock::given(method("PATCH"))
    .and(path(file_path.as_str()))
    .and(header("authorization", TOKEN))
    .and(query_param("uploadType", "resumable"))
    .and(query_param("supportsAllDrives", "true"))
    .respond_with(
      ResponseTemplate::new(200)
        .insert_header("Location", session_url(server, &file_path, &upload_id)),
    )
    .expect(times)
    .mount(server)
    .await;

  Mock::given(method("PUT"))
    .and(path(file_path.as_str()))
    .and(query_param("upload_id", upload_id.as_str()))
    .and(header("content-type", "text/plain"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": file_id})))
    .expect(times)
    .mount(server)
    .await;
}

/// Bodies PUT into upload sessions, oldest first.
pub async fn uploaded_contents(server: &MockServer) -> Vec<String> {
  server
    .received_requests()
    .await
    .unwrap_or_default()
    .into_iter()
    .filter(|r| r.method.as_str() == "PUT")
    .map(|r| String::from_utf8(r.body).expect("upload body is UTF-8"))
    .collect()
}

/// Every request against the upload endpoints, session starts included.
pub async fn write_requests(server: &MockServer) -> Vec<wiremock::Request> {
  server
    .received_requests()
    .await
    .unwrap_or_default()
    .into_iter()
    .filter(|r| r.url.path().starts_with(UPLOAD_PATH))
    .collect()
}
