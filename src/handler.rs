use crate::AppResult;
use crate::config::Config;
use crate::drive::DriveClient;
use crate::folder_map::build_folder_map;
use crate::publish::{Published, publish_map};
use crate::tracer::{ContextExt, format_error_chain, public_error_message};
use crate::{error, info};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Steps of one invocation, in order. Any step may end in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Start,
  ListFolders,
  MapBuilt,
  SearchExisting,
  Update,
  Create,
  Done,
  Failed,
}

/// Body returned to the trigger caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
  pub status: String,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file_id: Option<String>,
}

impl InvocationResponse {
  pub fn success(file_id: String) -> Self {
    Self {
      status: "success".to_string(),
      message: "Map updated successfully".to_string(),
      file_id: Some(file_id),
    }
  }

  pub fn failure(message: String) -> Self {
    Self {
      status: "error".to_string(),
      message,
      file_id: None,
    }
  }
}

struct AppError(anyhow::Error);

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    AppError(err)
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    error!("Error executing function: {}", format_error_chain(&self.0));
    (
      StatusCode::INTERNAL_SERVER_ERROR,
      Json(InvocationResponse::failure(public_error_message(&self.0))),
    )
      .into_response()
  }
}

pub fn enter(stage: Stage) {
  info!(stage = ?stage, "Invocation stage");
}

/// Credentials, folder listing, then publish. Nothing is retried; the first
/// error ends the invocation.
pub async fn run_invocation(config: &Config) -> AppResult<Published> {
  enter(Stage::Start);
  let client = DriveClient::connect(config).await?;

  enter(Stage::ListFolders);
  let folder_map = build_folder_map(&client, &config.drive_id)
    .await
    .cwl("Could not build folder map")?;

  enter(Stage::MapBuilt);
  info!("Folder map holds {} folders", folder_map.len());

  let published =
    publish_map(&client, &config.folder_id, &config.filename, &folder_map)
      .await
      .cwl("Could not publish folder map")?;

  info!(file_id = %published.file_id, "Map file written");
  enter(Stage::Done);
  Ok(published)
}

async fn trigger(
  State(config): State<Arc<Config>>,
) -> Result<Json<InvocationResponse>, AppError> {
  info!("Cloud Function execution started.");

  match run_invocation(&config).await {
    Ok(published) => Ok(Json(InvocationResponse::success(published.file_id))),
    Err(e) => {
      enter(Stage::Failed);
      Err(e.into())
    }
  }
}

/// Every method and path lands on the same handler.
pub fn router(config: Arc<Config>) -> Router {
  Router::new().fallback(trigger).with_state(config)
}
