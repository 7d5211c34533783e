use crate::AppResult;
use crate::drive::DriveClient;
use crate::folder_map::FolderMap;
use crate::handler::{Stage, enter};
use crate::tracer::ContextExt;
use crate::{info, warn};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
  Created,
  Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
  pub file_id: String,
  pub action: PublishAction,
}

/// UTF-8 JSON with four-space indentation.
pub fn serialize_map(map: &FolderMap) -> AppResult<String> {
  let mut buf = Vec::new();
  let formatter = PrettyFormatter::with_indent(b"    ");
  let mut ser = Serializer::with_formatter(&mut buf, formatter);
  map
    .serialize(&mut ser)
    .cwl("Failed to serialize folder map")?;
  String::from_utf8(buf).cwl("Serialized folder map is not valid UTF-8")
}

/// Writes `map` into `filename` under `folder_id`: overwrites the first
/// existing match, or creates the file when there is none.
///
/// Search and write are separate calls, so two invocations racing here can
/// both create the file.
pub async fn publish_map(
  client: &DriveClient,
  folder_id: &str,
  filename: &str,
  map: &FolderMap,
) -> AppResult<Published> {
  publish_map_staged(client, folder_id, filename, map, enter).await
}

/// Same as [`publish_map`], reporting each stage to `on_stage` before the
/// call that performs it.
pub async fn publish_map_staged<F>(
  client: &DriveClient,
  folder_id: &str,
  filename: &str,
  map: &FolderMap,
  mut on_stage: F,
) -> AppResult<Published>
where
  F: FnMut(Stage),
{
  info!("Preparing to upload map to folder: {}", folder_id);

  let content = serialize_map(map)?;

  on_stage(Stage::SearchExisting);
  let existing = client
    .find_files_by_name(folder_id, filename)
    .await
    .cwl(&format!("Failed to search for '{filename}' in {folder_id}"))?;

  match existing.first() {
    Some(file_id) => {
      if existing.len() > 1 {
        warn!(
          "Found {} files named '{}' in {}, updating the first one",
          existing.len(),
          filename,
          folder_id
        );
      }
      on_stage(Stage::Update);
      info!("Updating existing file: {}", file_id);
      let file_id = client
        .update_file_content(file_id, &content)
        .await
        .cwl(&format!("Failed to update file {file_id}"))?;
      Ok(Published {
        file_id,
        action: PublishAction::Updated,
      })
    }
    None => {
      on_stage(Stage::Create);
      info!("Creating new file '{}'", filename);
      let file_id = client
        .create_text_file(folder_id, filename, &content)
        .await
        .cwl(&format!("Failed to create file '{filename}'"))?;
      Ok(Published {
        file_id,
        action: PublishAction::Created,
      })
    }
  }
}
