use crate::AppResult;
use crate::drive::{DriveClient, DriveFile};
use crate::tracer::ContextExt;
use crate::{debug, info};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One remote folder, flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRecord {
  pub id: String,
  pub name: String,
  pub parent: Option<String>,
}

impl From<DriveFile> for FolderRecord {
  /// Only the first parent reference is kept; folders with several parents
  /// lose the rest.
  fn from(file: DriveFile) -> Self {
    Self {
      id: file.id,
      name: file.name,
      parent: file.parents.into_iter().next(),
    }
  }
}

/// The `{name, parent}` projection stored per id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
  pub name: String,
  pub parent: Option<String>,
}

/// Folder id to `{name, parent}`. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderMap(BTreeMap<String, FolderEntry>);

impl FolderMap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, record: FolderRecord) {
    self.0.insert(
      record.id,
      FolderEntry {
        name: record.name,
        parent: record.parent,
      },
    );
  }

  /// Folds one listing page into the map. Returns how many records it held.
  pub fn absorb(&mut self, files: Vec<DriveFile>) -> usize {
    let count = files.len();
    for file in files {
      self.insert(FolderRecord::from(file));
    }
    count
  }

  pub fn get(&self, id: &str) -> Option<&FolderEntry> {
    self.0.get(id)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn ids(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }
}

/// Lists every non-trashed folder in `drive_id`, following page cursors until
/// the provider stops returning one. Any failed page aborts the whole build.
pub async fn build_folder_map(
  client: &DriveClient,
  drive_id: &str,
) -> AppResult<FolderMap> {
  // An empty id is sent as-is; the provider rejects it like any unknown drive.
  info!("Building folder map for drive ID: {}", drive_id);

  let mut folder_map = FolderMap::new();
  let mut page_token: Option<String> = None;
  let mut pages = 0usize;

  loop {
    let page = client
      .list_folders_page(drive_id, page_token.as_deref())
      .await
      .cwl(&format!("Failed to list folders for drive {drive_id}"))?;

    pages += 1;
    let count = folder_map.absorb(page.files);
    debug!(
      "Processed {} folders in page {} for drive {}",
      count, pages, drive_id
    );

    page_token = page.next_page_token.filter(|t| !t.is_empty());
    if page_token.is_none() {
      break;
    }
  }

  info!(
    "Built folder map with {} folders from {} pages",
    folder_map.len(),
    pages
  );
  Ok(folder_map)
}
