//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use medialib_core::types::{FolderId, UserId};

/// A folder in the media library hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Human-readable label.
    pub name: String,
    /// URL-safe identifier derived from `name`, unique across all folders.
    pub slug: String,
    /// Optional free text.
    pub description: Option<String>,
    /// Parent folder ID (null for root folders).
    pub parent_id: Option<FolderId>,
    /// The user who created the folder.
    pub created_by: UserId,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to insert a new folder row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFolder {
    /// Folder name.
    pub name: String,
    /// Already-disambiguated slug.
    pub slug: String,
    /// Optional description.
    pub description: Option<String>,
    /// Parent folder (None for root).
    pub parent_id: Option<FolderId>,
    /// The creating user.
    pub created_by: UserId,
}

/// A partial update of a folder row. `None` leaves the column untouched.
///
/// `parent_id` is doubly optional: `Some(None)` moves the folder to the root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderChanges {
    /// New name.
    pub name: Option<String>,
    /// New slug.
    pub slug: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New parent.
    pub parent_id: Option<Option<FolderId>>,
}

impl FolderChanges {
    /// Whether the change set touches no column.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.parent_id.is_none()
    }

    /// Apply the change set to an in-memory folder.
    pub fn apply(&self, folder: &mut Folder, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            folder.name = name.clone();
        }
        if let Some(slug) = &self.slug {
            folder.slug = slug.clone();
        }
        if let Some(description) = &self.description {
            folder.description = Some(description.clone());
        }
        if let Some(parent_id) = self.parent_id {
            folder.parent_id = parent_id;
        }
        folder.updated_at = now;
    }
}
