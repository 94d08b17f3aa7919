//! Folder create, rename, move and delete.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use medialib_core::error::AppError;
use medialib_core::result::AppResult;
use medialib_core::types::FolderId;
use medialib_database::{FolderRepository, TreeLock};
use medialib_entity::folder::{Folder, FolderChanges, NewFolder};

use super::slug::unique_slug;
use super::tree::TreeService;
use crate::context::RequestContext;

/// Maximum folder name length, in characters.
pub const MAX_NAME_LENGTH: u64 = 255;

/// Request to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = MAX_NAME_LENGTH, message = "Folder name must be 1 to 255 characters"))]
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Parent folder ID (None for root-level).
    #[serde(default)]
    pub parent_id: Option<FolderId>,
}

/// Request to rename or re-describe a folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateFolderRequest {
    /// New folder name.
    #[validate(length(min = 1, max = MAX_NAME_LENGTH, message = "Folder name must be 1 to 255 characters"))]
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to move a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFolderRequest {
    /// New parent folder ID, or `None` to make the folder a root.
    pub new_parent_id: Option<FolderId>,
}

/// Manages folder mutations.
///
/// All mutations hold [`FolderRepository::lock_tree`] so that the slug and
/// cycle checks see the same state as the write that follows them. The lock
/// belongs to the repository, so services sharing a repository serialize
/// against each other.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Folder repository.
    repo: Arc<dyn FolderRepository>,
    /// Hierarchy queries.
    tree: TreeService,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(repo: Arc<dyn FolderRepository>) -> Self {
        Self {
            tree: TreeService::new(Arc::clone(&repo)),
            repo,
        }
    }

    async fn lock(&self) -> AppResult<TreeLock> {
        self.repo.lock_tree().await
    }

    /// The hierarchy query service sharing this repository.
    pub fn tree(&self) -> &TreeService {
        &self.tree
    }

    /// Gets a folder by ID.
    pub async fn get(&self, folder_id: FolderId) -> AppResult<Folder> {
        self.repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Gets a folder by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<Folder> {
        self.repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder '{slug}' not found")))
    }

    /// Lists root folders.
    pub async fn roots(&self) -> AppResult<Vec<Folder>> {
        self.repo.find_children(None).await
    }

    /// Lists direct children of a folder.
    pub async fn children(&self, folder_id: FolderId) -> AppResult<Vec<Folder>> {
        self.get(folder_id).await?;
        self.repo.find_children(Some(folder_id)).await
    }

    /// Creates a new folder.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        mut req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        req.name = req.name.trim().to_string();
        req.validate()?;

        let _guard = self.lock().await?;

        if let Some(parent_id) = req.parent_id {
            if self.repo.find_by_id(parent_id).await?.is_none() {
                return Err(AppError::validation(format!(
                    "Parent folder {parent_id} does not exist"
                )));
            }
        }

        let slug = unique_slug(self.repo.as_ref(), &req.name, None).await?;
        let folder = self
            .repo
            .insert(&NewFolder {
                name: req.name,
                slug,
                description: req.description,
                parent_id: req.parent_id,
                created_by: ctx.user_id,
            })
            .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            slug = %folder.slug,
            parent_id = ?folder.parent_id,
            "Folder created"
        );

        Ok(folder)
    }

    /// Renames and/or re-describes a folder.
    ///
    /// The slug is regenerated only when the name actually changes.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        mut req: UpdateFolderRequest,
    ) -> AppResult<Folder> {
        req.name = req.name.map(|n| n.trim().to_string());
        req.validate()?;

        let _guard = self.lock().await?;
        let folder = self.get(folder_id).await?;

        let mut changes = FolderChanges::default();
        if let Some(name) = req.name {
            if name != folder.name {
                changes.slug = Some(unique_slug(self.repo.as_ref(), &name, Some(folder_id)).await?);
                changes.name = Some(name);
            }
        }
        changes.description = req.description;

        if changes.is_empty() {
            return Ok(folder);
        }

        let updated = self.repo.update(folder_id, &changes).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            slug = %updated.slug,
            "Folder updated"
        );

        Ok(updated)
    }

    /// Moves a folder under a new parent, or to the root when `new_parent_id` is `None`.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        req: MoveFolderRequest,
    ) -> AppResult<Folder> {
        let _guard = self.lock().await?;
        let folder = self.get(folder_id).await?;

        if let Some(target_id) = req.new_parent_id {
            if target_id == folder_id {
                warn!(folder_id = %folder_id, "Rejected move of folder into itself");
                return Err(AppError::cycle("Cannot move a folder into itself"));
            }

            if self.repo.find_by_id(target_id).await?.is_none() {
                return Err(AppError::validation(format!(
                    "Target folder {target_id} does not exist"
                )));
            }

            if self.tree.chain_contains(target_id, folder_id).await? {
                warn!(
                    folder_id = %folder_id,
                    target_id = %target_id,
                    "Rejected move of folder into its own descendant"
                );
                return Err(AppError::cycle(
                    "Cannot move a folder into one of its descendants",
                ));
            }
        }

        if folder.parent_id == req.new_parent_id {
            return Ok(folder);
        }

        let moved = self
            .repo
            .update(
                folder_id,
                &FolderChanges {
                    parent_id: Some(req.new_parent_id),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            parent_id = ?moved.parent_id,
            "Folder moved"
        );

        Ok(moved)
    }

    /// Deletes an empty folder.
    ///
    /// Only direct children and directly attached media block the delete.
    pub async fn delete(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<()> {
        let _guard = self.lock().await?;
        let folder = self.get(folder_id).await?;

        let children = self.repo.count_children(folder_id).await?;
        let media = self.repo.count_media(folder_id).await?;

        if children > 0 || media > 0 {
            let mut reasons = Vec::new();
            if children > 0 {
                reasons.push("children");
            }
            if media > 0 {
                reasons.push("media");
            }

            warn!(
                folder_id = %folder_id,
                children,
                media,
                "Rejected delete of non-empty folder"
            );

            return Err(AppError::conflict(format!(
                "Folder '{}' is not empty: contains {}",
                folder.name,
                reasons.join(" and ")
            ))
            .with_details(serde_json::json!({
                "reasons": reasons,
                "children": children,
                "media": media,
            })));
        }

        if !self.repo.delete(folder_id).await? {
            return Err(AppError::not_found(format!("Folder {folder_id} not found")));
        }

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            slug = %folder.slug,
            "Folder deleted"
        );

        Ok(())
    }
}
