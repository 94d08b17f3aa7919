//! In-memory folder repository for tests and single-process embedding.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use medialib_core::error::AppError;
use medialib_core::result::AppResult;
use medialib_core::types::{FolderId, MediaId};
use medialib_entity::folder::{Folder, FolderChanges, NewFolder};

use super::{FolderRepository, TreeLock};

/// Internal state for the memory-based repository.
#[derive(Debug, Default)]
struct InnerState {
    /// Next surrogate key to hand out.
    next_id: i64,
    /// Folder rows keyed by id.
    folders: BTreeMap<FolderId, Folder>,
    /// Media items attached to each folder.
    media: HashMap<FolderId, HashSet<MediaId>>,
}

impl InnerState {
    fn has_children(&self, id: FolderId) -> bool {
        self.folders.values().any(|f| f.parent_id == Some(id))
    }

    fn media_count(&self, id: FolderId) -> u64 {
        self.media.get(&id).map_or(0, |m| m.len() as u64)
    }
}

/// Folder repository kept entirely in memory behind a Tokio `RwLock`.
///
/// Enforces the same row-level constraints as the PostgreSQL schema:
/// unique slugs, existing parents, and restricted deletes.
#[derive(Debug, Clone, Default)]
pub struct MemoryFolderRepository {
    state: Arc<RwLock<InnerState>>,
    /// Tree-wide mutation lock, shared by clones.
    tree_lock: Arc<Mutex<()>>,
}

impl MemoryFolderRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a media item to a folder.
    pub async fn attach_media(&self, folder_id: FolderId, media_id: MediaId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.folders.contains_key(&folder_id) {
            return Err(AppError::not_found(format!("Folder {folder_id} not found")));
        }
        state.media.entry(folder_id).or_default().insert(media_id);
        Ok(())
    }

    /// Detach a media item from a folder. Returns `true` if it was attached.
    pub async fn detach_media(&self, folder_id: FolderId, media_id: MediaId) -> bool {
        let mut state = self.state.write().await;
        state
            .media
            .get_mut(&folder_id)
            .is_some_and(|m| m.remove(&media_id))
    }

    /// Overwrite a parent link without any checks.
    ///
    /// Exists to reproduce corrupted hierarchies that bypassed the service.
    pub async fn force_parent(&self, id: FolderId, parent_id: Option<FolderId>) -> AppResult<()> {
        let mut state = self.state.write().await;
        let folder = state
            .folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        folder.parent_id = parent_id;
        Ok(())
    }
}

#[async_trait]
impl FolderRepository for MemoryFolderRepository {
    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self.state.read().await.folders.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state.folders.values().find(|f| f.slug == slug).cloned())
    }

    async fn find_children(&self, parent_id: Option<FolderId>) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut children: Vec<Folder> = state
            .folders
            .values()
            .filter(|f| f.parent_id == parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<FolderId>) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .folders
            .values()
            .any(|f| f.slug == slug && Some(f.id) != exclude))
    }

    async fn insert(&self, data: &NewFolder) -> AppResult<Folder> {
        let mut state = self.state.write().await;

        if state.folders.values().any(|f| f.slug == data.slug) {
            return Err(AppError::conflict(format!(
                "Folder slug '{}' already exists",
                data.slug
            )));
        }
        if let Some(parent_id) = data.parent_id {
            if !state.folders.contains_key(&parent_id) {
                return Err(AppError::conflict(format!(
                    "Parent folder {parent_id} does not exist"
                )));
            }
        }

        state.next_id += 1;
        let now = Utc::now();
        let folder = Folder {
            id: FolderId(state.next_id),
            name: data.name.clone(),
            slug: data.slug.clone(),
            description: data.description.clone(),
            parent_id: data.parent_id,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        state.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn update(&self, id: FolderId, changes: &FolderChanges) -> AppResult<Folder> {
        let mut state = self.state.write().await;

        if let Some(slug) = &changes.slug {
            if state.folders.values().any(|f| &f.slug == slug && f.id != id) {
                return Err(AppError::conflict(format!(
                    "Folder slug '{slug}' already exists"
                )));
            }
        }
        if let Some(Some(parent_id)) = changes.parent_id {
            if !state.folders.contains_key(&parent_id) {
                return Err(AppError::conflict(format!(
                    "Parent folder {parent_id} does not exist"
                )));
            }
        }

        let folder = state
            .folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        changes.apply(folder, Utc::now());
        Ok(folder.clone())
    }

    async fn delete(&self, id: FolderId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.has_children(id) || state.media_count(id) > 0 {
            return Err(AppError::conflict(format!(
                "Failed to delete folder {id}: referenced rows prevent this change"
            )));
        }
        state.media.remove(&id);
        Ok(state.folders.remove(&id).is_some())
    }

    async fn count_children(&self, id: FolderId) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .folders
            .values()
            .filter(|f| f.parent_id == Some(id))
            .count() as u64)
    }

    async fn count_media(&self, id: FolderId) -> AppResult<u64> {
        Ok(self.state.read().await.media_count(id))
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.state.read().await.folders.len() as u64)
    }

    async fn lock_tree(&self) -> AppResult<TreeLock> {
        let guard = Arc::clone(&self.tree_lock).lock_owned().await;
        Ok(TreeLock::holding(guard))
    }
}
