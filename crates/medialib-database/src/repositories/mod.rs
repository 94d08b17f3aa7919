//! Folder data access.
//!
//! [`FolderRepository`] is the only seam between the hierarchy logic and
//! storage. It exposes plain row operations; tree semantics (cycle checks,
//! slug disambiguation, delete guards) live in the service layer.

pub mod folder;
pub mod memory;

use async_trait::async_trait;

use medialib_core::result::AppResult;
use medialib_core::types::FolderId;
use medialib_entity::folder::{Folder, FolderChanges, NewFolder};

pub use folder::PgFolderRepository;
pub use memory::MemoryFolderRepository;

/// Guard returned by [`FolderRepository::lock_tree`]. The lock is released on drop.
pub struct TreeLock {
    _held: Box<dyn Send>,
}

impl TreeLock {
    /// A guard that keeps `resource` alive until dropped.
    pub fn holding(resource: impl Send + 'static) -> Self {
        Self {
            _held: Box::new(resource),
        }
    }
}

impl std::fmt::Debug for TreeLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeLock").finish_non_exhaustive()
    }
}

#[async_trait]
pub trait FolderRepository: std::fmt::Debug + Send + Sync + 'static {
    /// Find a folder by ID.
    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// Find a folder by its slug.
    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Folder>>;

    /// List direct children of `parent_id`, or the root folders when `None`.
    ///
    /// Ordered by name, then id.
    async fn find_children(&self, parent_id: Option<FolderId>) -> AppResult<Vec<Folder>>;

    /// Whether any folder other than `exclude` already uses `slug`.
    async fn slug_exists(&self, slug: &str, exclude: Option<FolderId>) -> AppResult<bool>;

    /// Insert a new folder row and return it.
    async fn insert(&self, data: &NewFolder) -> AppResult<Folder>;

    /// Apply a partial update. Fails with `NotFound` if the row is gone.
    async fn update(&self, id: FolderId, changes: &FolderChanges) -> AppResult<Folder>;

    /// Delete a folder row. Returns `true` if a row was removed.
    async fn delete(&self, id: FolderId) -> AppResult<bool>;

    /// Count direct child folders.
    async fn count_children(&self, id: FolderId) -> AppResult<u64>;

    /// Count media items attached directly to the folder.
    async fn count_media(&self, id: FolderId) -> AppResult<u64>;

    /// Count all folders.
    async fn count(&self) -> AppResult<u64>;

    /// Take the lock covering the whole folder table.
    ///
    /// Every clone of a repository shares the same lock, and the PostgreSQL
    /// backend extends it to other processes.
    async fn lock_tree(&self) -> AppResult<TreeLock>;
}
