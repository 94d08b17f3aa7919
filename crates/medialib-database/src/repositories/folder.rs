//! PostgreSQL folder repository.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;

use medialib_core::error::{AppError, ErrorKind};
use medialib_core::result::AppResult;
use medialib_core::types::FolderId;
use medialib_entity::folder::{Folder, FolderChanges, NewFolder};

use super::{FolderRepository, TreeLock};

/// Unique constraint guarding `folders.slug`.
const SLUG_CONSTRAINT: &str = "folders_slug_key";

/// Advisory lock key serializing folder tree mutations.
const TREE_LOCK_KEY: i64 = 0x6d65_6469_615f_7472;

/// Folder repository backed by the `folders` and `media` tables.
#[derive(Debug, Clone)]
pub struct PgFolderRepository {
    pool: PgPool,
    /// Queues local writers before they take a pooled connection for the advisory lock.
    local_lock: Arc<Mutex<()>>,
}

impl PgFolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            local_lock: Arc::new(Mutex::new(())),
        }
    }
}

fn map_write_error(e: sqlx::Error, slug: Option<&str>, context: &str) -> AppError {
    let (slug_taken, foreign_key) = match &e {
        sqlx::Error::Database(db_err) => (
            db_err.constraint() == Some(SLUG_CONSTRAINT),
            db_err.is_foreign_key_violation(),
        ),
        _ => (false, false),
    };

    if slug_taken {
        AppError::with_source(
            ErrorKind::Conflict,
            format!("Folder slug '{}' already exists", slug.unwrap_or_default()),
            e,
        )
    } else if foreign_key {
        AppError::with_source(
            ErrorKind::Conflict,
            format!("{context}: referenced rows prevent this change"),
            e,
        )
    } else {
        AppError::with_source(ErrorKind::Database, context.to_string(), e)
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find folder by slug", e)
            })
    }

    async fn find_children(&self, parent_id: Option<FolderId>) -> AppResult<Vec<Folder>> {
        let query = match parent_id {
            Some(parent_id) => sqlx::query_as::<_, Folder>(
                "SELECT * FROM folders WHERE parent_id = $1 ORDER BY name ASC, id ASC",
            )
            .bind(parent_id),
            None => sqlx::query_as::<_, Folder>(
                "SELECT * FROM folders WHERE parent_id IS NULL ORDER BY name ASC, id ASC",
            ),
        };

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<FolderId>) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM folders WHERE slug = $1 \
             AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check slug", e))
    }

    async fn insert(&self, data: &NewFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (name, slug, description, parent_id, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.slug)
        .bind(&data.description)
        .bind(data.parent_id)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, Some(&data.slug), "Failed to create folder"))
    }

    async fn update(&self, id: FolderId, changes: &FolderChanges) -> AppResult<Folder> {
        let move_parent = changes.parent_id.is_some();
        let new_parent = changes.parent_id.flatten();

        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET \
                name = COALESCE($2, name), \
                slug = COALESCE($3, slug), \
                description = COALESCE($4, description), \
                parent_id = CASE WHEN $5 THEN $6 ELSE parent_id END, \
                updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.slug)
        .bind(&changes.description)
        .bind(move_parent)
        .bind(new_parent)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, changes.slug.as_deref(), "Failed to update folder"))?
        .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    async fn delete(&self, id: FolderId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, None, "Failed to delete folder"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_children(&self, id: FolderId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count children", e)
            })?;
        Ok(count as u64)
    }

    async fn count_media(&self, id: FolderId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media WHERE folder_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count media", e))?;
        Ok(count as u64)
    }

    async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count folders", e)
            })?;
        Ok(count as u64)
    }

    async fn lock_tree(&self) -> AppResult<TreeLock> {
        let local = Arc::clone(&self.local_lock).lock_owned().await;
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to open lock transaction", e)
        })?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(TREE_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to lock folder tree", e)
            })?;

        // Dropping the transaction rolls it back, which releases the advisory lock.
        Ok(TreeLock::holding((tx, local)))
    }
}
