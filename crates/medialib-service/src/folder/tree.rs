//! Hierarchy queries: ancestor chains, descendant sets, paths and trees.
//!
//! Every walk tracks the ids it has visited. Reaching an id twice means
//! the stored parent links already contain a cycle, which is reported as
//! an `Integrity` error instead of looping.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{error, warn};

use medialib_core::error::AppError;
use medialib_core::result::AppResult;
use medialib_core::types::FolderId;
use medialib_database::FolderRepository;
use medialib_entity::folder::{Folder, FolderNode, FolderTree};

/// Separator used by [`TreeService::full_path`].
pub const PATH_SEPARATOR: &str = "/";

/// Read-only traversal of the folder hierarchy.
#[derive(Debug, Clone)]
pub struct TreeService {
    /// Folder repository.
    repo: Arc<dyn FolderRepository>,
}

fn corrupted(message: String) -> AppError {
    error!(reason = %message, "Folder hierarchy integrity violation");
    AppError::integrity(message)
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(repo: Arc<dyn FolderRepository>) -> Self {
        Self { repo }
    }

    async fn require(&self, folder_id: FolderId) -> AppResult<Folder> {
        self.repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Ancestors of a folder, root first. Empty for a root folder.
    pub async fn ancestors(&self, folder_id: FolderId) -> AppResult<Vec<Folder>> {
        let folder = self.require(folder_id).await?;
        self.ancestors_of(&folder).await
    }

    /// Ancestors of an already-loaded folder, root first.
    pub async fn ancestors_of(&self, folder: &Folder) -> AppResult<Vec<Folder>> {
        let mut visited = HashSet::from([folder.id]);
        let mut chain = Vec::new();
        let mut next = folder.parent_id;

        while let Some(parent_id) = next {
            if !visited.insert(parent_id) {
                return Err(corrupted(format!(
                    "Parent chain of folder {} revisits folder {parent_id}",
                    folder.id
                )));
            }
            let parent = self.repo.find_by_id(parent_id).await?.ok_or_else(|| {
                corrupted(format!(
                    "Folder {} references missing parent {parent_id}",
                    folder.id
                ))
            })?;
            next = parent.parent_id;
            chain.push(parent);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Whether `needle` is `start` itself or lies on the parent chain above `start`.
    ///
    /// Stops at the first match, so a corrupted loop that contains `needle`
    /// still answers `true`; a loop that does not contain it is an
    /// `Integrity` error.
    pub async fn chain_contains(&self, start: FolderId, needle: FolderId) -> AppResult<bool> {
        let mut visited = HashSet::new();
        let mut current = Some(start);

        while let Some(id) = current {
            if id == needle {
                return Ok(true);
            }
            if !visited.insert(id) {
                return Err(corrupted(format!(
                    "Parent chain starting at folder {start} loops through folder {id}"
                )));
            }
            current = self
                .repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| corrupted(format!("Parent chain references missing folder {id}")))?
                .parent_id;
        }

        Ok(false)
    }

    /// Every folder below `folder_id`, breadth first.
    pub async fn descendants(&self, folder_id: FolderId) -> AppResult<Vec<Folder>> {
        let root = self.require(folder_id).await?;
        self.collect_subtree(&root).await
    }

    async fn collect_subtree(&self, root: &Folder) -> AppResult<Vec<Folder>> {
        let mut visited = HashSet::from([root.id]);
        let mut queue = VecDeque::from([root.id]);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            for child in self.repo.find_children(Some(current)).await? {
                if !visited.insert(child.id) {
                    return Err(corrupted(format!(
                        "Folder {} is reachable twice below folder {}",
                        child.id, root.id
                    )));
                }
                queue.push_back(child.id);
                found.push(child);
            }
        }

        Ok(found)
    }

    /// Names from the root down to the folder itself, joined with `/`.
    pub async fn full_path(&self, folder_id: FolderId) -> AppResult<String> {
        let folder = self.require(folder_id).await?;
        let ancestors = self.ancestors_of(&folder).await?;

        let mut names: Vec<&str> = ancestors.iter().map(|f| f.name.as_str()).collect();
        names.push(folder.name.as_str());
        Ok(names.join(PATH_SEPARATOR))
    }

    /// Builds the nested tree below a folder, with child and media counts.
    pub async fn tree(&self, folder_id: FolderId) -> AppResult<FolderNode> {
        let root = self.require(folder_id).await?;
        self.build_node(root).await
    }

    /// Builds every root folder's tree.
    pub async fn forest(&self) -> AppResult<FolderTree> {
        let roots = self.repo.find_children(None).await?;
        if roots.is_empty() {
            return Ok(FolderTree::empty());
        }

        let mut nodes = Vec::with_capacity(roots.len());
        for root in roots {
            nodes.push(self.build_node(root).await?);
        }

        let tree = FolderTree::from_roots(nodes);
        let stored = self.repo.count().await?;
        if tree.total_folders != stored {
            warn!(
                reachable = tree.total_folders,
                stored, "Some folders are not reachable from any root"
            );
        }
        Ok(tree)
    }

    async fn build_node(&self, root: Folder) -> AppResult<FolderNode> {
        let descendants = self.collect_subtree(&root).await?;

        let mut media_counts = HashMap::with_capacity(descendants.len() + 1);
        media_counts.insert(root.id, self.repo.count_media(root.id).await?);
        for folder in &descendants {
            media_counts.insert(folder.id, self.repo.count_media(folder.id).await?);
        }

        let mut by_parent: HashMap<FolderId, Vec<Folder>> = HashMap::new();
        for folder in descendants {
            if let Some(parent_id) = folder.parent_id {
                by_parent.entry(parent_id).or_default().push(folder);
            }
        }

        Ok(assemble(root, 0, &mut by_parent, &media_counts))
    }
}

/// Builds a node from a flat parent index.
fn assemble(
    folder: Folder,
    depth: u32,
    by_parent: &mut HashMap<FolderId, Vec<Folder>>,
    media_counts: &HashMap<FolderId, u64>,
) -> FolderNode {
    let children: Vec<FolderNode> = by_parent
        .remove(&folder.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| assemble(child, depth + 1, by_parent, media_counts))
        .collect();

    FolderNode {
        id: folder.id,
        name: folder.name,
        slug: folder.slug,
        depth,
        child_count: children.len() as u64,
        media_count: media_counts.get(&folder.id).copied().unwrap_or(0),
        children,
    }
}
