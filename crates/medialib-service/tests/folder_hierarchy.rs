//! Integration tests for the folder hierarchy over the in-memory repository.

use std::sync::Arc;
use std::time::Duration;

use medialib_core::error::ErrorKind;
use medialib_core::result::AppResult;
use medialib_core::types::{FolderId, MediaId, UserId};
use medialib_database::{FolderRepository, MemoryFolderRepository, TreeLock};
use medialib_entity::folder::{Folder, FolderChanges, NewFolder};
use medialib_service::{
    CreateFolderRequest, FolderService, MoveFolderRequest, RequestContext, UpdateFolderRequest,
};

struct TestApp {
    repo: MemoryFolderRepository,
    service: FolderService,
    ctx: RequestContext,
}

impl TestApp {
    fn new() -> Self {
        let repo = MemoryFolderRepository::new();
        let service = FolderService::new(Arc::new(repo.clone()));
        Self {
            repo,
            service,
            ctx: RequestContext::new(UserId(1)),
        }
    }

    async fn create(&self, name: &str, parent_id: Option<FolderId>) -> Folder {
        self.service
            .create(
                &self.ctx,
                CreateFolderRequest {
                    name: name.to_string(),
                    description: None,
                    parent_id,
                },
            )
            .await
            .expect("create folder")
    }

    async fn move_to(&self, id: FolderId, parent: Option<FolderId>) -> Result<Folder, ErrorKind> {
        self.service
            .move_folder(&self.ctx, id, MoveFolderRequest { new_parent_id: parent })
            .await
            .map_err(|e| e.kind)
    }
}

fn ids(folders: &[Folder]) -> Vec<FolderId> {
    folders.iter().map(|f| f.id).collect()
}

#[tokio::test]
async fn test_duplicate_names_get_numbered_slugs() {
    let app = TestApp::new();
    let first = app.create("Products", None).await;
    let second = app.create("Products", None).await;
    let third = app.create("products", None).await;

    assert_eq!(first.slug, "products");
    assert_eq!(second.slug, "products-1");
    assert_eq!(third.slug, "products-2");
}

#[tokio::test]
async fn test_slug_suffix_fills_smallest_gap() {
    let app = TestApp::new();
    app.create("Products", None).await;
    let one = app.create("Products", None).await;
    app.create("Products", None).await;

    app.service.delete(&app.ctx, one.id).await.unwrap();
    let again = app.create("Products", None).await;
    assert_eq!(again.slug, "products-1");
}

#[tokio::test]
async fn test_create_records_creator_and_description() {
    let app = TestApp::new();
    let folder = app
        .service
        .create(
            &RequestContext::new(UserId(42)),
            CreateFolderRequest {
                name: "  Banners  ".to_string(),
                description: Some("Homepage banners".to_string()),
                parent_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(folder.name, "Banners");
    assert_eq!(folder.created_by, UserId(42));
    assert_eq!(folder.description.as_deref(), Some("Homepage banners"));
    assert!(folder.is_root());
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = TestApp::new();

    let blank = app
        .service
        .create(
            &app.ctx,
            CreateFolderRequest {
                name: "   ".to_string(),
                description: None,
                parent_id: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(blank.kind, ErrorKind::Validation);

    let too_long = app
        .service
        .create(
            &app.ctx,
            CreateFolderRequest {
                name: "a".repeat(256),
                description: None,
                parent_id: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(too_long.kind, ErrorKind::Validation);

    let orphan = app
        .service
        .create(
            &app.ctx,
            CreateFolderRequest {
                name: "Orphan".to_string(),
                description: None,
                parent_id: Some(FolderId(404)),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(orphan.kind, ErrorKind::Validation);
    assert_eq!(app.repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_rename_regenerates_slug_excluding_self() {
    let app = TestApp::new();
    app.create("Archive", None).await;
    let folder = app.create("Drafts", None).await;

    let renamed = app
        .service
        .rename(
            &app.ctx,
            folder.id,
            UpdateFolderRequest {
                name: Some("Archive".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.slug, "archive-1");

    // A name change that maps onto the folder's own slug keeps it.
    let recased = app
        .service
        .rename(
            &app.ctx,
            folder.id,
            UpdateFolderRequest {
                name: Some("ARCHIVE".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(recased.name, "ARCHIVE");
    assert_eq!(recased.slug, "archive-1");
}

#[tokio::test]
async fn test_rename_same_name_keeps_slug() {
    let app = TestApp::new();
    app.create("Products", None).await;
    let second = app.create("Products", None).await;

    let updated = app
        .service
        .rename(
            &app.ctx,
            second.id,
            UpdateFolderRequest {
                name: Some("Products".to_string()),
                description: Some("Catalog shots".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.slug, "products-1");
    assert_eq!(updated.description.as_deref(), Some("Catalog shots"));
}

#[tokio::test]
async fn test_rename_unknown_folder() {
    let app = TestApp::new();
    let err = app
        .service
        .rename(
            &app.ctx,
            FolderId(77),
            UpdateFolderRequest {
                name: Some("Anything".to_string()),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_move_into_child_is_cycle() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    let b = app.create("B", Some(a.id)).await;

    assert_eq!(app.move_to(a.id, Some(b.id)).await, Err(ErrorKind::Cycle));
    assert_eq!(app.move_to(a.id, Some(a.id)).await, Err(ErrorKind::Cycle));

    let unchanged = app.service.get(a.id).await.unwrap();
    assert!(unchanged.is_root());
}

#[tokio::test]
async fn test_move_into_any_descendant_is_cycle() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    let b = app.create("B", Some(a.id)).await;
    let c = app.create("C", Some(b.id)).await;
    let d = app.create("D", Some(c.id)).await;
    app.create("E", Some(a.id)).await;

    for descendant in app.service.tree().descendants(a.id).await.unwrap() {
        assert_eq!(
            app.move_to(a.id, Some(descendant.id)).await,
            Err(ErrorKind::Cycle)
        );
    }
    assert_eq!(app.move_to(b.id, Some(d.id)).await, Err(ErrorKind::Cycle));
}

#[tokio::test]
async fn test_move_to_missing_parent_is_validation() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    assert_eq!(
        app.move_to(a.id, Some(FolderId(999))).await,
        Err(ErrorKind::Validation)
    );
    assert_eq!(
        app.move_to(FolderId(999), None).await,
        Err(ErrorKind::NotFound)
    );
}

#[tokio::test]
async fn test_move_updates_ancestors() {
    let app = TestApp::new();
    let p_root = app.create("Root", None).await;
    let p = app.create("Parent", Some(p_root.id)).await;
    let f = app.create("Folder", None).await;
    app.create("Leaf", Some(f.id)).await;

    let moved = app.move_to(f.id, Some(p.id)).await.unwrap();
    assert_eq!(moved.parent_id, Some(p.id));

    let tree = app.service.tree();
    let mut expected = ids(&tree.ancestors(p.id).await.unwrap());
    expected.push(p.id);
    assert_eq!(ids(&tree.ancestors(f.id).await.unwrap()), expected);

    let back = app.move_to(f.id, None).await.unwrap();
    assert!(back.is_root());
    assert!(tree.ancestors(f.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_moves_never_create_cycles() {
    let app = TestApp::new();
    let mut folders = Vec::new();
    for name in ["A", "B", "C", "D", "E", "F"] {
        folders.push(app.create(name, None).await.id);
    }

    // Attempt every ordered pair; some succeed, some are rejected as cycles.
    for &from in &folders {
        for &to in &folders {
            let _ = app.move_to(from, Some(to)).await;
            for &id in &folders {
                let chain = app.service.tree().ancestors(id).await.unwrap();
                assert!(!ids(&chain).contains(&id));
            }
        }
    }
}

#[tokio::test]
async fn test_move_to_same_parent_is_noop() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    let b = app.create("B", Some(a.id)).await;

    let same = app.move_to(b.id, Some(a.id)).await.unwrap();
    assert_eq!(same.updated_at, b.updated_at);
}

#[tokio::test]
async fn test_delete_guarded_by_children() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    let b = app.create("B", Some(a.id)).await;

    let err = app.service.delete(&app.ctx, a.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    let details = err.details.expect("conflict details");
    assert_eq!(details["children"], 1);
    assert_eq!(details["media"], 0);
    assert_eq!(details["reasons"], serde_json::json!(["children"]));

    app.service.delete(&app.ctx, b.id).await.unwrap();
    app.service.delete(&app.ctx, a.id).await.unwrap();
    assert_eq!(app.repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_guarded_by_media() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    app.repo.attach_media(a.id, MediaId(1)).await.unwrap();

    let err = app.service.delete(&app.ctx, a.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(
        err.details.expect("conflict details")["reasons"],
        serde_json::json!(["media"])
    );

    app.repo.detach_media(a.id, MediaId(1)).await;
    app.service.delete(&app.ctx, a.id).await.unwrap();
}

#[tokio::test]
async fn test_delete_reports_both_conditions() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    app.create("B", Some(a.id)).await;
    app.repo.attach_media(a.id, MediaId(5)).await.unwrap();

    let err = app.service.delete(&app.ctx, a.id).await.unwrap_err();
    assert_eq!(
        err.details.expect("conflict details")["reasons"],
        serde_json::json!(["children", "media"])
    );
}

#[tokio::test]
async fn test_delete_checks_direct_children_only() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    let b = app.create("B", Some(a.id)).await;
    app.repo.attach_media(b.id, MediaId(3)).await.unwrap();

    // Media inside B does not count towards A's own media.
    let err = app.service.delete(&app.ctx, a.id).await.unwrap_err();
    assert_eq!(err.details.expect("details")["media"], 0);
}

#[tokio::test]
async fn test_delete_unknown_folder() {
    let app = TestApp::new();
    let err = app.service.delete(&app.ctx, FolderId(1)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_ancestors_and_full_path() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    let b = app.create("B", Some(a.id)).await;
    let c = app.create("C", Some(b.id)).await;

    let tree = app.service.tree();
    assert_eq!(ids(&tree.ancestors(c.id).await.unwrap()), vec![a.id, b.id]);
    assert!(tree.ancestors(a.id).await.unwrap().is_empty());

    assert_eq!(tree.full_path(c.id).await.unwrap(), "A/B/C");
    assert_eq!(tree.full_path(a.id).await.unwrap(), "A");
    assert_eq!(
        tree.full_path(c.id).await.unwrap(),
        format!("{}/{}", tree.full_path(b.id).await.unwrap(), c.name)
    );
}

#[tokio::test]
async fn test_descendants_breadth_first() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    let b = app.create("B", Some(a.id)).await;
    let c = app.create("C", Some(a.id)).await;
    let d = app.create("D", Some(b.id)).await;

    let tree = app.service.tree();
    assert_eq!(
        ids(&tree.descendants(a.id).await.unwrap()),
        vec![b.id, c.id, d.id]
    );
    assert!(tree.descendants(d.id).await.unwrap().is_empty());
    assert_eq!(
        tree.descendants(FolderId(50)).await.unwrap_err().kind,
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_corrupted_chain_is_integrity_error() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    let b = app.create("B", Some(a.id)).await;
    let c = app.create("C", None).await;

    // A <-> B loop written behind the service's back.
    app.repo.force_parent(a.id, Some(b.id)).await.unwrap();

    let tree = app.service.tree();
    assert_eq!(
        tree.ancestors(b.id).await.unwrap_err().kind,
        ErrorKind::Integrity
    );
    assert_eq!(
        tree.descendants(a.id).await.unwrap_err().kind,
        ErrorKind::Integrity
    );

    // Moving an unrelated folder under the loop must terminate.
    assert_eq!(
        app.move_to(c.id, Some(a.id)).await,
        Err(ErrorKind::Integrity)
    );
    // Moving a member of the loop is caught as a cycle first.
    assert_eq!(app.move_to(a.id, Some(b.id)).await, Err(ErrorKind::Cycle));
}

#[tokio::test]
async fn test_tree_and_forest() {
    let app = TestApp::new();
    let a = app.create("A", None).await;
    let b = app.create("B", Some(a.id)).await;
    app.create("C", Some(b.id)).await;
    app.create("Z", None).await;
    app.repo.attach_media(b.id, MediaId(1)).await.unwrap();
    app.repo.attach_media(b.id, MediaId(2)).await.unwrap();

    let tree = app.service.tree();
    let node = tree.tree(a.id).await.unwrap();
    assert_eq!(node.child_count, 1);
    assert_eq!(node.size(), 3);
    let b_node = &node.children[0];
    assert_eq!(b_node.slug, "b");
    assert_eq!(b_node.depth, 1);
    assert_eq!(b_node.media_count, 2);
    assert_eq!(b_node.children[0].depth, 2);

    let forest = tree.forest().await.unwrap();
    assert_eq!(forest.roots.len(), 2);
    assert_eq!(forest.total_folders, 4);
}

#[tokio::test]
async fn test_lookup_by_slug_and_children() {
    let app = TestApp::new();
    let a = app.create("Team Photos", None).await;
    let b = app.create("Offsite", Some(a.id)).await;

    let found = app.service.get_by_slug("team-photos").await.unwrap();
    assert_eq!(found.id, a.id);
    assert_eq!(
        app.service.get_by_slug("missing").await.unwrap_err().kind,
        ErrorKind::NotFound
    );
    assert_eq!(ids(&app.service.children(a.id).await.unwrap()), vec![b.id]);
    assert_eq!(ids(&app.service.roots().await.unwrap()), vec![a.id]);
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_slugs() {
    let app = TestApp::new();
    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = app.service.clone();
        let ctx = app.ctx.clone();
        handles.push(tokio::spawn(async move {
            service
                .create(
                    &ctx,
                    CreateFolderRequest {
                        name: "Uploads".to_string(),
                        description: None,
                        parent_id: None,
                    },
                )
                .await
        }));
    }

    let mut slugs = Vec::new();
    for handle in handles {
        slugs.push(handle.await.unwrap().unwrap().slug);
    }
    slugs.sort();
    slugs.dedup();
    assert_eq!(slugs.len(), 8);
}

/// Delegates to a shared memory repository, pausing after every lookup so
/// that unsynchronized check-then-write sequences would interleave.
#[derive(Debug, Clone)]
struct SlowRepository {
    inner: MemoryFolderRepository,
}

#[async_trait::async_trait]
impl FolderRepository for SlowRepository {
    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        let found = self.inner.find_by_id(id).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        found
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Folder>> {
        self.inner.find_by_slug(slug).await
    }

    async fn find_children(&self, parent_id: Option<FolderId>) -> AppResult<Vec<Folder>> {
        self.inner.find_children(parent_id).await
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<FolderId>) -> AppResult<bool> {
        let exists = self.inner.slug_exists(slug, exclude).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        exists
    }

    async fn insert(&self, data: &NewFolder) -> AppResult<Folder> {
        self.inner.insert(data).await
    }

    async fn update(&self, id: FolderId, changes: &FolderChanges) -> AppResult<Folder> {
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: FolderId) -> AppResult<bool> {
        self.inner.delete(id).await
    }

    async fn count_children(&self, id: FolderId) -> AppResult<u64> {
        self.inner.count_children(id).await
    }

    async fn count_media(&self, id: FolderId) -> AppResult<u64> {
        self.inner.count_media(id).await
    }

    async fn count(&self) -> AppResult<u64> {
        self.inner.count().await
    }

    async fn lock_tree(&self) -> AppResult<TreeLock> {
        self.inner.lock_tree().await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_services_sharing_a_repository_cannot_form_a_cycle() {
    let shared = MemoryFolderRepository::new();
    let first = FolderService::new(Arc::new(SlowRepository {
        inner: shared.clone(),
    }));
    let second = FolderService::new(Arc::new(SlowRepository {
        inner: shared.clone(),
    }));
    let ctx = RequestContext::new(UserId(1));

    let a = first
        .create(&ctx, CreateFolderRequest { name: "A".into(), description: None, parent_id: None })
        .await
        .unwrap();
    let b = first
        .create(&ctx, CreateFolderRequest { name: "B".into(), description: None, parent_id: None })
        .await
        .unwrap();

    let a_under_b = {
        let (service, ctx) = (first.clone(), ctx.clone());
        tokio::spawn(async move {
            service
                .move_folder(&ctx, a.id, MoveFolderRequest { new_parent_id: Some(b.id) })
                .await
        })
    };
    let b_under_a = {
        let (service, ctx) = (second.clone(), ctx.clone());
        tokio::spawn(async move {
            service
                .move_folder(&ctx, b.id, MoveFolderRequest { new_parent_id: Some(a.id) })
                .await
        })
    };

    let results = [a_under_b.await.unwrap(), b_under_a.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    let failed = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(failed.kind, ErrorKind::Cycle);

    assert!(second.tree().ancestors(a.id).await.is_ok());
    assert!(second.tree().ancestors(b.id).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_services_sharing_a_repository_get_distinct_slugs() {
    let shared = MemoryFolderRepository::new();
    let ctx = RequestContext::new(UserId(1));

    let mut handles = Vec::new();
    for _ in 0..2 {
        for _ in 0..3 {
            let service = FolderService::new(Arc::new(SlowRepository {
                inner: shared.clone(),
            }));
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                service
                    .create(
                        &ctx,
                        CreateFolderRequest { name: "Clips".into(), description: None, parent_id: None },
                    )
                    .await
            }));
        }
    }

    let mut slugs = Vec::new();
    for handle in handles {
        slugs.push(handle.await.unwrap().unwrap().slug);
    }
    slugs.sort();
    assert_eq!(
        slugs,
        ["clips", "clips-1", "clips-2", "clips-3", "clips-4", "clips-5"]
    );
}
