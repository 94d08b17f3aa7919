//! # medialib-service
//!
//! Business logic for the media library folder hierarchy. Services are
//! built from a [`FolderRepository`](medialib_database::FolderRepository)
//! and take an already-authorized [`RequestContext`]; permission checks
//! happen before a call reaches this crate.

pub mod context;
pub mod folder;

pub use context::RequestContext;
pub use folder::{
    CreateFolderRequest, FolderService, MoveFolderRequest, TreeService, UpdateFolderRequest,
};
