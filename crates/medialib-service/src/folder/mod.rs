//! Folder management and tree services.

pub mod service;
pub mod slug;
pub mod tree;

pub use service::{CreateFolderRequest, FolderService, MoveFolderRequest, UpdateFolderRequest};
pub use tree::TreeService;
