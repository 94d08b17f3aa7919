//! Folder domain entities.

pub mod model;
pub mod tree;

pub use model::{Folder, FolderChanges, NewFolder};
pub use tree::{FolderNode, FolderTree};
