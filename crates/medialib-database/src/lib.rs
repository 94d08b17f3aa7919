//! # medialib-database
//!
//! PostgreSQL connection management, migrations, and the folder
//! repository: the [`FolderRepository`] trait plus a PostgreSQL and an
//! in-memory implementation.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{FolderRepository, MemoryFolderRepository, PgFolderRepository, TreeLock};
