//! Folder management CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use medialib_core::error::AppError;
use medialib_core::types::{FolderId, UserId};
use medialib_database::DatabasePool;
use medialib_entity::folder::{Folder, FolderNode};
use medialib_service::{
    CreateFolderRequest, FolderService, MoveFolderRequest, RequestContext, UpdateFolderRequest,
};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Acting user recorded as creator
    #[arg(short, long, default_value_t = 1)]
    pub user: i64,

    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List root folders, or the children of a folder
    List {
        /// Parent folder ID
        #[arg(short, long)]
        parent: Option<FolderId>,
    },
    /// Create a new folder
    Create {
        /// Folder name
        #[arg(short, long)]
        name: String,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Parent folder ID (omit for root)
        #[arg(short, long)]
        parent: Option<FolderId>,
    },
    /// Rename a folder or change its description
    Rename {
        /// Folder ID
        id: FolderId,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Move a folder under another folder (omit --parent to move to the root)
    Move {
        /// Folder ID
        id: FolderId,
        /// New parent folder ID
        #[arg(short, long)]
        parent: Option<FolderId>,
    },
    /// Delete an empty folder
    Delete {
        /// Folder ID
        id: FolderId,
    },
    /// Show the ancestor chain, root first
    Ancestors {
        /// Folder ID
        id: FolderId,
    },
    /// Show every folder below a folder
    Descendants {
        /// Folder ID
        id: FolderId,
    },
    /// Print the full slash-separated path of a folder
    Path {
        /// Folder ID
        id: FolderId,
    },
    /// Show the folder tree below a folder, or the whole forest
    Tree {
        /// Folder ID
        id: Option<FolderId>,
    },
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
struct FolderRow {
    /// Folder ID
    id: i64,
    /// Name
    name: String,
    /// Slug
    slug: String,
    /// Parent
    parent: String,
    /// Created by
    created_by: i64,
    /// Created at
    created_at: String,
}

impl From<&Folder> for FolderRow {
    fn from(f: &Folder) -> Self {
        Self {
            id: f.id.get(),
            name: f.name.clone(),
            slug: f.slug.clone(),
            parent: f
                .parent_id
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            created_by: f.created_by.get(),
            created_at: f.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

fn rows(folders: &[Folder]) -> Vec<FolderRow> {
    folders.iter().map(FolderRow::from).collect()
}

fn print_node(node: &FolderNode) {
    let indent = "  ".repeat(node.depth as usize);
    println!(
        "{}{}/ ({}, {} media)",
        indent, node.name, node.slug, node.media_count
    );
    for child in &node.children {
        print_node(child);
    }
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    pool: &DatabasePool,
    format: OutputFormat,
) -> Result<(), AppError> {
    let service = FolderService::new(Arc::new(pool.folders()));
    let ctx = RequestContext::new(UserId(args.user));

    match &args.command {
        FolderCommand::List { parent } => {
            let folders = match parent {
                Some(id) => service.children(*id).await?,
                None => service.roots().await?,
            };
            output::print_list(&rows(&folders), format);
        }
        FolderCommand::Create {
            name,
            description,
            parent,
        } => {
            let folder = service
                .create(
                    &ctx,
                    CreateFolderRequest {
                        name: name.clone(),
                        description: description.clone(),
                        parent_id: *parent,
                    },
                )
                .await?;
            output::print_item(&FolderRow::from(&folder), format);
        }
        FolderCommand::Rename {
            id,
            name,
            description,
        } => {
            let folder = service
                .rename(
                    &ctx,
                    *id,
                    UpdateFolderRequest {
                        name: name.clone(),
                        description: description.clone(),
                    },
                )
                .await?;
            output::print_item(&FolderRow::from(&folder), format);
        }
        FolderCommand::Move { id, parent } => {
            let folder = service
                .move_folder(
                    &ctx,
                    *id,
                    MoveFolderRequest {
                        new_parent_id: *parent,
                    },
                )
                .await?;
            output::print_item(&FolderRow::from(&folder), format);
        }
        FolderCommand::Delete { id } => {
            service.delete(&ctx, *id).await?;
            output::print_success(&format!("Folder {} deleted", id));
        }
        FolderCommand::Ancestors { id } => {
            let folders = service.tree().ancestors(*id).await?;
            output::print_list(&rows(&folders), format);
        }
        FolderCommand::Descendants { id } => {
            let folders = service.tree().descendants(*id).await?;
            output::print_list(&rows(&folders), format);
        }
        FolderCommand::Path { id } => {
            let path = service.tree().full_path(*id).await?;
            match format {
                OutputFormat::Table => println!("{}", path),
                OutputFormat::Json => println!("{}", serde_json::json!({ "id": id, "path": path })),
            }
        }
        FolderCommand::Tree { id } => match id {
            Some(id) => {
                let node = service.tree().tree(*id).await?;
                match format {
                    OutputFormat::Table => print_node(&node),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&node)?),
                }
            }
            None => {
                let forest = service.tree().forest().await?;
                match format {
                    OutputFormat::Table => {
                        forest.roots.iter().for_each(print_node);
                        println!("{} folders", forest.total_folders);
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&forest)?),
                }
            }
        },
    }

    Ok(())
}
