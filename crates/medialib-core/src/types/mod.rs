//! Core type definitions used across the MediaLib workspace.

pub mod id;

pub use id::*;
