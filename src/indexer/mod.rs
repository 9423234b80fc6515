//! Workspace indexing: file discovery and input loading.

pub mod types;
pub mod workspace;

pub use workspace::WorkspaceIndexer;
