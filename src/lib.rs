//! qt-i18n-language-server
//!
//! Language Server Protocol implementation for Python projects using the
//! Qt translation API with Qt Linguist `.ts` catalogs.

pub mod catalog;
pub mod config;
pub mod db;
pub mod ide;
pub mod indexer;
pub mod input;
pub mod interned;
pub mod ir;
pub mod syntax;
pub mod types;

mod test_utils;

pub use ide::backend::Backend;
