//! Tree-sitter based extraction of translation calls.

pub mod extractor;
pub mod query_loader;
pub mod types;
