//! Source file input definitions.

use std::path::Path;

#[salsa::input]
pub struct SourceFile {
    /// Document URI as received from the client.
    #[returns(ref)]
    pub uri: String,

    /// Full text of the file.
    #[returns(ref)]
    pub text: String,

    /// Language of the file.
    pub language: ProgrammingLanguage,
}

/// Supported source languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgrammingLanguage {
    /// Python, the language Qt-based FreeCAD add-ons are written in.
    Python,
}

impl ProgrammingLanguage {
    /// Infers the language from a file extension.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        let file_path = Path::new(uri);
        match file_path.extension().and_then(|ext| ext.to_str()) {
            Some("py" | "pyi") => Some(Self::Python),
            _ => None,
        }
    }

    /// The tree-sitter grammar for this language.
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Self::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }
}
