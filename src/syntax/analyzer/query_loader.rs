//! Load tree-sitter queries from files.

use std::sync::OnceLock;

use tree_sitter::Query;

use crate::input::source::ProgrammingLanguage;

/// A query file plus the function names it is allowed to match.
struct QueryFile {
    /// Embedded `.scm` content.
    content: &'static str,
    /// Short name for logging.
    name: &'static str,
    /// Function names this query is responsible for.
    functions: &'static [&'static str],
}

/// A compiled query with its function-name filter.
#[derive(Debug)]
pub struct LoadedQuery {
    /// Compiled tree-sitter query.
    pub query: Query,
    /// Function names accepted from this query's matches.
    pub functions: &'static [&'static str],
}

const PYTHON_QUERIES: &[QueryFile] = &[
    QueryFile {
        content: include_str!("../../../queries/python/qt-core.scm"),
        name: "qt-core",
        functions: &["translate", "QT_TRANSLATE_NOOP"],
    },
    QueryFile {
        content: include_str!("../../../queries/python/fcapi.scm"),
        name: "fcapi",
        functions: &["dtr"],
    },
];

static PYTHON_QUERY_CACHE: OnceLock<Vec<LoadedQuery>> = OnceLock::new();

fn parse_queries(language: ProgrammingLanguage) -> Vec<LoadedQuery> {
    let tree_sitter_lang = language.tree_sitter_language();

    let query_files = match language {
        ProgrammingLanguage::Python => PYTHON_QUERIES,
    };

    query_files
        .iter()
        .filter_map(|qf| {
            Query::new(&tree_sitter_lang, qf.content)
                .map_err(|e| tracing::error!("Failed to parse {} query: {e:?}", qf.name))
                .ok()
                .map(|query| LoadedQuery { query, functions: qf.functions })
        })
        .collect()
}

/// Loads cached queries for a language. Queries are parsed once per process.
#[must_use]
pub fn load_queries(language: ProgrammingLanguage) -> &'static [LoadedQuery] {
    match language {
        ProgrammingLanguage::Python => {
            PYTHON_QUERY_CACHE.get_or_init(|| parse_queries(ProgrammingLanguage::Python))
        }
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn all_query_files_compile() {
        let queries = load_queries(ProgrammingLanguage::Python);

        expect_that!(queries.len(), eq(PYTHON_QUERIES.len()));
    }
}
