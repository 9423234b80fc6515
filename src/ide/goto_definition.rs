//! Go to Definition implementation.

use tower_lsp::lsp_types::Location;

use crate::db::TrDatabase;
use crate::input::catalog::Catalog;
use crate::interned::MessageKey;

/// Finds the catalog definitions of a message.
///
/// # Returns
/// One location per catalog that defines the message, pointing at the
/// `<source>` element.
pub fn find_definitions(
    db: &dyn TrDatabase,
    key: MessageKey<'_>,
    catalogs: &[Catalog],
) -> Vec<Location> {
    let id = (key.context(db).clone(), key.source(db).clone());
    let mut locations = Vec::new();

    for catalog in catalogs {
        let source_ranges = catalog.source_ranges(db);

        if let Some(range) = source_ranges.get(&id) {
            let file_path = catalog.file_path(db);
            let Ok(uri) = tower_lsp::lsp_types::Url::from_file_path(file_path) else {
                tracing::warn!("Failed to create URI from file path: {}", file_path);
                continue;
            };

            locations.push(Location { uri, range: (*range).into() });
        }
    }

    locations
}
