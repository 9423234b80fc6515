//! Salsa database definition.

/// Database trait for the translation LSP.
#[salsa::db]
pub trait TrDatabase: salsa::Database {}

/// Concrete database implementation.
#[salsa::db]
#[derive(Clone, Default)]
pub struct TrDatabaseImpl {
    /// Salsa storage.
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for TrDatabaseImpl {}

#[salsa::db]
impl TrDatabase for TrDatabaseImpl {}
