//! Interned message identity.

/// Interned message key.
///
/// Within a catalog the pair (context, source) identifies a message; a
/// disambiguation comment is carried as metadata but does not split
/// identity.
#[salsa::interned]
pub struct MessageKey {
    /// Context name, e.g. `SvgWB` or `Preferences`.
    #[returns(ref)]
    pub context: String,

    /// Canonical source string.
    #[returns(ref)]
    pub source: String,
}
