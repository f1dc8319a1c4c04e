//! JSON rendering of the atom store.

use std::path::Path;

use crate::error::Result;
use crate::model::AtomDocument;
use crate::output::write_atomic;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with two-space indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert the atom store to JSON.
///
/// Top-level keys follow the atom categories in declaration order; page keys
/// are zero-based indices.
pub fn to_json(atoms: &AtomDocument, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(atoms)?,
        JsonFormat::Compact => serde_json::to_string(atoms)?,
    };
    Ok(json)
}

/// Write the atom store as JSON to `path`, replacing it atomically.
pub fn write_json<P: AsRef<Path>>(atoms: &AtomDocument, path: P, format: JsonFormat) -> Result<()> {
    let json = to_json(atoms, format)?;
    write_atomic(path.as_ref(), |w| {
        w.write_all(json.as_bytes())?;
        w.write_all(b"\n")?;
        Ok(())
    })
}
