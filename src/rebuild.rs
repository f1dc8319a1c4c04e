//! Partial PDF rebuild from the atom store.
//!
//! The output carries the source header version, the trailer minus its
//! volatile entries and the catalog at its original object id. The page tree
//! is emptied so the result is a loadable PDF without page content.

use std::path::Path;

use lopdf::{dictionary, Document as LopdfDocument, Object};

use crate::error::{Error, Result};
use crate::model::{dict_to_lopdf, AtomDocument, AtomValue};
use crate::output::write_atomic;

/// Trailer entries dropped on rebuild.
///
/// `Prev` and `XRefStm` are byte offsets into the source file; `Encrypt`
/// is dropped because the output is not re-encrypted.
pub const VOLATILE_TRAILER_KEYS: [&str; 3] = ["Prev", "XRefStm", "Encrypt"];

const DEFAULT_VERSION: &str = "1.7";

/// Build the partial document in memory.
pub fn rebuild_document(atoms: &AtomDocument) -> Result<LopdfDocument> {
    let root = atoms
        .root_ref()
        .ok_or_else(|| Error::Rebuild("trailer has no /Root reference".to_string()))?;
    if atoms.catalog.is_empty() {
        return Err(Error::Rebuild("catalog atoms are empty".to_string()));
    }

    let version = atoms
        .header
        .version
        .clone()
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());
    let mut doc = LopdfDocument::with_version(version);

    for (key, value) in &atoms.trailer {
        if VOLATILE_TRAILER_KEYS.contains(&key.as_str()) {
            continue;
        }
        doc.trailer.set(key.as_bytes().to_vec(), value.to_object());
    }

    let mut catalog = dict_to_lopdf(&atoms.catalog);
    doc.max_id = root.number;
    let pages_id = match atoms.catalog.get("Pages").and_then(AtomValue::as_reference) {
        Some(pages) if pages != root => pages.id(),
        _ => {
            let id = doc.new_object_id();
            catalog.set("Pages", id);
            id
        }
    };
    doc.max_id = doc.max_id.max(pages_id.0);

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        }),
    );
    doc.objects.insert(root.id(), Object::Dictionary(catalog));

    log::debug!(
        "Rebuilt catalog at {} with {} trailer entries",
        root,
        doc.trailer.len()
    );
    Ok(doc)
}

/// Rebuild a partial PDF and write it to `dst`.
///
/// The file is written through a temporary file in the destination
/// directory; nothing is left behind when any step fails.
pub fn rebuild<P: AsRef<Path>>(atoms: &AtomDocument, dst: P) -> Result<()> {
    let mut doc = rebuild_document(atoms)?;
    write_atomic(dst.as_ref(), |mut w| {
        doc.save_to(&mut w)?;
        Ok(())
    })
}
