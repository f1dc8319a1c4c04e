//! Object-graph helpers over a loaded lopdf document.
//!
//! Everything here tolerates broken references: a dangling reference
//! resolves to `None` instead of failing the caller.

use std::collections::HashSet;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::model::decode_pdf_string;

/// Maximum number of reference hops followed before giving up.
const MAX_REFERENCE_DEPTH: usize = 32;

/// Maximum `/Parent` chain length walked for inherited page attributes.
const MAX_PARENT_DEPTH: usize = 64;

/// Maximum name-tree depth.
const MAX_TREE_DEPTH: usize = 32;

/// Follow indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_REFERENCE_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

/// Resolve an object to a dictionary. Streams yield their dictionary.
pub(crate) fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Look up a key and resolve its value.
pub(crate) fn get_resolved<'a>(
    doc: &'a LopdfDocument,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    resolve(doc, dict.get(key).ok()?)
}

/// Look up a key and resolve it to a dictionary.
pub(crate) fn get_dict<'a>(
    doc: &'a LopdfDocument,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    resolve_dict(doc, dict.get(key).ok()?)
}

/// Look up a key and resolve it to an array.
pub(crate) fn get_array<'a>(
    doc: &'a LopdfDocument,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Vec<Object>> {
    match get_resolved(doc, dict, key)? {
        Object::Array(items) => Some(items),
        _ => None,
    }
}

/// Find a page attribute, walking up the `/Parent` chain when the page
/// itself does not carry it (`Resources`, `MediaBox`, `CropBox`, `Rotate`).
pub(crate) fn inherited_attribute<'a>(
    doc: &'a LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }
        node = get_dict(doc, node, b"Parent")?;
    }
    None
}

/// Stream bytes with every supported filter removed.
///
/// Unfiltered streams and streams whose filters cannot be decoded yield
/// their stored bytes.
pub(crate) fn stream_content(stream: &Stream) -> Vec<u8> {
    if !stream.dict.has(b"Filter") {
        return stream.content.clone();
    }
    match stream.decompressed_content() {
        Ok(data) => data,
        Err(e) => {
            log::debug!("Keeping stored stream bytes, decode failed: {}", e);
            stream.content.clone()
        }
    }
}

/// Extract a number from an operand or dictionary value.
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Extract a name as a UTF-8 string.
pub(crate) fn name_string(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
        _ => None,
    }
}

/// Extract a text string, decoded.
pub(crate) fn text_string(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Read a rectangle (`[x0 y0 x1 y1]`), normalized so x0 <= x1 and y0 <= y1.
pub(crate) fn rectangle(doc: &LopdfDocument, obj: &Object) -> Option<[f32; 4]> {
    let items = match resolve(doc, obj)? {
        Object::Array(items) => items,
        _ => return None,
    };
    if items.len() != 4 {
        return None;
    }
    let mut values = [0.0f32; 4];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = get_number(resolve(doc, item)?)?;
    }
    let [a, b, c, d] = values;
    Some([a.min(c), b.min(d), a.max(c), b.max(d)])
}

/// Collect the leaf entries of a name tree in key order of the file.
///
/// Handles both `/Names` leaves and `/Kids` intermediate nodes; cycles in
/// `/Kids` are skipped.
pub(crate) fn name_tree_entries<'a>(
    doc: &'a LopdfDocument,
    root: &'a Dictionary,
) -> Vec<(String, &'a Object)> {
    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    collect_name_tree(doc, root, &mut entries, &mut visited, 0);
    entries
}

fn collect_name_tree<'a>(
    doc: &'a LopdfDocument,
    node: &'a Dictionary,
    entries: &mut Vec<(String, &'a Object)>,
    visited: &mut HashSet<ObjectId>,
    depth: usize,
) {
    if depth > MAX_TREE_DEPTH {
        return;
    }

    if let Some(names) = get_array(doc, node, b"Names") {
        for pair in names.chunks(2) {
            if let [key, value] = pair {
                let key = resolve(doc, key)
                    .and_then(text_string)
                    .unwrap_or_default();
                entries.push((key, value));
            }
        }
    }

    if let Some(kids) = get_array(doc, node, b"Kids") {
        for kid in kids {
            if let Object::Reference(id) = kid {
                if !visited.insert(*id) {
                    continue;
                }
            }
            if let Some(child) = resolve_dict(doc, kid) {
                collect_name_tree(doc, child, entries, visited, depth + 1);
            }
        }
    }
}
