//! Document-level structure: catalog, name trees, forms, signatures,
//! encryption and the raw object dump.

use std::collections::{BTreeMap, HashSet};

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::images::sha256_hex;
use super::objects::{
    get_array, get_dict, get_resolved, name_string, name_tree_entries, resolve, resolve_dict,
    stream_content, text_string,
};
use crate::model::{
    dict_from_lopdf, AcroFormAtoms, AtomDict, AtomValue, FormField, ObjectRef, RawObject,
    SignatureField, XrefAtoms, XrefKind,
};

/// Field trees deeper than this are not descended.
const MAX_FIELD_DEPTH: usize = 32;

/// The document catalog: the reader's accessor first, then the trailer's `/Root`.
pub fn catalog(doc: &LopdfDocument) -> Option<&Dictionary> {
    doc.catalog()
        .ok()
        .or_else(|| get_dict(doc, &doc.trailer, b"Root"))
}

/// Summarize the cross-reference section.
///
/// Derived from the trailer: a `/XRefStm` entry (hybrid file) or a trailer
/// that is itself an `/XRef` stream dictionary means a stream.
pub fn xref_summary(doc: &LopdfDocument) -> XrefAtoms {
    let is_stream = doc.trailer.has(b"XRefStm")
        || doc
            .trailer
            .get(b"Type")
            .ok()
            .and_then(name_string)
            .as_deref()
            == Some("XRef");

    XrefAtoms {
        kind: Some(if is_stream {
            XrefKind::Stream
        } else {
            XrefKind::Table
        }),
        size: Some(doc.objects.len()),
    }
}

fn names_tree<'a>(doc: &'a LopdfDocument, tree: &[u8]) -> Option<&'a Dictionary> {
    let names = get_dict(doc, catalog(doc)?, b"Names")?;
    get_dict(doc, names, tree)
}

/// Names of the embedded files in the `/EmbeddedFiles` name tree.
pub fn embedded_file_names(doc: &LopdfDocument) -> Vec<String> {
    names_tree(doc, b"EmbeddedFiles")
        .map(|tree| {
            name_tree_entries(doc, tree)
                .into_iter()
                .map(|(name, _)| name)
                .collect()
        })
        .unwrap_or_default()
}

/// JavaScript name-tree entries, name to script source.
///
/// Scripts are stored either as text strings or as streams. Entries
/// without a usable `/JS` are skipped; unnamed entries get `#<index>`.
pub fn javascript(doc: &LopdfDocument) -> BTreeMap<String, String> {
    let Some(tree) = names_tree(doc, b"JavaScript") else {
        return BTreeMap::new();
    };

    let mut scripts = BTreeMap::new();
    for (index, (name, action)) in name_tree_entries(doc, tree).into_iter().enumerate() {
        let Some(action) = resolve_dict(doc, action) else {
            continue;
        };
        let script = match get_resolved(doc, action, b"JS") {
            Some(js @ Object::String(..)) => text_string(js),
            Some(Object::Stream(stream)) => {
                Some(String::from_utf8_lossy(&stream_content(stream)).into_owned())
            }
            _ => None,
        };
        if let Some(script) = script {
            let key = if name.is_empty() {
                format!("#{}", index)
            } else {
                name
            };
            scripts.insert(key, script);
        }
    }
    scripts
}

/// A terminal field found while walking the AcroForm field tree.
struct FieldNode<'a> {
    name: String,
    field_type: Option<String>,
    object: Option<ObjectId>,
    dict: &'a Dictionary,
}

fn collect_fields<'a>(doc: &'a LopdfDocument) -> (Option<&'a Dictionary>, Vec<FieldNode<'a>>) {
    let Some(acroform) = catalog(doc).and_then(|c| get_dict(doc, c, b"AcroForm")) else {
        return (None, Vec::new());
    };

    let mut out = Vec::new();
    let mut visited = HashSet::new();
    if let Some(fields) = get_array(doc, acroform, b"Fields") {
        for field in fields {
            walk_field(doc, field, "", None, &mut visited, &mut out, 0);
        }
    }
    (Some(acroform), out)
}

fn walk_field<'a>(
    doc: &'a LopdfDocument,
    entry: &'a Object,
    parent_name: &str,
    parent_type: Option<&str>,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<FieldNode<'a>>,
    depth: usize,
) {
    if depth > MAX_FIELD_DEPTH {
        return;
    }
    let object = match entry {
        Object::Reference(id) => {
            if !visited.insert(*id) {
                return;
            }
            Some(*id)
        }
        _ => None,
    };
    let Some(dict) = resolve_dict(doc, entry) else {
        return;
    };

    let partial = get_resolved(doc, dict, b"T").and_then(text_string);
    let name = match (&partial, parent_name.is_empty()) {
        (Some(t), true) => t.clone(),
        (Some(t), false) => format!("{}.{}", parent_name, t),
        (None, _) => parent_name.to_string(),
    };
    let field_type = get_resolved(doc, dict, b"FT")
        .and_then(name_string)
        .or_else(|| parent_type.map(str::to_string));

    // Kids without /T are widget annotations of this field, not child fields.
    let child_fields: Vec<&Object> = get_array(doc, dict, b"Kids")
        .map(|kids| {
            kids.iter()
                .filter(|kid| {
                    resolve_dict(doc, kid)
                        .map(|d| d.has(b"T"))
                        .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default();

    if child_fields.is_empty() {
        out.push(FieldNode {
            name,
            field_type,
            object,
            dict,
        });
        return;
    }

    for kid in child_fields {
        walk_field(doc, kid, &name, field_type.as_deref(), visited, out, depth + 1);
    }
}

/// Interactive form fields from the catalog's `/AcroForm`.
pub fn form_fields(doc: &LopdfDocument) -> AcroFormAtoms {
    let (acroform, fields) = collect_fields(doc);
    let Some(acroform) = acroform else {
        return AcroFormAtoms::default();
    };

    AcroFormAtoms {
        fields: fields
            .into_iter()
            .map(|node| FormField {
                value: node.dict.get(b"V").ok().map(AtomValue::from),
                name: node.name,
                field_type: node.field_type,
                object: node.object.map(ObjectRef::from),
            })
            .collect(),
        sig_flags: get_resolved(doc, acroform, b"SigFlags").and_then(|o| o.as_i64().ok()),
    }
}

/// Signed signature fields (`/FT /Sig` with a signature value).
pub fn signatures(doc: &LopdfDocument) -> Vec<SignatureField> {
    let (_, fields) = collect_fields(doc);

    fields
        .into_iter()
        .filter(|node| node.field_type.as_deref() == Some("Sig"))
        .filter_map(|node| {
            let value = get_dict(doc, node.dict, b"V")?;
            let text_of = |key: &[u8]| get_resolved(doc, value, key).and_then(text_string);
            let name_of = |key: &[u8]| get_resolved(doc, value, key).and_then(name_string);

            Some(SignatureField {
                name: node.name,
                object: node.object.map(ObjectRef::from),
                filter: name_of(b"Filter"),
                sub_filter: name_of(b"SubFilter"),
                signer: text_of(b"Name"),
                signed_at: text_of(b"M"),
                reason: text_of(b"Reason"),
                location: text_of(b"Location"),
                byte_range: get_array(doc, value, b"ByteRange")
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|o| resolve(doc, o).and_then(|o| o.as_i64().ok()))
                            .collect()
                    })
                    .unwrap_or_default(),
                contents_length: match get_resolved(doc, value, b"Contents") {
                    Some(Object::String(bytes, _)) => Some(bytes.len()),
                    _ => None,
                },
            })
        })
        .collect()
}

/// The encryption dictionary of an encrypted document.
///
/// lopdf decrypts documents that open with the empty user password while
/// loading and drops `/Encrypt` from the trailer; the dictionary is then
/// re-encoded from the retained encryption state.
pub fn encryption(doc: &LopdfDocument) -> Option<AtomDict> {
    if let Some(dict) = get_dict(doc, &doc.trailer, b"Encrypt") {
        return Some(dict_from_lopdf(dict));
    }
    let state = doc.encryption_state.as_ref()?;
    match state.encode() {
        Ok(dict) => Some(dict_from_lopdf(&dict)),
        Err(e) => {
            log::warn!("Cannot encode encryption state: {}", e);
            None
        }
    }
}

/// Kind name of an object, as recorded in the raw dump.
pub fn object_kind(obj: &Object) -> &'static str {
    match obj {
        Object::Null => "null",
        Object::Boolean(_) => "boolean",
        Object::Integer(_) => "integer",
        Object::Real(_) => "real",
        Object::Name(_) => "name",
        Object::String(..) => "string",
        Object::Array(_) => "array",
        Object::Dictionary(_) => "dictionary",
        Object::Stream(_) => "stream",
        Object::Reference(_) => "reference",
    }
}

/// Dump every object as kind plus, for streams, stored length and digest.
pub fn raw_objects(doc: &LopdfDocument) -> BTreeMap<String, RawObject> {
    doc.objects
        .iter()
        .map(|(&(number, generation), obj)| {
            let (length, sha) = match obj {
                Object::Stream(stream) => {
                    (Some(stream.content.len()), Some(sha256_hex(&stream.content)))
                }
                _ => (None, None),
            };
            (
                format!("{} {}", number, generation),
                RawObject {
                    kind: object_kind(obj),
                    length,
                    sha,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream, StringFormat};

    fn doc_with_catalog(catalog: Dictionary) -> LopdfDocument {
        let mut doc = LopdfDocument::with_version("1.7");
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_xref_summary_table_and_stream() {
        let mut doc = doc_with_catalog(dictionary! { "Type" => "Catalog" });
        let summary = xref_summary(&doc);
        assert_eq!(summary.kind, Some(XrefKind::Table));
        assert_eq!(summary.size, Some(1));

        doc.trailer.set("XRefStm", 1234);
        assert_eq!(xref_summary(&doc).kind, Some(XrefKind::Stream));
    }

    #[test]
    fn test_embedded_file_names() {
        let doc = doc_with_catalog(dictionary! {
            "Type" => "Catalog",
            "Names" => dictionary! {
                "EmbeddedFiles" => dictionary! {
                    "Names" => vec![
                        Object::string_literal("invoice.xml"),
                        Object::Dictionary(dictionary! { "Type" => "Filespec" }),
                    ],
                },
            },
        });
        assert_eq!(embedded_file_names(&doc), vec!["invoice.xml"]);
    }

    #[test]
    fn test_javascript_string_and_stream() {
        let mut doc = LopdfDocument::with_version("1.7");
        let script_stream = doc.add_object(Stream::new(dictionary! {}, b"app.beep(0);".to_vec()));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Names" => dictionary! {
                "JavaScript" => dictionary! {
                    "Names" => vec![
                        Object::string_literal("init"),
                        Object::Dictionary(dictionary! {
                            "S" => "JavaScript",
                            "JS" => Object::string_literal("app.alert('hi');"),
                        }),
                        Object::string_literal("beep"),
                        Object::Dictionary(dictionary! {
                            "S" => "JavaScript",
                            "JS" => script_stream,
                        }),
                    ],
                },
            },
        });
        doc.trailer.set("Root", catalog_id);

        let js = javascript(&doc);
        assert_eq!(js["init"], "app.alert('hi');");
        assert_eq!(js["beep"], "app.beep(0);");
    }

    #[test]
    fn test_missing_structures_are_empty() {
        let doc = doc_with_catalog(dictionary! { "Type" => "Catalog" });
        assert!(embedded_file_names(&doc).is_empty());
        assert!(javascript(&doc).is_empty());
        assert!(signatures(&doc).is_empty());
        assert_eq!(form_fields(&doc), AcroFormAtoms::default());
        assert!(encryption(&doc).is_none());
    }

    #[test]
    fn test_form_fields_and_signatures() {
        let mut doc = LopdfDocument::with_version("1.7");
        let sig_value = doc.add_object(dictionary! {
            "Type" => "Sig",
            "Filter" => "Adobe.PPKLite",
            "SubFilter" => "adbe.pkcs7.detached",
            "Name" => Object::string_literal("Erika Mustermann"),
            "M" => Object::string_literal("D:20240101120000Z"),
            "ByteRange" => vec![0.into(), 100.into(), 200.into(), 50.into()],
            "Contents" => Object::String(vec![0u8; 64], StringFormat::Hexadecimal),
        });
        let sig_field = doc.add_object(dictionary! {
            "FT" => "Sig",
            "T" => Object::string_literal("approval"),
            "V" => sig_value,
        });
        let unsigned = doc.add_object(dictionary! {
            "FT" => "Sig",
            "T" => Object::string_literal("pending"),
        });
        let name_field = doc.add_object(dictionary! {
            "T" => Object::string_literal("name"),
            "V" => Object::string_literal("Max"),
        });
        let parent = doc.add_object(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("customer"),
            "Kids" => vec![name_field.into()],
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "AcroForm" => dictionary! {
                "Fields" => vec![parent.into(), sig_field.into(), unsigned.into()],
                "SigFlags" => 3,
            },
        });
        doc.trailer.set("Root", catalog_id);

        let form = form_fields(&doc);
        let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["customer.name", "approval", "pending"]);
        assert_eq!(form.fields[0].field_type.as_deref(), Some("Tx"));
        assert_eq!(form.sig_flags, Some(3));

        let sigs = signatures(&doc);
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].name, "approval");
        assert_eq!(sigs[0].object, Some(ObjectRef::from(sig_field)));
        assert_eq!(sigs[0].sub_filter.as_deref(), Some("adbe.pkcs7.detached"));
        assert_eq!(sigs[0].signer.as_deref(), Some("Erika Mustermann"));
        assert_eq!(sigs[0].byte_range, vec![0, 100, 200, 50]);
        assert_eq!(sigs[0].contents_length, Some(64));
    }

    #[test]
    fn test_raw_objects_record_streams() {
        let mut doc = LopdfDocument::with_version("1.7");
        let id = doc.add_object(Stream::new(dictionary! {}, b"data".to_vec()));
        doc.add_object(dictionary! { "Type" => "Catalog" });

        let raw = raw_objects(&doc);
        let entry = &raw[&format!("{} 0", id.0)];
        assert_eq!(entry.kind, "stream");
        assert_eq!(entry.length, Some(4));
        assert_eq!(entry.sha.as_deref(), Some(sha256_hex(b"data").as_str()));
        assert_eq!(raw.len(), 2);
    }
}
