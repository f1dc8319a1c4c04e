//! Typed mirror of PDF objects captured into the atom store.
//!
//! Values are captured shallowly: indirect references stay references and are
//! never chased, so a captured value can never contain a cycle.

use std::collections::BTreeMap;
use std::fmt;

use lopdf::{Dictionary, Object, ObjectId, StringFormat};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A captured PDF dictionary, keyed by name without the leading slash.
pub type AtomDict = BTreeMap<String, AtomValue>;

/// Indirect object reference (`12 0 R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    /// Object number
    pub number: u32,
    /// Generation number
    pub generation: u16,
}

impl ObjectRef {
    /// Create a reference from its object and generation numbers.
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    /// Convert back into a lopdf object id.
    pub fn id(&self) -> ObjectId {
        (self.number, self.generation)
    }
}

impl From<ObjectId> for ObjectRef {
    fn from(id: ObjectId) -> Self {
        Self::new(id.0, id.1)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

impl Serialize for ObjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A PDF object value.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomValue {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Integer number
    Integer(i64),
    /// Real number
    Real(f32),
    /// Name object, stored without the leading slash
    Name(String),
    /// String object, raw bytes as stored in the file
    String(Vec<u8>),
    /// Array of values
    Array(Vec<AtomValue>),
    /// Dictionary
    Dictionary(AtomDict),
    /// Indirect reference
    Reference(ObjectRef),
    /// Stream: its dictionary and the length of its (undecoded) content
    Stream {
        /// Stream dictionary
        dict: AtomDict,
        /// Byte length of the stored stream data
        length: usize,
    },
}

impl AtomValue {
    /// Get the referenced object, if this is a reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            AtomValue::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Get the name, if this is a name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            AtomValue::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Get the dictionary, if this is a dictionary or a stream.
    pub fn as_dict(&self) -> Option<&AtomDict> {
        match self {
            AtomValue::Dictionary(d) | AtomValue::Stream { dict: d, .. } => Some(d),
            _ => None,
        }
    }

    /// Get the decoded text of a string value.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AtomValue::String(bytes) => Some(decode_pdf_string(bytes)),
            _ => None,
        }
    }

    /// Convert into a lopdf object.
    ///
    /// Streams come back with their dictionary and empty data, since stream
    /// content is not retained in the store.
    pub fn to_object(&self) -> Object {
        match self {
            AtomValue::Null => Object::Null,
            AtomValue::Boolean(b) => Object::Boolean(*b),
            AtomValue::Integer(i) => Object::Integer(*i),
            AtomValue::Real(r) => Object::Real(*r),
            AtomValue::Name(n) => Object::Name(n.as_bytes().to_vec()),
            AtomValue::String(bytes) => Object::String(bytes.clone(), StringFormat::Literal),
            AtomValue::Array(items) => Object::Array(items.iter().map(Self::to_object).collect()),
            AtomValue::Dictionary(dict) => Object::Dictionary(dict_to_lopdf(dict)),
            AtomValue::Reference(r) => Object::Reference(r.id()),
            AtomValue::Stream { dict, .. } => {
                Object::Stream(lopdf::Stream::new(dict_to_lopdf(dict), Vec::new()))
            }
        }
    }
}

impl From<&Object> for AtomValue {
    fn from(obj: &Object) -> Self {
        match obj {
            Object::Null => AtomValue::Null,
            Object::Boolean(b) => AtomValue::Boolean(*b),
            Object::Integer(i) => AtomValue::Integer(*i),
            Object::Real(r) => AtomValue::Real(*r),
            Object::Name(n) => AtomValue::Name(String::from_utf8_lossy(n).into_owned()),
            Object::String(bytes, _) => AtomValue::String(bytes.clone()),
            Object::Array(items) => AtomValue::Array(items.iter().map(AtomValue::from).collect()),
            Object::Dictionary(dict) => AtomValue::Dictionary(dict_from_lopdf(dict)),
            Object::Stream(stream) => AtomValue::Stream {
                dict: dict_from_lopdf(&stream.dict),
                length: stream.content.len(),
            },
            Object::Reference(id) => AtomValue::Reference(ObjectRef::from(*id)),
        }
    }
}

/// Capture a lopdf dictionary.
pub fn dict_from_lopdf(dict: &Dictionary) -> AtomDict {
    dict.iter()
        .map(|(key, value)| (String::from_utf8_lossy(key).into_owned(), AtomValue::from(value)))
        .collect()
}

/// Rebuild a lopdf dictionary from a captured one.
pub fn dict_to_lopdf(dict: &AtomDict) -> Dictionary {
    let mut out = Dictionary::new();
    for (key, value) in dict {
        out.set(key.as_bytes().to_vec(), value.to_object());
    }
    out
}

/// Serialized with the string-representation policy: references become
/// `"12 0 R"`, names `"/Name"`, strings their decoded text.
impl Serialize for AtomValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AtomValue::Null => serializer.serialize_unit(),
            AtomValue::Boolean(b) => serializer.serialize_bool(*b),
            AtomValue::Integer(i) => serializer.serialize_i64(*i),
            AtomValue::Real(r) => serializer.serialize_f32(*r),
            AtomValue::Name(n) => serializer.collect_str(&format_args!("/{}", n)),
            AtomValue::String(bytes) => serializer.serialize_str(&decode_pdf_string(bytes)),
            AtomValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            AtomValue::Dictionary(dict) => dict.serialize(serializer),
            AtomValue::Reference(r) => r.serialize(serializer),
            AtomValue::Stream { dict, length } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("dict", dict)?;
                map.serialize_entry("length", length)?;
                map.end()
            }
        }
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, then UTF-8, then Latin-1.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_object_ref_display() {
        assert_eq!(ObjectRef::new(12, 0).to_string(), "12 0 R");
        assert_eq!(ObjectRef::from((7, 2)).id(), (7, 2));
    }

    #[test]
    fn test_capture_keeps_references_shallow() {
        let dict = dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference((2, 0)),
        };
        let captured = dict_from_lopdf(&dict);
        assert_eq!(captured["Type"], AtomValue::Name("Catalog".to_string()));
        assert_eq!(
            captured["Pages"].as_reference(),
            Some(ObjectRef::new(2, 0))
        );
    }

    #[test]
    fn test_json_string_representation() {
        let mut dict = AtomDict::new();
        dict.insert("Root".into(), AtomValue::Reference(ObjectRef::new(1, 0)));
        dict.insert("Type".into(), AtomValue::Name("XRef".into()));
        dict.insert("Title".into(), AtomValue::String(b"Offer".to_vec()));
        dict.insert(
            "Box".into(),
            AtomValue::Array(vec![AtomValue::Integer(0), AtomValue::Real(1.5)]),
        );

        let json = serde_json::to_value(AtomValue::Dictionary(dict)).unwrap();
        assert_eq!(json["Root"], "1 0 R");
        assert_eq!(json["Type"], "/XRef");
        assert_eq!(json["Title"], "Offer");
        assert_eq!(json["Box"][0], 0);
        assert_eq!(json["Box"][1], 1.5);
    }

    #[test]
    fn test_stream_serializes_dict_and_length() {
        let stream = lopdf::Stream::new(dictionary! { "Subtype" => "Image" }, vec![0u8; 16]);
        let value = AtomValue::from(&Object::Stream(stream));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["length"], 16);
        assert_eq!(json["dict"]["Subtype"], "/Image");
    }

    #[test]
    fn test_to_object_restores_trailer_entries() {
        let original = dictionary! {
            "Root" => Object::Reference((1, 0)),
            "Size" => Object::Integer(9),
            "ID" => vec![Object::String(b"abc".to_vec(), StringFormat::Hexadecimal)],
        };
        let restored = dict_to_lopdf(&dict_from_lopdf(&original));
        assert_eq!(restored.get(b"Root").unwrap().as_reference().unwrap(), (1, 0));
        assert_eq!(restored.get(b"Size").unwrap().as_i64().unwrap(), 9);
        assert!(restored.get(b"ID").unwrap().as_array().is_ok());
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string(b"Hello"), "Hello");
        assert_eq!(decode_pdf_string(&[0x48, 0x65, 0x6C, 0x6C, 0xE9]), "Hellé");
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]), "Hi");
    }
}
