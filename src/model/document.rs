//! Document-level atoms.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::page::PageAtoms;
use super::value::{AtomDict, AtomValue, ObjectRef};

/// Every atom extracted from one source PDF.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AtomDocument {
    /// Descriptive metadata about the extraction run
    pub meta: MetaAtoms,

    /// File header
    pub header: HeaderAtoms,

    /// Reserved for object-body atoms
    pub body: AtomDict,

    /// Cross-reference summary (derived, not authoritative)
    pub xref: XrefAtoms,

    /// Trailer dictionary
    pub trailer: AtomDict,

    /// Document catalog
    pub catalog: AtomDict,

    /// Zero-based page index to page atoms
    pub pages: BTreeMap<u32, PageAtoms>,

    /// Embedded files
    pub embeds: EmbedAtoms,

    /// Reserved for document-level annotation atoms
    pub annots: AtomDict,

    /// Interactive form fields
    pub acroform: AcroFormAtoms,

    /// JavaScript name-tree entries, name to script source
    pub js: BTreeMap<String, String>,

    /// Digital signatures
    pub signatures: SignatureAtoms,

    /// Reserved for structure-tree atoms
    pub structure: AtomDict,

    /// Encryption dictionary, only for encrypted documents
    pub encrypt: AtomDict,

    /// Fallback dump of raw objects, keyed `"<num> <gen>"`
    pub raw: BTreeMap<String, RawObject>,
}

impl AtomDocument {
    /// Create an empty atom store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages captured.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get page atoms by zero-based index.
    pub fn page(&self, index: u32) -> Option<&PageAtoms> {
        self.pages.get(&index)
    }

    /// Whether the document had no pages or has not been exploded.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The catalog's object reference, from the trailer's `/Root`.
    pub fn root_ref(&self) -> Option<ObjectRef> {
        self.trailer.get("Root").and_then(AtomValue::as_reference)
    }

    /// Total number of text spans across all pages.
    pub fn span_count(&self) -> usize {
        self.pages.values().map(|p| p.text.len()).sum()
    }

    /// Total number of image draws across all pages.
    pub fn image_count(&self) -> usize {
        self.pages.values().map(|p| p.images.len()).sum()
    }

    /// Copy of the atoms with run-dependent fields cleared.
    ///
    /// Two explodes of an unchanged file compare equal through this view.
    pub fn without_volatile(&self) -> Self {
        let mut atoms = self.clone();
        atoms.meta.created_at = None;
        atoms
    }
}

/// Metadata about the extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetaAtoms {
    /// When the explode ran (volatile)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Source path as given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Source size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_size: Option<u64>,

    /// SHA-256 hex digest of the source bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,

    /// Name and version of the producing tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

/// File header atoms.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeaderAtoms {
    /// Format version (e.g., "1.7")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Whether the header carries a binary comment line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<bool>,
}

/// Cross-reference section flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum XrefKind {
    /// Classic `xref` table
    Table,
    /// Cross-reference stream (PDF 1.5+)
    Stream,
}

/// Cross-reference summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct XrefAtoms {
    /// Table or stream
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<XrefKind>,

    /// Number of objects in the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

/// Embedded file atoms (names only, no content).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbedAtoms {
    /// Names from the `/EmbeddedFiles` name tree
    pub names: Vec<String>,
}

/// A terminal interactive form field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    /// Fully qualified field name (`parent.child`)
    pub name: String,
    /// Field type (`Tx`, `Btn`, `Ch`, `Sig`), inherited from ancestors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    /// Field object, when indirect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectRef>,
    /// Field value `/V`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<AtomValue>,
}

/// Interactive form atoms.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AcroFormAtoms {
    /// Terminal fields in tree order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FormField>,

    /// `/SigFlags` of the form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig_flags: Option<i64>,
}

/// Descriptor of one signature field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignatureField {
    /// Fully qualified field name
    pub name: String,
    /// Field object, when indirect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectRef>,
    /// Signature handler (`/Filter`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Encoding of the signature value (`/SubFilter`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_filter: Option<String>,
    /// Signer name (`/Name`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    /// Signing time as written (`/M`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<String>,
    /// Reason for signing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Signing location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Signed byte ranges
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub byte_range: Vec<i64>,
    /// Length of the `/Contents` signature blob in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents_length: Option<usize>,
}

/// Signature atoms. Serialized as `{}` when the document has none.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignatureAtoms {
    /// Number of signed signature fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// Field descriptors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<SignatureField>,
}

impl SignatureAtoms {
    /// Build from field descriptors; empty input yields empty atoms.
    pub fn from_fields(fields: Vec<SignatureField>) -> Self {
        if fields.is_empty() {
            return Self::default();
        }
        Self {
            count: Some(fields.len()),
            fields,
        }
    }

    /// Whether no signature was captured.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One entry of the raw object dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawObject {
    /// Object kind (`dictionary`, `stream`, `array`, ...)
    pub kind: &'static str,
    /// Stored stream length, for streams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    /// SHA-256 of the stored stream bytes, for streams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}
