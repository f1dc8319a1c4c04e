//! PDF backend abstraction layer.
//!
//! The explode pipeline reaches the PDF library only through two ports:
//! [`StructureSource`] for document-level objects and [`PageContentSource`]
//! for per-page content. [`LopdfBackend`] implements both over one loaded
//! `lopdf::Document`, so the source file is parsed once and shared.

use std::collections::BTreeMap;

use lopdf::Document as LopdfDocument;

use super::images;
use super::layout::{LayoutAnalyzer, TextBlock};
use super::objects::{get_array, inherited_attribute, rectangle, resolve_dict};
use super::structure;
use crate::detect::{detect_header_from_bytes, PdfHeader};
use crate::error::{Error, Result};
use crate::model::{
    dict_from_lopdf, AcroFormAtoms, AtomDict, AtomValue, HeaderAtoms, ImageAtom, RawObject,
    SignatureField, XrefAtoms, LETTER_MEDIA_BOX,
};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Document-level objects: header, trailer, catalog, name trees, forms.
pub trait StructureSource {
    /// File header information.
    fn header(&self) -> Result<HeaderAtoms>;

    /// Cross-reference summary.
    fn xref(&self) -> Result<XrefAtoms>;

    /// The trailer dictionary.
    fn trailer(&self) -> Result<AtomDict>;

    /// The document catalog.
    fn catalog(&self) -> Result<AtomDict>;

    /// All pages as (1-based page number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Names of embedded files.
    fn embedded_files(&self) -> Result<Vec<String>>;

    /// JavaScript name-tree entries.
    fn javascript(&self) -> Result<BTreeMap<String, String>>;

    /// Signed signature fields.
    fn signatures(&self) -> Result<Vec<SignatureField>>;

    /// Interactive form fields.
    fn form_fields(&self) -> Result<AcroFormAtoms>;

    /// Encryption dictionary, `None` for unencrypted documents.
    fn encryption(&self) -> Result<Option<AtomDict>>;

    /// Raw dump of every object.
    fn raw_objects(&self) -> Result<BTreeMap<String, RawObject>>;
}

/// Per-page content: dictionaries, layout, images and annotations.
pub trait PageContentSource {
    /// The page's own dictionary.
    fn page_dict(&self, page: PageId) -> Result<AtomDict>;

    /// The page's effective resource dictionary, empty when none.
    fn page_resources(&self, page: PageId) -> Result<AtomDict>;

    /// The page's MediaBox, US Letter when missing or malformed.
    fn media_box(&self, page: PageId) -> [f32; 4];

    /// Layout blocks in content-stream order.
    fn page_blocks(&self, page: PageId) -> Result<Vec<TextBlock>>;

    /// Images with content hashes.
    fn page_images(&self, page: PageId) -> Result<Vec<ImageAtom>>;

    /// Entries of the page's `/Annots` array.
    fn page_annots(&self, page: PageId) -> Result<Vec<AtomValue>>;
}

/// A complete backend: both ports over one document.
pub trait PdfBackend: StructureSource + PageContentSource {}

impl<T: StructureSource + PageContentSource> PdfBackend for T {}

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    header: Option<PdfHeader>,
}

impl LopdfBackend {
    /// Load from an in-memory byte slice.
    ///
    /// Documents that open with the empty user password are decrypted while
    /// loading; any other encrypted document is [`Error::Encrypted`].
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let header = detect_header_from_bytes(data).ok();
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self { doc, header })
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        Self { doc, header: None }
    }

    /// Check if the document reports itself encrypted, including documents
    /// already decrypted with the empty user password.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted() || self.doc.encryption_state.is_some()
    }

    fn page_dictionary(&self, page: PageId) -> Result<&lopdf::Dictionary> {
        self.doc
            .get_dictionary(page)
            .map_err(|e| Error::PdfParse(format!("page {} {} R: {}", page.0, page.1, e)))
    }
}

impl StructureSource for LopdfBackend {
    fn header(&self) -> Result<HeaderAtoms> {
        Ok(match &self.header {
            Some(header) => HeaderAtoms {
                version: Some(header.version.clone()),
                binary: Some(header.binary_marker),
            },
            None => HeaderAtoms {
                version: Some(self.doc.version.clone()),
                binary: None,
            },
        })
    }

    fn xref(&self) -> Result<XrefAtoms> {
        Ok(structure::xref_summary(&self.doc))
    }

    fn trailer(&self) -> Result<AtomDict> {
        Ok(dict_from_lopdf(&self.doc.trailer))
    }

    fn catalog(&self) -> Result<AtomDict> {
        structure::catalog(&self.doc)
            .map(dict_from_lopdf)
            .ok_or_else(|| Error::MissingObject("document catalog".to_string()))
    }

    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn embedded_files(&self) -> Result<Vec<String>> {
        Ok(structure::embedded_file_names(&self.doc))
    }

    fn javascript(&self) -> Result<BTreeMap<String, String>> {
        Ok(structure::javascript(&self.doc))
    }

    fn signatures(&self) -> Result<Vec<SignatureField>> {
        Ok(structure::signatures(&self.doc))
    }

    fn form_fields(&self) -> Result<AcroFormAtoms> {
        Ok(structure::form_fields(&self.doc))
    }

    fn encryption(&self) -> Result<Option<AtomDict>> {
        if !self.is_encrypted() {
            return Ok(None);
        }
        structure::encryption(&self.doc)
            .map(Some)
            .ok_or_else(|| Error::MissingObject("encryption dictionary".to_string()))
    }

    fn raw_objects(&self) -> Result<BTreeMap<String, RawObject>> {
        Ok(structure::raw_objects(&self.doc))
    }
}

impl PageContentSource for LopdfBackend {
    fn page_dict(&self, page: PageId) -> Result<AtomDict> {
        Ok(dict_from_lopdf(self.page_dictionary(page)?))
    }

    fn page_resources(&self, page: PageId) -> Result<AtomDict> {
        self.page_dictionary(page)?;
        Ok(inherited_attribute(&self.doc, page, b"Resources")
            .and_then(|r| resolve_dict(&self.doc, r))
            .map(dict_from_lopdf)
            .unwrap_or_default())
    }

    fn media_box(&self, page: PageId) -> [f32; 4] {
        inherited_attribute(&self.doc, page, b"MediaBox")
            .and_then(|b| rectangle(&self.doc, b))
            .filter(|b| b[2] > b[0] && b[3] > b[1])
            .unwrap_or(LETTER_MEDIA_BOX)
    }

    fn page_blocks(&self, page: PageId) -> Result<Vec<TextBlock>> {
        LayoutAnalyzer::new(&self.doc).extract_page_blocks(page)
    }

    fn page_images(&self, page: PageId) -> Result<Vec<ImageAtom>> {
        self.page_dictionary(page)?;
        Ok(images::page_images(&self.doc, page))
    }

    fn page_annots(&self, page: PageId) -> Result<Vec<AtomValue>> {
        let dict = self.page_dictionary(page)?;
        Ok(get_array(&self.doc, dict, b"Annots")
            .map(|items| items.iter().map(AtomValue::from).collect::<Vec<_>>())
            .unwrap_or_default())
    }
}
