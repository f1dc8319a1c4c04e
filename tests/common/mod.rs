//! PDF fixtures built with lopdf.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{
    dictionary, Dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId,
    Permissions, Stream, StringFormat,
};

/// Raw RGB pixels of the 2x2 image on page 2 of [`offer_pdf`].
pub const IMAGE_PIXELS: [u8; 12] = [255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];

/// Script stored in the JavaScript name tree of [`offer_pdf`].
pub const INIT_SCRIPT: &str = "app.alert('Angebot geladen');";

fn literal(text: &str) -> Object {
    Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
}

fn content(ops: &str) -> Stream {
    Stream::new(dictionary! {}, ops.as_bytes().to_vec())
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Builder for single-tree documents: a catalog, a page tree and pages.
pub struct PdfBuilder {
    pub doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    catalog: Dictionary,
}

impl PdfBuilder {
    pub fn new(version: &str) -> Self {
        let mut doc = Document::with_version(version);
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            catalog: dictionary! { "Type" => "Catalog", "Pages" => pages_id },
        }
    }

    /// Add a Helvetica font object.
    pub fn helvetica(&mut self) -> ObjectId {
        self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        })
    }

    /// Add a page with the given content operators and resources.
    pub fn page(&mut self, ops: &str, resources: Dictionary, extra: Dictionary) -> ObjectId {
        let content_id = self.doc.add_object(content(ops));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        };
        for (key, value) in extra.into_iter() {
            page.set(key, value);
        }
        let page_id = self.doc.add_object(page);
        self.kids.push(page_id.into());
        page_id
    }

    pub fn catalog_entry(&mut self, key: &str, value: impl Into<Object>) {
        self.catalog.set(key, value);
    }

    /// Finish the document.
    pub fn into_document(mut self) -> Document {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let info_id = self.doc.add_object(dictionary! {
            "Producer" => literal("fixture"),
        });
        let catalog_id = self.doc.add_object(self.catalog);
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);
        self.doc
    }

    /// Finish the document and serialize it.
    pub fn build(self) -> Vec<u8> {
        save(self.into_document())
    }
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Three-page offer: text on every page, a compressed image on page 2,
/// an annotation on page 3 and a document-level script.
pub fn offer_pdf() -> Vec<u8> {
    let mut pdf = PdfBuilder::new("1.7");
    let font = pdf.helvetica();
    let fonts = || dictionary! { "F1" => font };

    pdf.page(
        "BT /F1 12 Tf 72 700 Td (Max Mustermann!) Tj ET\n\
         BT /F1 10 Tf 72 680 Td (Musterstrasse 1) Tj ET",
        dictionary! { "Font" => fonts() },
        dictionary! {},
    );

    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&IMAGE_PIXELS),
    );
    let image_id = pdf.doc.add_object(image);
    pdf.page(
        "q 100 0 0 100 72 600 cm /Im1 Do Q\n\
         BT /F1 12 Tf 72 500 Td (Total: 1.234,00 EUR) Tj ET",
        dictionary! {
            "Font" => fonts(),
            "XObject" => dictionary! { "Im1" => image_id },
        },
        dictionary! {},
    );

    let annot_id = pdf.doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Text",
        "Rect" => vec![100.into(), 100.into(), 120.into(), 120.into()],
        "Contents" => literal("Bitte pruefen"),
    });
    pdf.page(
        "BT /F1 12 Tf 72 700 Td (Unterschrift) Tj ET",
        dictionary! { "Font" => fonts() },
        dictionary! { "Annots" => vec![annot_id.into()] },
    );

    let action_id = pdf.doc.add_object(dictionary! {
        "S" => "JavaScript",
        "JS" => literal(INIT_SCRIPT),
    });
    let names = dictionary! {
        "JavaScript" => dictionary! {
            "Names" => vec![literal("init"), action_id.into()],
        },
    };
    pdf.catalog_entry("Names", names);

    pdf.build()
}

/// One page, no name trees, no form: every optional step finds nothing.
pub fn plain_pdf() -> Vec<u8> {
    let mut pdf = PdfBuilder::new("1.4");
    let font = pdf.helvetica();
    pdf.page(
        "BT /F1 12 Tf 72 700 Td (Hello) Tj ET",
        dictionary! { "Font" => dictionary! { "F1" => font } },
        dictionary! {},
    );
    pdf.build()
}

/// One page encrypted with RC4-128 under owner password "owner".
///
/// An empty `user_password` opens without a password.
pub fn encrypted_pdf(user_password: &str) -> Vec<u8> {
    let mut pdf = PdfBuilder::new("1.6");
    let font = pdf.helvetica();
    pdf.page(
        "BT /F1 12 Tf 72 700 Td (Vertraulich) Tj ET",
        dictionary! { "Font" => dictionary! { "F1" => font } },
        dictionary! {},
    );
    let mut doc = pdf.into_document();
    let file_id = Object::String(b"fixture-file-id".to_vec(), StringFormat::Hexadecimal);
    doc.trailer.set("ID", vec![file_id.clone(), file_id]);

    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password,
        key_length: 128,
        permissions: Permissions::default(),
    })
    .unwrap();
    doc.encrypt(&state).unwrap();
    save(doc)
}

/// One page with a signed signature field, a text field and an embedded file.
pub fn signed_pdf() -> Vec<u8> {
    let mut pdf = PdfBuilder::new("1.6");
    let font = pdf.helvetica();
    pdf.page(
        "BT /F1 12 Tf 72 700 Td (Vertrag) Tj ET",
        dictionary! { "Font" => dictionary! { "F1" => font } },
        dictionary! {},
    );

    let sig_value = pdf.doc.add_object(dictionary! {
        "Type" => "Sig",
        "Filter" => "Adobe.PPKLite",
        "SubFilter" => "adbe.pkcs7.detached",
        "Name" => literal("Max Mustermann"),
        "M" => literal("D:20240101120000Z"),
        "Reason" => literal("Approval"),
        "ByteRange" => vec![0.into(), 100.into(), 200.into(), 300.into()],
        "Contents" => Object::String(vec![0u8; 64], StringFormat::Hexadecimal),
    });
    let sig_field = pdf.doc.add_object(dictionary! {
        "FT" => "Sig",
        "T" => literal("Signature1"),
        "V" => sig_value,
    });
    let text_field = pdf.doc.add_object(dictionary! {
        "FT" => "Tx",
        "T" => literal("customer"),
        "V" => literal("ACME GmbH"),
    });
    pdf.catalog_entry(
        "AcroForm",
        dictionary! {
            "Fields" => vec![sig_field.into(), text_field.into()],
            "SigFlags" => 3,
        },
    );

    let file_id = pdf.doc.add_object(Stream::new(
        dictionary! { "Type" => "EmbeddedFile" },
        b"<invoice/>".to_vec(),
    ));
    let filespec = pdf.doc.add_object(dictionary! {
        "Type" => "Filespec",
        "F" => literal("invoice.xml"),
        "EF" => dictionary! { "F" => file_id },
    });
    pdf.catalog_entry(
        "Names",
        dictionary! {
            "EmbeddedFiles" => dictionary! {
                "Names" => vec![literal("invoice.xml"), filespec.into()],
            },
        },
    );

    pdf.build()
}

/// Write fixture bytes to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}
