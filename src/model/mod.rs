//! Atom store: the typed in-memory model of an exploded PDF.
//!
//! An [`AtomDocument`] is created empty, populated by exactly one explode
//! run and read-only afterwards. Each top-level field is one atom category.

mod document;
mod page;
mod value;

pub use document::{
    AcroFormAtoms, AtomDocument, EmbedAtoms, FormField, HeaderAtoms, MetaAtoms, RawObject,
    SignatureAtoms, SignatureField, XrefAtoms, XrefKind,
};
pub use page::{round1, ImageAtom, PageAtoms, TextSpan, LETTER_MEDIA_BOX};
pub use value::{decode_pdf_string, dict_from_lopdf, dict_to_lopdf, AtomDict, AtomValue, ObjectRef};
