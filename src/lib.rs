//! # pdf-atomizer
//!
//! Decompose a PDF into a typed atom store: header, cross-reference summary,
//! trailer, catalog, per-page dictionaries with positioned text and image
//! hashes, embedded file names, JavaScript, form fields, signatures and the
//! encryption dictionary.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_atomizer::{explode_file, render};
//!
//! fn main() -> pdf_atomizer::Result<()> {
//!     let atoms = explode_file("offer.pdf")?;
//!
//!     // Full atom dump
//!     render::write_json(&atoms, "offer.json", render::JsonFormat::Pretty)?;
//!
//!     // Page number -> {slug: [x, y]}
//!     render::write_yaml(&atoms, "offer.yaml", &render::YamlOptions::default())?;
//!
//!     // Partial PDF: catalog and trailer only
//!     pdf_atomizer::rebuild::rebuild(&atoms, "offer.partial.pdf")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Fault-isolated steps**: a broken name tree or signature never aborts
//!   the rest of the explode (unless strict mode is on)
//! - **Text positions**: content-stream interpretation with fonts, matrices
//!   and form XObjects
//! - **Content hashes**: SHA-256 of every decoded image payload
//! - **Atomic output**: JSON, YAML and rebuilt PDFs never leave partial files

pub mod detect;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;
pub mod rebuild;
pub mod render;

// Re-export commonly used types
pub use detect::{detect_header_from_bytes, detect_header_from_path, is_pdf, is_pdf_bytes, PdfHeader};
pub use error::{Error, Result};
pub use model::{AtomDocument, AtomValue, ImageAtom, ObjectRef, PageAtoms, TextSpan};
pub use parser::{
    Atomizer, ErrorMode, ExplodeObserver, ExplodeOptions, ExplodeReport, LopdfBackend, Step,
    StepOutcome,
};
pub use render::{JsonFormat, SlugCollision, YamlOptions};

use std::path::Path;

/// Explode a PDF file with default options and return its atoms.
///
/// # Example
///
/// ```no_run
/// use pdf_atomizer::explode_file;
///
/// let atoms = explode_file("offer.pdf").unwrap();
/// println!("Pages: {}", atoms.page_count());
/// ```
pub fn explode_file<P: AsRef<Path>>(path: P) -> Result<AtomDocument> {
    explode_file_with_options(path, ExplodeOptions::default())
}

/// Explode a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdf_atomizer::{explode_file_with_options, ExplodeOptions};
///
/// let options = ExplodeOptions::new().strict().with_raw_objects(true);
/// let atoms = explode_file_with_options("offer.pdf", options).unwrap();
/// ```
pub fn explode_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ExplodeOptions,
) -> Result<AtomDocument> {
    let mut atomizer = Atomizer::open_with_options(path, options)?;
    atomizer.explode()?;
    Ok(atomizer.into_atoms())
}

/// Explode a PDF held in memory.
pub fn explode_bytes(data: &[u8]) -> Result<AtomDocument> {
    explode_bytes_with_options(data, ExplodeOptions::default())
}

/// Explode a PDF held in memory with custom options.
pub fn explode_bytes_with_options(data: &[u8], options: ExplodeOptions) -> Result<AtomDocument> {
    let mut atomizer = Atomizer::from_bytes_with_options(data, options)?;
    atomizer.explode()?;
    Ok(atomizer.into_atoms())
}
