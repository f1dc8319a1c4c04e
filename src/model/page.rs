//! Per-page atoms.

use serde::Serialize;

use super::value::{AtomDict, AtomValue, ObjectRef};

/// Atoms extracted from one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAtoms {
    /// The page object's reference
    pub object: ObjectRef,

    /// The page's own dictionary (shallow)
    pub dict: AtomDict,

    /// Effective resource dictionary, inherited through `/Parent` when needed
    pub resources: AtomDict,

    /// MediaBox `[x0, y0, x1, y1]` used to convert positions
    pub media_box: [f32; 4],

    /// Text spans in content-stream order
    pub text: Vec<TextSpan>,

    /// Images drawn by the page, first-seen order
    pub images: Vec<ImageAtom>,

    /// Annotation entries from `/Annots`
    pub annots: Vec<AtomValue>,
}

impl PageAtoms {
    /// Create empty page atoms for a page object.
    pub fn new(object: ObjectRef) -> Self {
        Self {
            object,
            dict: AtomDict::new(),
            resources: AtomDict::new(),
            media_box: LETTER_MEDIA_BOX,
            text: Vec::new(),
            images: Vec::new(),
            annots: Vec::new(),
        }
    }

    /// Page width in user-space units.
    pub fn width(&self) -> f32 {
        self.media_box[2] - self.media_box[0]
    }

    /// Page height in user-space units.
    pub fn height(&self) -> f32 {
        self.media_box[3] - self.media_box[1]
    }

    /// Text spans in reading position: top to bottom, then left to right.
    ///
    /// `text` itself keeps content-stream order; this is an extra view.
    pub fn text_sorted(&self) -> Vec<&TextSpan> {
        let mut spans: Vec<&TextSpan> = self.text.iter().collect();
        spans.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });
        spans
    }
}

/// US Letter, used when a page declares no usable MediaBox.
pub const LETTER_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// A positioned run of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSpan {
    /// Trimmed text content
    pub text: String,
    /// Left edge of the run, from the page's left edge
    pub x: f64,
    /// Top of the run, from the page's bottom edge
    pub y: f64,
}

impl TextSpan {
    /// Create a span, rounding both coordinates to one decimal.
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x: round1(x),
            y: round1(y),
        }
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// An image drawn on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAtom {
    /// Object number of the image XObject
    pub xref: u32,
    /// SHA-256 hex digest of the decoded image payload
    pub sha: String,
}
