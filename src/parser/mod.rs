//! PDF parsing module.

mod atomizer;
mod backend;
mod fonts;
mod images;
mod layout;
mod objects;
mod observer;
mod options;
mod report;
mod structure;

pub use atomizer::Atomizer;
pub use backend::{LopdfBackend, PageContentSource, PageId, PdfBackend, StructureSource};
pub use images::{image_payload, sha256_hex};
pub use layout::{spans_from_blocks, BlockType, LayoutAnalyzer, PositionedSpan, TextBlock, TextLine};
pub use observer::{ExplodeObserver, LogObserver, NullObserver};
pub use options::{ErrorMode, ExplodeOptions};
pub use report::{ExplodeReport, Step, StepOutcome};
