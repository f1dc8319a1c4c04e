//! The explode pipeline.

use std::path::Path;

use chrono::Utc;

use super::backend::{LopdfBackend, PageId, PdfBackend};
use super::images::sha256_hex;
use super::layout::spans_from_blocks;
use super::observer::{ExplodeObserver, LogObserver};
use super::options::{ErrorMode, ExplodeOptions};
use super::report::{ExplodeReport, Step, StepOutcome};
use crate::detect::detect_header_from_bytes;
use crate::error::{Error, Result};
use crate::model::{AtomDocument, MetaAtoms, ObjectRef, PageAtoms, SignatureAtoms};

/// Identity of the source file, recorded in the `meta` atoms.
#[derive(Debug, Clone)]
struct SourceInfo {
    path: String,
    size: u64,
    sha256: String,
}

/// Explodes one PDF into an [`AtomDocument`].
///
/// The atom store is populated exactly once: a second [`explode`](Self::explode)
/// fails with [`Error::AlreadyExploded`].
///
/// # Example
/// ```no_run
/// use pdf_atomizer::Atomizer;
///
/// let mut atomizer = Atomizer::open("offer.pdf")?;
/// let report = atomizer.explode()?;
/// println!("{}", report);
/// println!("{} pages", atomizer.atoms().page_count());
/// # Ok::<(), pdf_atomizer::Error>(())
/// ```
pub struct Atomizer<B: PdfBackend = LopdfBackend> {
    backend: B,
    options: ExplodeOptions,
    observer: Box<dyn ExplodeObserver>,
    source: Option<SourceInfo>,
    atoms: AtomDocument,
    exploded: bool,
}

impl Atomizer<LopdfBackend> {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ExplodeOptions::default())
    }

    /// Open a PDF file with custom options.
    ///
    /// Fails with [`Error::FileNotFound`] when the path does not exist,
    /// [`Error::UnknownFormat`] when it is not a PDF, and
    /// [`Error::Encrypted`] or [`Error::PdfParse`] when it cannot be loaded.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ExplodeOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let data = std::fs::read(path)?;
        let mut atomizer = Self::from_bytes_with_options(&data, options)?;
        if let Some(source) = atomizer.source.as_mut() {
            source.path = path.display().to_string();
        }
        Ok(atomizer)
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ExplodeOptions::default())
    }

    /// Load a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ExplodeOptions) -> Result<Self> {
        detect_header_from_bytes(data)?;
        let backend = LopdfBackend::load_bytes(data)?;

        let mut atomizer = Self::with_backend(backend, options);
        atomizer.source = Some(SourceInfo {
            path: String::new(),
            size: data.len() as u64,
            sha256: sha256_hex(data),
        });
        Ok(atomizer)
    }
}

impl<B: PdfBackend> Atomizer<B> {
    /// Create an atomizer over any backend.
    pub fn with_backend(backend: B, options: ExplodeOptions) -> Self {
        let observer = Box::new(LogObserver::new(options.log_level));
        Self {
            backend,
            options,
            observer,
            source: None,
            atoms: AtomDocument::new(),
            exploded: false,
        }
    }

    /// Replace the progress observer.
    pub fn with_observer<O: ExplodeObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// The backend this atomizer reads from.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The explode options.
    pub fn options(&self) -> &ExplodeOptions {
        &self.options
    }

    /// Whether [`explode`](Self::explode) has run.
    pub fn is_exploded(&self) -> bool {
        self.exploded
    }

    /// The atom store (empty until exploded).
    pub fn atoms(&self) -> &AtomDocument {
        &self.atoms
    }

    /// Consume the atomizer and return the atom store.
    pub fn into_atoms(self) -> AtomDocument {
        self.atoms
    }

    /// Run every extraction step and populate the atom store.
    ///
    /// In lenient mode a failing step is logged, recorded in the report and
    /// leaves its atoms at their defaults. In strict mode the first failure
    /// is returned as [`Error::Step`]; atoms captured before it are kept.
    pub fn explode(&mut self) -> Result<ExplodeReport> {
        if self.exploded {
            return Err(Error::AlreadyExploded);
        }
        self.exploded = true;

        let mut atoms = AtomDocument::new();
        atoms.meta = self.meta();

        let mut runner = StepRunner {
            observer: self.observer.as_mut(),
            mode: self.options.error_mode,
            report: ExplodeReport::default(),
        };
        let result = run_steps(&self.backend, &self.options, &mut atoms, &mut runner);
        let report = runner.report;

        self.atoms = atoms;
        result.map(|_| report)
    }

    fn meta(&self) -> MetaAtoms {
        MetaAtoms {
            created_at: Some(Utc::now()),
            source: self
                .source
                .as_ref()
                .map(|s| s.path.clone())
                .filter(|p| !p.is_empty()),
            source_size: self.source.as_ref().map(|s| s.size),
            source_sha256: self.source.as_ref().map(|s| s.sha256.clone()),
            generator: Some(format!("pdf-atomizer {}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// Runs steps in isolation and records their outcomes.
struct StepRunner<'o> {
    observer: &'o mut dyn ExplodeObserver,
    mode: ErrorMode,
    report: ExplodeReport,
}

impl StepRunner<'_> {
    fn run<F>(&mut self, step: Step, f: F) -> Result<()>
    where
        F: FnOnce(&mut dyn ExplodeObserver) -> Result<StepOutcome>,
    {
        self.observer.step_started(step);
        let outcome = match f(&mut *self.observer) {
            Ok(outcome) => outcome,
            Err(e) => StepOutcome::Failed(e.to_string()),
        };
        self.observer.step_finished(step, &outcome);
        self.report.record(step, outcome.clone());

        match (self.mode, outcome) {
            (ErrorMode::Strict, StepOutcome::Failed(message)) => Err(Error::Step {
                step: step.name(),
                message,
            }),
            _ => Ok(()),
        }
    }
}

fn run_steps<B: PdfBackend>(
    backend: &B,
    options: &ExplodeOptions,
    atoms: &mut AtomDocument,
    runner: &mut StepRunner<'_>,
) -> Result<()> {
    runner.run(Step::Header, |_| {
        atoms.header = backend.header()?;
        Ok(StepOutcome::from_count(atoms.header.version.iter().count()))
    })?;

    runner.run(Step::Xref, |_| {
        atoms.xref = backend.xref()?;
        Ok(StepOutcome::from_count(atoms.xref.size.unwrap_or(0)))
    })?;

    runner.run(Step::Trailer, |_| {
        atoms.trailer = backend.trailer()?;
        Ok(StepOutcome::from_count(atoms.trailer.len()))
    })?;

    runner.run(Step::Catalog, |_| {
        atoms.catalog = backend.catalog()?;
        Ok(StepOutcome::from_count(atoms.catalog.len()))
    })?;

    runner.run(Step::Pages, |observer| {
        let pages = backend.pages();
        let total = pages.len() as u32;
        for (index, page_id) in pages.into_values().enumerate() {
            let index = index as u32;
            let page = explode_page(backend, options, page_id)?;
            atoms.pages.insert(index, page);
            observer.page_finished(index, total);
        }
        Ok(StepOutcome::from_count(atoms.pages.len()))
    })?;

    runner.run(Step::Embeds, |_| {
        atoms.embeds.names = backend.embedded_files()?;
        Ok(StepOutcome::from_count(atoms.embeds.names.len()))
    })?;

    runner.run(Step::JavaScript, |_| {
        atoms.js = backend.javascript()?;
        Ok(StepOutcome::from_count(atoms.js.len()))
    })?;

    runner.run(Step::Signatures, |_| {
        atoms.signatures = SignatureAtoms::from_fields(backend.signatures()?);
        Ok(StepOutcome::from_count(atoms.signatures.fields.len()))
    })?;

    runner.run(Step::AcroForm, |_| {
        atoms.acroform = backend.form_fields()?;
        Ok(StepOutcome::from_count(atoms.acroform.fields.len()))
    })?;

    runner.run(Step::Encryption, |_| {
        Ok(match backend.encryption()? {
            Some(dict) => {
                atoms.encrypt = dict;
                StepOutcome::Captured(1)
            }
            None => StepOutcome::Empty,
        })
    })?;

    runner.run(Step::Raw, |_| {
        if !options.raw_objects {
            return Ok(StepOutcome::Skipped);
        }
        atoms.raw = backend.raw_objects()?;
        Ok(StepOutcome::from_count(atoms.raw.len()))
    })?;

    Ok(())
}

/// Build the atoms of one page.
///
/// The page dictionary must be readable. Text, images and annotations
/// degrade independently: in lenient mode a failure leaves that list empty.
fn explode_page<B: PdfBackend>(
    backend: &B,
    options: &ExplodeOptions,
    page_id: PageId,
) -> Result<PageAtoms> {
    let mut page = PageAtoms::new(ObjectRef::from(page_id));
    page.dict = backend.page_dict(page_id)?;
    page.media_box = backend.media_box(page_id);

    let strict = options.error_mode == ErrorMode::Strict;
    let degrade = |what: &str, e: Error| -> Result<()> {
        if strict {
            return Err(e);
        }
        log::warn!(
            "Page {} {} R: {} unavailable: {}",
            page_id.0,
            page_id.1,
            what,
            e
        );
        Ok(())
    };

    match backend.page_resources(page_id) {
        Ok(resources) => page.resources = resources,
        Err(e) => degrade("resources", e)?,
    }

    if options.extract_text {
        match backend.page_blocks(page_id) {
            Ok(blocks) => page.text = spans_from_blocks(&blocks, page.media_box),
            Err(e) => degrade("text", e)?,
        }
    }

    if options.hash_images {
        match backend.page_images(page_id) {
            Ok(images) => page.images = images,
            Err(e) => degrade("images", e)?,
        }
    }

    match backend.page_annots(page_id) {
        Ok(annots) => page.annots = annots,
        Err(e) => degrade("annotations", e)?,
    }

    Ok(page)
}
