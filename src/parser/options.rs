//! Explode options and configuration.

/// Options for exploding PDF documents.
#[derive(Debug, Clone)]
pub struct ExplodeOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Whether to extract positioned page text
    pub extract_text: bool,

    /// Whether to hash page images
    pub hash_images: bool,

    /// Whether to fill the raw object dump
    pub raw_objects: bool,

    /// Level used by the default log observer for step summaries
    pub log_level: log::Level,
}

impl ExplodeOptions {
    /// Create new explode options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable strict mode (first failed step aborts the explode).
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Enable lenient mode (failed steps are recorded and skipped).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable page text extraction.
    pub fn with_text(mut self, extract: bool) -> Self {
        self.extract_text = extract;
        self
    }

    /// Enable or disable image hashing.
    pub fn with_images(mut self, hash: bool) -> Self {
        self.hash_images = hash;
        self
    }

    /// Enable or disable the raw object dump.
    pub fn with_raw_objects(mut self, dump: bool) -> Self {
        self.raw_objects = dump;
        self
    }

    /// Set the level of step summaries emitted by the default observer.
    pub fn with_log_level(mut self, level: log::Level) -> Self {
        self.log_level = level;
        self
    }
}

impl Default for ExplodeOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            extract_text: true,
            hash_images: true,
            raw_objects: false,
            log_level: log::Level::Info,
        }
    }
}

/// Error handling mode during an explode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on the first failed step
    Strict,
    /// Record failed steps and continue
    #[default]
    Lenient,
}
