//! YAML coordinate export: page number to `{slug: [x, y]}`.

use std::path::Path;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use super::options::{SlugCollision, YamlOptions, MAX_SLUG_LEN};
use crate::error::{Error, Result};
use crate::model::{AtomDocument, PageAtoms};
use crate::output::write_atomic;

/// Turns span text into mapping keys.
#[derive(Debug, Clone)]
pub struct Slugger {
    separator: Regex,
    max_len: usize,
}

impl Slugger {
    /// Create a slugger truncating to `max_len` characters.
    pub fn new(max_len: usize) -> Result<Self> {
        let separator =
            Regex::new(r"[^a-z0-9]+").map_err(|e| Error::Render(format!("slug pattern: {}", e)))?;
        Ok(Self { separator, max_len })
    }

    /// Lowercase, collapse every run outside `[a-z0-9]` into one `_`, trim
    /// `_` at both ends, truncate.
    pub fn slug(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let replaced = self.separator.replace_all(&lower, "_");
        // Only ASCII remains, so byte truncation is safe
        let mut slug = replaced.trim_matches('_').to_string();
        slug.truncate(self.max_len);
        slug
    }
}

/// Slug of `text` with the default maximum length.
pub fn slugify(text: &str) -> Result<String> {
    Ok(Slugger::new(MAX_SLUG_LEN)?.slug(text))
}

/// Build the coordinate map.
///
/// Keys are 1-based page numbers zero-padded to two digits (wider when the
/// document has 100 pages or more). Spans keep content-stream order.
pub fn to_yaml_mapping(atoms: &AtomDocument, options: &YamlOptions) -> Result<Mapping> {
    let slugger = Slugger::new(options.max_slug_len)?;
    let width = atoms.page_count().to_string().len().max(2);

    let mut root = Mapping::new();
    for (&index, page) in &atoms.pages {
        let key = format!("{:0width$}", index + 1, width = width);
        root.insert(
            Value::String(key),
            Value::Mapping(page_mapping(page, &slugger, options.collision)),
        );
    }
    Ok(root)
}

fn page_mapping(page: &PageAtoms, slugger: &Slugger, collision: SlugCollision) -> Mapping {
    let mut mapping = Mapping::new();
    for span in &page.text {
        let base = slugger.slug(&span.text);
        let key = match collision {
            SlugCollision::Overwrite => base,
            SlugCollision::Suffix => unique_key(&mapping, base),
        };
        let point = Value::Sequence(vec![Value::from(span.x), Value::from(span.y)]);
        mapping.insert(Value::String(key), point);
    }
    mapping
}

fn unique_key(mapping: &Mapping, base: String) -> String {
    if !mapping.contains_key(base.as_str()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if !mapping.contains_key(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

/// Render the coordinate map as a YAML string.
pub fn to_yaml(atoms: &AtomDocument, options: &YamlOptions) -> Result<String> {
    Ok(serde_yaml::to_string(&to_yaml_mapping(atoms, options)?)?)
}

/// Write the coordinate map to `path`, replacing it atomically.
pub fn write_yaml<P: AsRef<Path>>(atoms: &AtomDocument, path: P, options: &YamlOptions) -> Result<()> {
    let yaml = to_yaml(atoms, options)?;
    write_atomic(path.as_ref(), |w| Ok(w.write_all(yaml.as_bytes())?))
}
