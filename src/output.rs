//! Atomic output files.

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Write `dst` through a temporary file in the same directory.
///
/// The temporary file is renamed over `dst` only after `write` succeeds and
/// the data is flushed; on any failure it is removed and `dst` is untouched.
pub fn write_atomic<F>(dst: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(dst).map_err(|e| Error::Io(e.error))?;

    log::debug!("Wrote {}", dst.display());
    Ok(())
}
