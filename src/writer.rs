//! Output writer.
//!
//! Writes the rewritten image verbatim next to the input, keeping the input's
//! permissions. The image goes to a temporary file in the destination
//! directory first and is renamed into place, so a failed write leaves nothing
//! behind.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{PadError, Result};

/// Suffix appended to the input file name.
pub const OUTPUT_SUFFIX: &str = ".padsmashed";

/// Default output path: `app.exe` -> `app.exe.padsmashed`.
pub fn output_path_for(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

/// Write the image to disk.
pub fn write_image(output_path: &Path, image: &[u8], input_path: &Path) -> Result<()> {
    let perms = fs::metadata(input_path)
        .map_err(|e| PadError::io(input_path, e))?
        .permissions();

    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PadError::io(dir, e))?;
    tmp.write_all(image).map_err(|e| PadError::io(tmp.path(), e))?;
    tmp.as_file()
        .set_permissions(perms)
        .map_err(|e| PadError::io(tmp.path(), e))?;
    tmp.persist(output_path)
        .map_err(|e| PadError::io(output_path, e.error))?;

    tracing::debug!("Wrote {} bytes to {}", image.len(), output_path.display());
    Ok(())
}
