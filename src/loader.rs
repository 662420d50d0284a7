//! Input loading.
//!
//! Reads the target image and its companion map file. A map file shares the
//! image's base name with a `.map` extension (`app.exe` -> `app.map`).

use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{PadError, Result};

/// Extension the linker gives the map file.
pub const MAP_EXTENSION: &str = "map";

/// Path of the map file paired with `image`.
pub fn map_path_for(image: &Path) -> PathBuf {
    image.with_extension(MAP_EXTENSION)
}

fn map_file(path: &Path) -> Result<Option<Mmap>> {
    let file = File::open(path).map_err(|e| PadError::io(path, e))?;
    let len = file.metadata().map_err(|e| PadError::io(path, e))?.len();
    if len == 0 {
        return Ok(None);
    }
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| PadError::io(path, e))?;
    Ok(Some(mmap))
}

/// Reads the whole image into an owned, mutable buffer.
pub fn load_image(path: &Path) -> Result<Vec<u8>> {
    let image = map_file(path)?.map(|mmap| mmap.to_vec()).unwrap_or_default();
    tracing::debug!("Loaded {} ({} bytes)", path.display(), image.len());
    Ok(image)
}

/// Reads map file text. Bytes that are not UTF-8 are replaced, not rejected.
pub fn load_map_text(path: &Path) -> Result<String> {
    let text = match map_file(path)? {
        Some(mmap) => String::from_utf8_lossy(&mmap).into_owned(),
        None => String::new(),
    };
    tracing::debug!("Loaded map file {} ({} bytes)", path.display(), text.len());
    Ok(text)
}
