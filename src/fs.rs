//! File system utilities.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Returns the hidden sibling used as a staging file for `path`.
fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    parent.join(format!(".{file_name}.tmp"))
}

/// Writes content to a file atomically using a temp file and rename.
///
/// This prevents file corruption if the process is interrupted (e.g., Ctrl+C).
/// The temp file is created in the same directory as the target file to ensure
/// the rename operation is atomic (same filesystem).
pub fn atomic_write(path: impl AsRef<Path>, content: &str) -> io::Result<()> {
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)
}

/// Streams `reader` into `path` atomically, returning the bytes copied.
///
/// `path` only ever holds a complete copy: data is synced under a temp name
/// first, and the temp file is removed on failure.
pub fn atomic_copy(reader: &mut dyn Read, path: impl AsRef<Path>) -> io::Result<u64> {
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    let result = (|| {
        let mut file = File::create(&temp_path)?;
        let copied = io::copy(reader, &mut file)?;
        file.flush()?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;
        Ok(copied)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
