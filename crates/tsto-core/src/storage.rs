//! File lifecycle helpers: `.part` temp paths, atomic replace and finalize.
//!
//! Binaries and artifacts are written next to their destination under a
//! `.part` name and renamed into place, so a failed write never leaves a
//! half-written file under the real name.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `x.apk` → `x.apk.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Replaces the content of `path` with `data` in one pass: writes a `.part`
/// sibling carrying the original permissions, syncs it, then renames it over
/// `path`.
pub fn replace_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let permissions = fs::metadata(path)?.permissions();
    let tmp = temp_path(path);
    let write = || -> io::Result<()> {
        let mut f = File::create(&tmp)?;
        f.write_all(data)?;
        f.sync_all()?;
        fs::set_permissions(&tmp, permissions)?;
        Ok(())
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)
}

/// Moves a finished temp file to `final_path`, replacing an older file of
/// that name. Falls back to copy + remove when rename crosses filesystems.
pub fn finalize(temp: &Path, final_path: &Path) -> io::Result<()> {
    if final_path.exists() {
        fs::remove_file(final_path)?;
    }
    match fs::rename(temp, final_path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(temp, final_path)?;
            fs::remove_file(temp)
        }
    }
}

/// Deletes `dir` with everything in it (if present) and creates it empty.
pub fn recreate_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(dir)
}
