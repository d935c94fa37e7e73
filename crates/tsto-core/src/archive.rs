//! In-process zip handling for IPA packages.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::endpoints::Endpoints;
use crate::error::{PatchError, PatchResult};
use crate::observer::Reporter;
use crate::pipeline::PackageTool;

fn archive_err(path: &Path) -> impl Fn(zip::result::ZipError) -> PatchError + '_ {
    move |source| PatchError::Archive {
        path: path.to_path_buf(),
        source,
    }
}

/// Extracts `archive` into `dest`. Entries whose names would escape `dest`
/// are skipped with a warning. Unix modes stored in the archive are restored.
/// Returns the number of files written.
pub fn extract_archive(archive: &Path, dest: &Path, reporter: &mut Reporter<'_>) -> PatchResult<usize> {
    let file = File::open(archive).map_err(|e| PatchError::io(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(archive_err(archive))?;
    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(archive_err(archive))?;
        let Some(rel) = entry.enclosed_name() else {
            reporter.warn(format!("Skipping unsafe archive entry: {}", entry.name()));
            continue;
        };
        let out = dest.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| PatchError::io(&out, e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| PatchError::io(parent, e))?;
        }
        let mut target = File::create(&out).map_err(|e| PatchError::io(&out, e))?;
        io::copy(&mut entry, &mut target).map_err(|e| PatchError::io(&out, e))?;
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out, fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| PatchError::io(&out, e))?;
        }
        written += 1;
    }
    reporter.log(format!("Extracted {} files from {}", written, archive.display()));
    Ok(written)
}

/// `/`-separated archive name of `path` relative to `root`.
fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(unix)]
fn with_mode(options: SimpleFileOptions, path: &Path) -> SimpleFileOptions {
    use std::os::unix::fs::PermissionsExt;
    match fs::metadata(path) {
        Ok(m) => options.unix_permissions(m.permissions().mode() & 0o7777),
        Err(_) => options,
    }
}

#[cfg(not(unix))]
fn with_mode(options: SimpleFileOptions, _path: &Path) -> SimpleFileOptions {
    options
}

/// Packs every entry under `root` (name order, deflated) into `artifact`.
/// Returns the number of files stored.
pub fn create_archive(root: &Path, artifact: &Path, reporter: &mut Reporter<'_>) -> PatchResult<usize> {
    let file = File::create(artifact).map_err(|e| PatchError::io(artifact, e))?;
    let mut zip = ZipWriter::new(file);
    let base = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut stored = 0;
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| PatchError::io(root, e.into()))?;
        let path = entry.path();
        let Some(name) = entry_name(root, path) else {
            continue;
        };
        let options = with_mode(base, path);
        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)
                .map_err(archive_err(artifact))?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options).map_err(archive_err(artifact))?;
            let mut source = File::open(path).map_err(|e| PatchError::io(path, e))?;
            io::copy(&mut source, &mut zip).map_err(|e| PatchError::io(artifact, e))?;
            stored += 1;
        } else {
            reporter.warn(format!("Skipping non-regular file: {}", path.display()));
        }
    }
    zip.finish().map_err(archive_err(artifact))?;
    reporter.log(format!("Packed {} files into {}", stored, artifact.display()));
    Ok(stored)
}

/// IPA collaborator: zip extract and repack, no signing.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipRepacker;

impl PackageTool for ZipRepacker {
    fn name(&self) -> &str {
        "zip"
    }

    fn check(&mut self, reporter: &mut Reporter<'_>) -> PatchResult<()> {
        reporter.log("IPA extraction and packing are built in; no external tools needed");
        Ok(())
    }

    fn decompile(
        &mut self,
        package: &Path,
        tree: &Path,
        _endpoints: &Endpoints,
        reporter: &mut Reporter<'_>,
    ) -> PatchResult<()> {
        extract_archive(package, tree, reporter)?;
        Ok(())
    }

    fn recompile(&mut self, tree: &Path, artifact: &Path, reporter: &mut Reporter<'_>) -> PatchResult<()> {
        create_archive(tree, artifact, reporter)?;
        Ok(())
    }

    fn sign(&mut self, artifact: &Path, reporter: &mut Reporter<'_>) -> PatchResult<bool> {
        reporter.log(format!(
            "{} is left unsigned; re-sign it before installing on a device",
            artifact.display()
        ));
        Ok(false)
    }
}
