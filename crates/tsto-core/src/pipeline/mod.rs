//! Per-format patch pipelines and the machinery they share.
//!
//! A pipeline owns its extracted tree for the whole run, reports through a
//! `Reporter`, and promotes the artifact to its final name only after the
//! last stage succeeded.

pub mod android;
pub mod ios;
mod stage;

pub use android::patch_apk;
pub use ios::patch_ipa;
pub use stage::{Stage, StageTracker};

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::config::WorkspaceConfig;
use crate::endpoints::Endpoints;
use crate::error::{PatchError, PatchResult};
use crate::observer::{PatchObserver, Reporter};
use crate::report::RunReport;
use crate::storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Apk,
    Ipa,
}

impl TargetKind {
    pub fn extension(self) -> &'static str {
        match self {
            TargetKind::Apk => "apk",
            TargetKind::Ipa => "ipa",
        }
    }

    fn success_status(self) -> &'static str {
        match self {
            TargetKind::Apk => "APK patched successfully!",
            TargetKind::Ipa => "IPA patching completed successfully!",
        }
    }

    fn failure_status(self) -> &'static str {
        match self {
            TargetKind::Apk => "Failed to patch APK",
            TargetKind::Ipa => "Failed to patch IPA",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetKind::Apk => "APK",
            TargetKind::Ipa => "IPA",
        })
    }
}

/// Decompiler / recompiler / signer for one package format.
pub trait PackageTool {
    fn name(&self) -> &str;

    /// Pre-flight: resolves everything later calls need.
    fn check(&mut self, reporter: &mut Reporter<'_>) -> PatchResult<()>;

    /// Extracts `package` into the (empty) directory `tree`.
    fn decompile(
        &mut self,
        package: &Path,
        tree: &Path,
        endpoints: &Endpoints,
        reporter: &mut Reporter<'_>,
    ) -> PatchResult<()>;

    /// Builds `artifact` from `tree`.
    fn recompile(&mut self, tree: &Path, artifact: &Path, reporter: &mut Reporter<'_>) -> PatchResult<()>;

    /// Signs `artifact` in place. `Ok(false)` means the format is shipped unsigned.
    fn sign(&mut self, artifact: &Path, reporter: &mut Reporter<'_>) -> PatchResult<bool>;
}

/// One patch run's inputs.
#[derive(Debug, Clone)]
pub struct PatchRequest {
    pub kind: TargetKind,
    pub package: PathBuf,
    pub endpoints: Endpoints,
    /// Extracted tree; recreated empty at the start of the run.
    pub tree: PathBuf,
    /// Directory the tree must sit strictly below.
    pub work_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl PatchRequest {
    /// Tree and output locations come from the workspace section, relative to
    /// the working directory when not configured.
    pub fn new(kind: TargetKind, package: impl Into<PathBuf>, endpoints: Endpoints, workspace: &WorkspaceConfig) -> Self {
        let work_dir = workspace.work_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let tree_name = match kind {
            TargetKind::Apk => &workspace.apk_dir,
            TargetKind::Ipa => &workspace.ipa_dir,
        };
        Self {
            kind,
            package: package.into(),
            endpoints,
            tree: work_dir.join(tree_name),
            work_dir,
            output_dir: workspace.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn output_path(&self) -> PatchResult<PathBuf> {
        output_path(&self.package, &self.output_dir, self.kind)
    }
}

/// `<output_dir>/<stem>-patched.<ext>`, keeping the input's extension.
pub fn output_path(package: &Path, output_dir: &Path, kind: TargetKind) -> PatchResult<PathBuf> {
    let stem = package
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PatchError::not_found("package file name", package))?;
    let ext = package
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(kind.extension());
    Ok(output_dir.join(format!("{stem}-patched.{ext}")))
}

/// Shared pre-flight: the input package must be a readable file.
fn check_package(package: &Path, reporter: &mut Reporter<'_>) -> PatchResult<()> {
    let meta = fs::metadata(package).map_err(|e| PatchError::io(package, e))?;
    if !meta.is_file() {
        return Err(PatchError::not_found("input package", package));
    }
    reporter.log(format!("Input package: {} ({} bytes)", package.display(), meta.len()));
    Ok(())
}

/// The tree is wiped before decompiling, so it must be a sub-directory of the
/// work directory that holds neither the work directory nor the input package.
fn check_tree(request: &PatchRequest) -> PatchResult<()> {
    let tree = &request.tree;
    let refuse = |reason: &str| PatchError::UnsafeTree {
        tree: tree.clone(),
        reason: reason.to_string(),
    };
    let relative = tree
        .strip_prefix(&request.work_dir)
        .map_err(|_| refuse("not inside the work directory"))?;
    if relative.as_os_str().is_empty()
        || !relative.components().all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(refuse("directory name must be a plain sub-directory of the work directory"));
    }

    // Symlinks can still point the tree back at its parents.
    let Ok(tree_real) = tree.canonicalize() else {
        return Ok(());
    };
    if let Ok(work_real) = request.work_dir.canonicalize() {
        if work_real.starts_with(&tree_real) {
            return Err(refuse("it contains the work directory"));
        }
    }
    if let Ok(package_real) = request.package.canonicalize() {
        if package_real.starts_with(&tree_real) {
            return Err(refuse("it contains the input package"));
        }
    }
    Ok(())
}

fn prepare_tree(request: &PatchRequest, reporter: &mut Reporter<'_>) -> PatchResult<()> {
    check_tree(request)?;
    let tree = &request.tree;
    storage::recreate_dir(tree).map_err(|e| PatchError::io(tree, e))?;
    reporter.log(format!("Extracted tree: {}", tree.display()));
    Ok(())
}

/// Creates the output directory the `.part` artifact is built in.
fn prepare_output(temp: &Path) -> PatchResult<()> {
    if let Some(dir) = temp.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| PatchError::io(dir, e))?;
    }
    Ok(())
}

/// Renames the finished `.part` artifact and fills in the report's output.
fn promote(temp: &Path, final_path: &Path, report: &mut RunReport, reporter: &mut Reporter<'_>) -> PatchResult<()> {
    storage::finalize(temp, final_path).map_err(|e| PatchError::io(final_path, e))?;
    reporter.log(format!("Output: {}", final_path.display()));
    match crate::checksum::sha256_path(final_path) {
        Ok(digest) => {
            reporter.log(format!("SHA-256: {digest}"));
            report.sha256 = Some(digest);
        }
        Err(e) => reporter.warn(format!("could not checksum output: {e:#}")),
    }
    report.output = Some(final_path.to_path_buf());
    Ok(())
}

/// Runs `body` with a fresh reporter and tracker, then settles the terminal
/// state: progress always ends at 100, a failure reaches `on_error` once and
/// leaves no `.part` artifact behind.
fn drive<F>(kind: TargetKind, temp: &Path, observer: &mut dyn PatchObserver, body: F) -> PatchResult<RunReport>
where
    F: FnOnce(&mut Reporter<'_>, &mut StageTracker) -> PatchResult<RunReport>,
{
    let mut reporter = Reporter::new(observer);
    let mut tracker = StageTracker::new();
    match body(&mut reporter, &mut tracker) {
        Ok(report) => {
            tracker.advance(Stage::Done);
            reporter.progress(100, kind.success_status());
            Ok(report)
        }
        Err(e) => {
            tracing::debug!(stage = ?tracker.current(), "pipeline failed");
            tracker.fail();
            if temp.exists() {
                if let Err(rm) = fs::remove_file(temp) {
                    reporter.warn(format!("could not remove {}: {rm}", temp.display()));
                }
            }
            reporter.error(e.to_string());
            reporter.progress(100, kind.failure_status());
            Err(e)
        }
    }
}
