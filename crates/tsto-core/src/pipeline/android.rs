//! APK pipeline: decompile with apktool, rewrite text resources and native
//! libraries, rebuild, sign.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{check_package, drive, prepare_output, prepare_tree, promote, PackageTool, PatchRequest, Stage, TargetKind};
use crate::classify::{classify, FileClass};
use crate::config::UrlConfig;
use crate::error::{PatchError, PatchResult};
use crate::locator::{locate, Role, APK_LAYOUT};
use crate::observer::{PatchObserver, Reporter};
use crate::report::RunReport;
use crate::rewrite::{patch_binary_file, rewrite_text_tree};
use crate::storage;

/// Every native library under `tree`, in name order. A directory that cannot
/// be listed is fatal: its libraries would silently keep the old URL.
fn native_libraries(tree: &Path, text_extensions: &[String]) -> PatchResult<Vec<PathBuf>> {
    let mut libs = Vec::new();
    for entry in WalkDir::new(tree).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(tree).to_path_buf();
            PatchError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if classify(&path, text_extensions) == FileClass::Binary
            && path.extension().is_some_and(|e| e.eq_ignore_ascii_case("so"))
        {
            libs.push(path);
        }
    }
    Ok(libs)
}

fn rewrite_urls(
    request: &PatchRequest,
    urls: &UrlConfig,
    report: &mut RunReport,
    reporter: &mut Reporter<'_>,
) -> PatchResult<()> {
    let tree = &request.tree;
    let targets = locate(tree, &APK_LAYOUT)?;

    let dlc = urls.dlc_slot(&request.endpoints);
    let padded = dlc.padded()?;
    reporter.log(format!(
        "Final padded URL: {} ({} bytes)",
        String::from_utf8_lossy(&padded),
        padded.len()
    ));

    let mapping = urls.text_mapping(&request.endpoints);
    report.text_files_modified = rewrite_text_tree(tree, &mapping, &urls.text_extensions, reporter);
    report.manifest_updated = report
        .text_files_modified
        .iter()
        .any(|p| Some(p.as_path()) == targets.get(Role::Manifest));

    if targets.get(Role::NativeLibs).is_none() {
        reporter.log("No lib directory; scanning the whole tree for native libraries");
    }
    let slots = [dlc];
    for lib in native_libraries(tree, &urls.text_extensions)? {
        reporter.log(format!("Processing .so file: {}", lib.display()));
        let applied = patch_binary_file(&lib, &slots, reporter)?;
        report.replacements.extend(applied);
    }
    Ok(())
}

/// Patches an APK. The observer sees 0/20/50/80/90 checkpoints and always a
/// final 100.
pub fn patch_apk(
    request: &PatchRequest,
    urls: &UrlConfig,
    tool: &mut dyn PackageTool,
    observer: &mut dyn PatchObserver,
) -> PatchResult<RunReport> {
    let final_path = request.output_path()?;
    let temp = storage::temp_path(&final_path);
    drive(TargetKind::Apk, &temp, observer, |reporter, stages| {
        let mut report = RunReport::new(TargetKind::Apk, &request.package);

        reporter.progress(0, "Checking dependencies...");
        check_package(&request.package, reporter)?;
        reporter.log(format!("Package tool: {}", tool.name()));
        tool.check(reporter)?;
        stages.advance(Stage::DependenciesChecked);

        reporter.progress(20, "Decompiling APK...");
        prepare_tree(request, reporter)?;
        tool.decompile(&request.package, &request.tree, &request.endpoints, reporter)?;
        stages.advance(Stage::Decompiled);

        reporter.progress(50, "Replacing URLs...");
        rewrite_urls(request, urls, &mut report, reporter)?;
        stages.advance(Stage::UrlsRewritten);

        reporter.progress(80, "Recompiling APK...");
        prepare_output(&temp)?;
        tool.recompile(&request.tree, &temp, reporter)?;
        if !temp.is_file() {
            return Err(PatchError::not_found("recompiled APK", &temp));
        }
        stages.advance(Stage::Recompiled);

        reporter.progress(90, "Signing APK...");
        report.signed = tool.sign(&temp, reporter)?;
        stages.advance(Stage::Signed);

        promote(&temp, &final_path, &mut report, reporter)?;
        Ok(report)
    })
}
