//! IPA pipeline: extract, edit `Info.plist`, patch the main executable,
//! repack.

use super::{check_package, drive, prepare_output, prepare_tree, promote, PackageTool, PatchRequest, Stage, TargetKind};
use crate::config::UrlConfig;
use crate::error::{PatchError, PatchResult};
use crate::locator::{locate, Role, IPA_LAYOUT};
use crate::observer::{PatchObserver, Reporter};
use crate::report::RunReport;
use crate::rewrite::{patch_binary_file, update_manifest_file};
use crate::storage;

fn rewrite_urls(
    request: &PatchRequest,
    urls: &UrlConfig,
    report: &mut RunReport,
    reporter: &mut Reporter<'_>,
) -> PatchResult<()> {
    let targets = locate(&request.tree, &IPA_LAYOUT)?;
    let manifest = targets.require(Role::Manifest)?;
    let executable = targets.require(Role::Executable)?;

    // Both slots are sized before the manifest is touched, so a too-long
    // endpoint leaves the whole tree untouched.
    let slots = [urls.dlc_slot(&request.endpoints), urls.game_slot(&request.endpoints)];
    for slot in &slots {
        slot.padded()?;
    }

    reporter.progress(40, "Updating Info.plist...");
    report.manifest_updated = update_manifest_file(manifest, &request.endpoints, reporter)?;

    reporter.progress(60, "Updating binary...");
    report.replacements = patch_binary_file(executable, &slots, reporter)?;
    Ok(())
}

/// Patches an IPA. The observer sees 0/10/40/60/80 checkpoints and always a
/// final 100.
pub fn patch_ipa(
    request: &PatchRequest,
    urls: &UrlConfig,
    tool: &mut dyn PackageTool,
    observer: &mut dyn PatchObserver,
) -> PatchResult<RunReport> {
    let final_path = request.output_path()?;
    let temp = storage::temp_path(&final_path);
    drive(TargetKind::Ipa, &temp, observer, |reporter, stages| {
        let mut report = RunReport::new(TargetKind::Ipa, &request.package);

        reporter.progress(0, "Starting IPA patching process...");
        check_package(&request.package, reporter)?;
        reporter.log(format!("Package tool: {}", tool.name()));
        tool.check(reporter)?;
        stages.advance(Stage::DependenciesChecked);

        reporter.progress(10, "Decompiling IPA...");
        prepare_tree(request, reporter)?;
        tool.decompile(&request.package, &request.tree, &request.endpoints, reporter)?;
        stages.advance(Stage::Decompiled);

        rewrite_urls(request, urls, &mut report, reporter)?;
        stages.advance(Stage::UrlsRewritten);

        reporter.progress(80, "Recompiling IPA...");
        prepare_output(&temp)?;
        tool.recompile(&request.tree, &temp, reporter)?;
        if !temp.is_file() {
            return Err(PatchError::not_found("repacked IPA", &temp));
        }
        stages.advance(Stage::Recompiled);

        report.signed = tool.sign(&temp, reporter)?;
        stages.advance(Stage::Signed);

        promote(&temp, &final_path, &mut report, reporter)?;
        Ok(report)
    })
}
