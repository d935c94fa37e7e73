//! `apk` / `ipa`: run one patch pipeline.

use anyhow::{Context, Result};
use tsto_core::archive::ZipRepacker;
use tsto_core::config::PatcherConfig;
use tsto_core::tools::Apktool;
use tsto_core::{patch_apk, patch_ipa, Endpoints, PatchRequest, TargetKind};

use crate::cli::console::ConsoleObserver;
use crate::cli::PatchArgs;

/// Builds the request from flags and config, runs the pipeline, prints the
/// output path and writes the report if asked.
pub fn run_patch(kind: TargetKind, args: &PatchArgs, cfg: &PatcherConfig, verbose: bool) -> Result<()> {
    let endpoints = Endpoints::new(&args.game_server, &args.dlc_server)?;
    let mut workspace = cfg.workspace.clone();
    if let Some(dir) = &args.output_dir {
        workspace.output_dir = Some(dir.clone());
    }
    let request = PatchRequest::new(kind, &args.package, endpoints, &workspace);
    tracing::info!(
        target_kind = %kind,
        package = %request.package.display(),
        tree = %request.tree.display(),
        "starting patch run"
    );

    let mut observer = ConsoleObserver::new(verbose);
    let report = match kind {
        TargetKind::Apk => {
            let mut tool = Apktool::new(cfg.tools.clone(), cfg.signing.clone());
            patch_apk(&request, &cfg.urls, &mut tool, &mut observer)
        }
        TargetKind::Ipa => patch_ipa(&request, &cfg.urls, &mut ZipRepacker, &mut observer),
    }
    .with_context(|| format!("patching {}", args.package.display()))?;

    if let Some(out) = &report.output {
        println!("{}", out.display());
    }
    if let Some(path) = &args.report {
        report.write_json(path)?;
        tracing::info!("run report written to {}", path.display());
    }
    Ok(())
}
