//! `check-deps`: resolve a target's external tools and print them.

use anyhow::Result;
use tsto_core::config::PatcherConfig;
use tsto_core::tools::probe_android;
use tsto_core::{Reporter, TargetKind};

use crate::cli::console::ConsoleObserver;

pub fn run_check_deps(target: TargetKind, cfg: &PatcherConfig) -> Result<()> {
    match target {
        TargetKind::Apk => {
            let mut observer = ConsoleObserver::new(true);
            let mut reporter = Reporter::new(&mut observer);
            let tc = probe_android(&cfg.tools, &cfg.signing, &mut reporter)?;
            println!("{:<10} {}", "java", format!("{} (Java {})", tc.java.java.display(), tc.java.major));
            println!("{:<10} {}", "apktool", tc.apktool_jar.display());
            println!("{:<10} {}", "jarsigner", tc.jarsigner.display());
            println!("{:<10} {}", "keystore", tc.keystore.display());
        }
        TargetKind::Ipa => {
            println!("IPA patching uses built-in zip support; no external tools needed.");
        }
    }
    Ok(())
}
