//! CLI for the TSTO package patcher.

mod commands;
mod console;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tsto_core::config;
use tsto_core::TargetKind;

use commands::{run_check_deps, run_checksum, run_completions, run_man, run_patch};

/// Top-level CLI for the patcher.
#[derive(Debug, Parser)]
#[command(name = "tsto-patch", version)]
#[command(about = "Redirect a Tapped Out APK/IPA to your own game and DLC servers", long_about = None)]
pub struct Cli {
    /// Echo every tool and rewriter log line to the terminal.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Inputs shared by `apk` and `ipa`.
#[derive(Debug, Clone, Args)]
pub struct PatchArgs {
    /// Package to patch.
    pub package: PathBuf,

    /// Game server base URL (MayhemServerURL / director).
    #[arg(long, value_name = "URL")]
    pub game_server: String,

    /// DLC server base URL; `/static/` is appended.
    #[arg(long, value_name = "URL")]
    pub dlc_server: String,

    /// Directory for the `-patched` output (default: config, then current dir).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write a JSON run report here.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DepsTarget {
    Apk,
    Ipa,
}

impl From<DepsTarget> for TargetKind {
    fn from(t: DepsTarget) -> Self {
        match t {
            DepsTarget::Apk => TargetKind::Apk,
            DepsTarget::Ipa => TargetKind::Ipa,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Decompile, rewrite, rebuild and sign an Android APK.
    Apk(PatchArgs),

    /// Extract, rewrite and repack an iOS IPA (left unsigned).
    Ipa(PatchArgs),

    /// Check that the external tools a target needs are installed.
    CheckDeps {
        #[arg(long, value_enum, default_value_t = DepsTarget::Apk)]
        target: DepsTarget,
    },

    /// Compute SHA-256 of a file (e.g. a patched package).
    Checksum {
        /// Path to the file.
        path: PathBuf,

        /// Expected digest; exit non-zero on mismatch.
        #[arg(long, value_name = "SHA256")]
        expect: Option<String>,
    },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Print the man page (roff).
    Man,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let verbose = self.verbose;
        match self.command {
            CliCommand::Apk(args) => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_patch(TargetKind::Apk, &args, &cfg, verbose)?;
            }
            CliCommand::Ipa(args) => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_patch(TargetKind::Ipa, &args, &cfg, verbose)?;
            }
            CliCommand::CheckDeps { target } => {
                let cfg = config::load_or_init()?;
                run_check_deps(target.into(), &cfg)?;
            }
            CliCommand::Checksum { path, expect } => run_checksum(&path, expect.as_deref())?,
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
