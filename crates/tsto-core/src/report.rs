//! Machine-readable summary of a successful run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::pipeline::TargetKind;
use crate::rewrite::ReplacementDirective;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub target: TargetKind,
    pub package: PathBuf,
    /// Final artifact; set once it has been promoted from `.part`.
    pub output: Option<PathBuf>,
    pub signed: bool,
    pub text_files_modified: Vec<PathBuf>,
    pub manifest_updated: bool,
    pub replacements: Vec<ReplacementDirective>,
    pub sha256: Option<String>,
}

impl RunReport {
    pub fn new(target: TargetKind, package: &Path) -> Self {
        Self {
            target,
            package: package.to_path_buf(),
            output: None,
            signed: false,
            text_files_modified: Vec::new(),
            manifest_updated: false,
            replacements: Vec::new(),
            sha256: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize run report")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).with_context(|| format!("write report: {}", path.display()))
    }
}
