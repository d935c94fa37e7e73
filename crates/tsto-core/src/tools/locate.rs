//! Discoverable-path search for bundled tools and credentials.
//!
//! Order: configured roots relative to the working directory, then the
//! directory named by the env hint, then platform install locations.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ToolsConfig;
use crate::error::{PatchError, PatchResult};

#[derive(Debug, Clone)]
pub struct ToolLocator {
    roots: Vec<PathBuf>,
}

fn common_roots() -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![
            PathBuf::from("C:/Program Files/tsto-patcher/sdktools"),
            PathBuf::from("C:/sdktools"),
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/usr/local/share/tsto-patcher/sdktools"),
            PathBuf::from("/opt/homebrew/share/tsto-patcher/sdktools"),
        ]
    } else {
        vec![
            PathBuf::from("/usr/local/share/tsto-patcher/sdktools"),
            PathBuf::from("/usr/share/tsto-patcher/sdktools"),
        ]
    }
}

impl ToolLocator {
    /// Locator over an explicit root list, searched in order.
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn from_config(cfg: &ToolsConfig) -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut roots: Vec<PathBuf> = cfg.search_roots.iter().map(|r| cwd.join(r)).collect();
        if let Some(hint) = env::var_os(&cfg.env_hint).filter(|v| !v.is_empty()) {
            roots.push(PathBuf::from(hint));
        }
        roots.extend(common_roots());
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// First `<root>/<relative>` that is a regular file.
    pub fn find_file(&self, relative: &str) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|r| r.join(relative))
            .find(|p| p.is_file())
    }

    /// First file (in name order) with extension `ext` inside `<root>/<subdir>`.
    pub fn find_with_extension(&self, subdir: &str, ext: &str) -> Option<PathBuf> {
        self.roots.iter().find_map(|root| {
            let dir = root.join(subdir);
            let mut hits: Vec<PathBuf> = fs::read_dir(&dir)
                .ok()?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|e| e.eq_ignore_ascii_case(ext))
                })
                .collect();
            hits.sort();
            hits.into_iter().next()
        })
    }

    /// Like `find_file`, but a miss is `DependencyMissing` naming every root searched.
    pub fn require_file(&self, relative: &str, what: &str) -> PatchResult<PathBuf> {
        self.find_file(relative)
            .ok_or_else(|| self.missing(what, relative))
    }

    pub fn require_with_extension(&self, subdir: &str, ext: &str, what: &str) -> PatchResult<PathBuf> {
        self.find_with_extension(subdir, ext)
            .ok_or_else(|| self.missing(what, &format!("{subdir}/*.{ext}")))
    }

    fn missing(&self, what: &str, relative: &str) -> PatchError {
        let searched: Vec<String> = self
            .roots
            .iter()
            .map(|r| r.join(relative).display().to_string())
            .collect();
        PatchError::DependencyMissing {
            what: what.to_string(),
            hint: format!("searched {}", searched.join(", ")),
        }
    }
}

/// Executable `name` on PATH, if any.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// `dir/name` plus the platform executable suffix, if that file exists.
pub fn executable_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = dir.join(format!("{name}{}", env::consts::EXE_SUFFIX));
    candidate.is_file().then_some(candidate)
}
