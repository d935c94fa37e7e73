//! Finds the well-known entries of an extracted package tree.
//!
//! Layouts are plain tables: each step names a role, the role of the
//! directory it is looked up in, and how a child entry is recognised. Adding
//! a package layout means adding a table, nothing else.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PatchError, PatchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The extracted tree itself.
    Root,
    Payload,
    Bundle,
    Manifest,
    Executable,
    NativeLibs,
}

/// How a child of the parent directory is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Directory whose name ends with the suffix (ASCII case-insensitive).
    DirSuffix(&'static str),
    /// Directory whose extension matches (ASCII case-insensitive).
    DirExtension(&'static str),
    /// Directory with this exact name.
    DirNamed(&'static str),
    /// Regular file with this exact name.
    FileNamed(&'static str),
    /// Regular file named after the parent directory minus its last
    /// extension (`Tapped Out.app/Tapped Out`, `Tapped.Out.app/Tapped.Out`).
    FileNamedAfterParent,
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutStep {
    pub role: Role,
    pub parent: Role,
    pub matcher: Matcher,
    pub required: bool,
    /// Human name used in `TargetNotFound`.
    pub describe: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub name: &'static str,
    pub steps: &'static [LayoutStep],
}

pub const IPA_LAYOUT: Layout = Layout {
    name: "ipa",
    steps: &[
        LayoutStep {
            role: Role::Payload,
            parent: Role::Root,
            matcher: Matcher::DirSuffix("Payload"),
            required: true,
            describe: "Payload directory",
        },
        LayoutStep {
            role: Role::Bundle,
            parent: Role::Payload,
            matcher: Matcher::DirExtension("app"),
            required: true,
            describe: ".app directory",
        },
        LayoutStep {
            role: Role::Manifest,
            parent: Role::Bundle,
            matcher: Matcher::FileNamed("Info.plist"),
            required: true,
            describe: "Info.plist",
        },
        LayoutStep {
            role: Role::Executable,
            parent: Role::Bundle,
            matcher: Matcher::FileNamedAfterParent,
            required: true,
            describe: "main executable",
        },
    ],
};

pub const APK_LAYOUT: Layout = Layout {
    name: "apk",
    steps: &[
        LayoutStep {
            role: Role::Manifest,
            parent: Role::Root,
            matcher: Matcher::FileNamed("AndroidManifest.xml"),
            required: true,
            describe: "AndroidManifest.xml",
        },
        LayoutStep {
            role: Role::NativeLibs,
            parent: Role::Root,
            matcher: Matcher::DirNamed("lib"),
            required: false,
            describe: "native library directory",
        },
    ],
};

/// Resolved paths for one layout.
#[derive(Debug, Clone)]
pub struct LocatedTargets {
    found: Vec<(Role, PathBuf)>,
}

impl LocatedTargets {
    pub fn get(&self, role: Role) -> Option<&Path> {
        self.found
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, p)| p.as_path())
    }

    /// Path for a role the layout marks as required. Absent roles report
    /// `TargetNotFound` with the role's name.
    pub fn require(&self, role: Role) -> PatchResult<&Path> {
        self.get(role).ok_or_else(|| {
            PatchError::not_found(format!("{:?}", role), self.root().to_path_buf())
        })
    }

    pub fn root(&self) -> &Path {
        self.get(Role::Root).unwrap_or_else(|| Path::new("."))
    }
}

fn matches(path: &Path, is_dir: bool, parent: &Path, matcher: Matcher) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    match matcher {
        Matcher::DirSuffix(suffix) => {
            is_dir && name.to_ascii_lowercase().ends_with(&suffix.to_ascii_lowercase())
        }
        Matcher::DirExtension(ext) => {
            is_dir
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        }
        Matcher::DirNamed(n) => is_dir && name == n,
        Matcher::FileNamed(n) => !is_dir && name == n,
        Matcher::FileNamedAfterParent => {
            !is_dir
                && parent
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| stem == name)
        }
    }
}

/// First child of `parent` (in name order) accepted by `matcher`.
fn find_child(parent: &Path, matcher: Matcher) -> PatchResult<Option<PathBuf>> {
    let entries = fs::read_dir(parent).map_err(|e| PatchError::io(parent, e))?;
    let mut children: Vec<(PathBuf, bool)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PatchError::io(parent, e))?;
        let path = entry.path();
        let is_dir = path.is_dir();
        children.push((path, is_dir));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(children
        .into_iter()
        .find(|(p, is_dir)| matches(p, *is_dir, parent, matcher))
        .map(|(p, _)| p))
}

/// Resolves every step of `layout` under `root`, in table order.
pub fn locate(root: &Path, layout: &Layout) -> PatchResult<LocatedTargets> {
    if !root.is_dir() {
        return Err(PatchError::not_found("extracted tree", root));
    }
    let mut targets = LocatedTargets {
        found: vec![(Role::Root, root.to_path_buf())],
    };
    for step in layout.steps {
        let Some(parent) = targets.get(step.parent).map(Path::to_path_buf) else {
            if step.required {
                return Err(PatchError::not_found(step.describe, root));
            }
            continue;
        };
        match find_child(&parent, step.matcher)? {
            Some(path) => {
                tracing::debug!(layout = layout.name, role = ?step.role, path = %path.display(), "located");
                targets.found.push((step.role, path));
            }
            None if step.required => return Err(PatchError::not_found(step.describe, parent)),
            None => {}
        }
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipa_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("Payload/Tapped Out.app");
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("Info.plist"), "<plist/>").unwrap();
        fs::write(app.join("Tapped Out"), b"\xcf\xfa\xed\xfe").unwrap();
        dir
    }

    #[test]
    fn resolves_full_ipa_layout() {
        let dir = ipa_tree();
        let t = locate(dir.path(), &IPA_LAYOUT).unwrap();
        let app = dir.path().join("Payload/Tapped Out.app");
        assert_eq!(t.get(Role::Payload), Some(dir.path().join("Payload").as_path()));
        assert_eq!(t.get(Role::Bundle), Some(app.as_path()));
        assert_eq!(t.require(Role::Manifest).unwrap(), app.join("Info.plist"));
        assert_eq!(t.require(Role::Executable).unwrap(), app.join("Tapped Out"));
    }

    #[test]
    fn payload_suffix_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("payload/Game.APP");
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("Info.plist"), "").unwrap();
        fs::write(app.join("Game"), "").unwrap();
        let t = locate(dir.path(), &IPA_LAYOUT).unwrap();
        assert_eq!(t.require(Role::Executable).unwrap(), app.join("Game"));
    }

    #[test]
    fn dotted_bundle_name_keeps_inner_dots() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("Payload/Tapped.Out.app");
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("Info.plist"), "").unwrap();
        fs::write(app.join("Tapped"), "").unwrap();
        fs::write(app.join("Tapped.Out"), "").unwrap();
        let t = locate(dir.path(), &IPA_LAYOUT).unwrap();
        assert_eq!(t.require(Role::Executable).unwrap(), app.join("Tapped.Out"));
    }

    #[test]
    fn missing_payload_names_payload() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Other.app")).unwrap();
        let err = locate(dir.path(), &IPA_LAYOUT).unwrap_err();
        match err {
            PatchError::TargetNotFound { what, .. } => assert_eq!(what, "Payload directory"),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn missing_executable_names_executable() {
        let dir = ipa_tree();
        fs::remove_file(dir.path().join("Payload/Tapped Out.app/Tapped Out")).unwrap();
        let err = locate(dir.path(), &IPA_LAYOUT).unwrap_err();
        assert!(matches!(err, PatchError::TargetNotFound { ref what, .. } if what == "main executable"));
    }

    #[test]
    fn apk_native_libs_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AndroidManifest.xml"), "<manifest/>").unwrap();
        let t = locate(dir.path(), &APK_LAYOUT).unwrap();
        assert!(t.get(Role::NativeLibs).is_none());
        assert!(t.get(Role::Manifest).is_some());

        fs::create_dir_all(dir.path().join("lib/arm64-v8a")).unwrap();
        let t = locate(dir.path(), &APK_LAYOUT).unwrap();
        assert_eq!(t.get(Role::NativeLibs), Some(dir.path().join("lib").as_path()));
    }

    #[test]
    fn missing_root_is_target_not_found() {
        let err = locate(Path::new("/nonexistent/tappedout"), &APK_LAYOUT).unwrap_err();
        assert!(matches!(err, PatchError::TargetNotFound { .. }));
    }
}
