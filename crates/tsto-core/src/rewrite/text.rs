//! Substring replacement in text resources (markup, smali listings, plain text).
//!
//! No length constraint applies here. Keys are applied in mapping order, each
//! one on the output of the previous, so overlapping keys see already
//! rewritten content.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::classify::is_rewritable_text;
use crate::endpoints::UrlMapping;
use crate::observer::Reporter;
use crate::storage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRewrite {
    pub content: String,
    pub modified: bool,
    /// Distinct keys that were replaced, in mapping order.
    pub replaced: Vec<String>,
}

/// Replaces every occurrence of every mapping key in `content`.
///
/// An occurrence that already sits inside an occurrence of its own
/// replacement value is left alone, so running this twice with the same
/// mapping gives the same result as running it once.
pub fn rewrite_text(content: &str, mapping: &UrlMapping) -> TextRewrite {
    let mut current = content.to_string();
    let mut replaced = Vec::new();
    for (key, value) in mapping.iter() {
        if let Some(next) = replace_fresh(&current, key, value) {
            current = next;
            replaced.push(key.to_string());
        }
    }
    TextRewrite {
        modified: !replaced.is_empty(),
        content: current,
        replaced,
    }
}

/// Replaces occurrences of `key` not already covered by a `value`.
/// Returns `None` when nothing was replaced.
fn replace_fresh(haystack: &str, key: &str, value: &str) -> Option<String> {
    if key.is_empty() || key == value {
        return None;
    }
    let bytes = haystack.as_bytes();
    // Offsets at which the key appears inside the value.
    let inner: Vec<usize> = value.match_indices(key).map(|(i, _)| i).collect();

    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    let mut replaced = false;
    for (pos, _) in haystack.match_indices(key) {
        let covered = inner
            .iter()
            .any(|&k| pos >= k && bytes[pos - k..].starts_with(value.as_bytes()));
        if covered {
            continue;
        }
        out.push_str(&haystack[last..pos]);
        out.push_str(value);
        last = pos + key.len();
        replaced = true;
    }
    if !replaced {
        return None;
    }
    out.push_str(&haystack[last..]);
    Some(out)
}

/// Rewrites one file in place. Unreadable or unwritable files are skipped
/// with a warning; the file is only written back when its content changed.
pub fn rewrite_text_file(path: &Path, mapping: &UrlMapping, reporter: &mut Reporter<'_>) -> bool {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            reporter.warn(format!("Could not open file: {} ({})", path.display(), e));
            return false;
        }
    };
    let result = rewrite_text(&content, mapping);
    if !result.modified {
        return false;
    }
    for key in &result.replaced {
        let value = mapping
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .unwrap_or_default();
        reporter.log(format!("Replaced '{}' with '{}' in {}", key, value, path.display()));
    }
    if let Err(e) = storage::replace_file(path, result.content.as_bytes()) {
        reporter.warn(format!("Could not write file: {} ({})", path.display(), e));
        return false;
    }
    true
}

/// Walks `root` in file-name order and rewrites every allow-listed text file.
/// Returns the files that were modified.
pub fn rewrite_text_tree(
    root: &Path,
    mapping: &UrlMapping,
    text_extensions: &[String],
    reporter: &mut Reporter<'_>,
) -> Vec<PathBuf> {
    let mut modified = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                reporter.warn(format!("Could not read directory entry: {}", e));
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_rewritable_text(path, text_extensions) {
            continue;
        }
        if rewrite_text_file(path, mapping, reporter) {
            modified.push(path.to_path_buf());
        }
    }
    modified
}
