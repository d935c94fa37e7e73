//! File classification by name and extension (no content sniffing).

use std::path::Path;

/// Structured-text file names edited key by key.
const STRUCTURED_NAMES: &[&str] = &["Info.plist", "AndroidManifest.xml"];

/// Native library extensions patched length-preservingly.
const BINARY_EXTENSIONS: &[&str] = &["so", "dylib"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    StructuredText,
    Text,
    Binary,
    Other,
}

/// Classifies `path`. `text_extensions` is the allow-list of generic text
/// extensions, with or without the leading dot (e.g. `.smali`).
pub fn classify(path: &Path, text_extensions: &[String]) -> FileClass {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return FileClass::Other,
    };
    if STRUCTURED_NAMES.contains(&name) {
        return FileClass::StructuredText;
    }
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e,
        None => return FileClass::Other,
    };
    if BINARY_EXTENSIONS.iter().any(|b| b.eq_ignore_ascii_case(ext)) {
        return FileClass::Binary;
    }
    if has_allowed_extension(ext, text_extensions) {
        return FileClass::Text;
    }
    FileClass::Other
}

/// True when `path` belongs to the text rewriter: structured or generic text
/// whose extension is allow-listed.
pub fn is_rewritable_text(path: &Path, text_extensions: &[String]) -> bool {
    let allowed = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| has_allowed_extension(ext, text_extensions));
    allowed
        && matches!(
            classify(path, text_extensions),
            FileClass::Text | FileClass::StructuredText
        )
}

fn has_allowed_extension(ext: &str, allow: &[String]) -> bool {
    allow.iter().any(|a| a.trim_start_matches('.') == ext)
}
