//! Key/value edits in XML property lists (`Info.plist`).
//!
//! Only the text between `<string>` and `</string>` of the targeted key is
//! touched; every other byte of the document is kept as is.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::endpoints::Endpoints;
use crate::error::{PatchError, PatchResult};
use crate::observer::Reporter;
use crate::storage;

pub const GAME_SERVER_KEY: &str = "MayhemServerURL";
pub const DLC_LOCATION_KEY: &str = "DLCLocation";
pub const BUNDLE_VERSION_KEY: &str = "CFBundleVersion";

/// What happened to one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdit {
    Replaced,
    /// Key already held the requested value.
    Unchanged,
    Inserted,
    /// Key absent and so was its anchor; nothing done.
    AnchorMissing,
    /// Key present but not followed by a `<string>` value; left alone so the
    /// document never ends up with the key twice.
    NotAString,
}

impl KeyEdit {
    pub fn changed(self) -> bool {
        matches!(self, KeyEdit::Replaced | KeyEdit::Inserted)
    }
}

/// `<key>KEY</key>` followed by its `<string>` element; group 1 is the value.
fn string_entry(key: &str) -> Regex {
    Regex::new(&format!(
        r"(?s)<key>{}</key>\s*<string>(.*?)</string>",
        regex::escape(key)
    ))
    .expect("escaped key always forms a valid pattern")
}

/// `<key>KEY</key>` followed by an empty `<string/>`; group 1 is that element.
fn empty_string_entry(key: &str) -> Regex {
    Regex::new(&format!(
        r"<key>{}</key>\s*(<string\s*/>)",
        regex::escape(key)
    ))
    .expect("escaped key always forms a valid pattern")
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Whitespace that precedes the tag starting at `at` on its own line.
fn indentation_at(doc: &str, at: usize) -> &str {
    let line_start = doc[..at].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &doc[line_start..at];
    if !prefix.is_empty() && prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix
    } else {
        "\t"
    }
}

/// Sets `key` to `value`. When the key is absent a new pair is inserted right
/// after the `anchor` key's string element, indented like the anchor.
pub fn set_string(doc: &str, key: &str, value: &str, anchor: &str) -> (String, KeyEdit) {
    let escaped = escape_xml(value);
    if let Some(caps) = string_entry(key).captures(doc) {
        let Some(current) = caps.get(1) else {
            return (doc.to_string(), KeyEdit::NotAString);
        };
        if current.as_str() == escaped {
            return (doc.to_string(), KeyEdit::Unchanged);
        }
        let mut out = String::with_capacity(doc.len() + escaped.len());
        out.push_str(&doc[..current.start()]);
        out.push_str(&escaped);
        out.push_str(&doc[current.end()..]);
        return (out, KeyEdit::Replaced);
    }
    if let Some(element) = empty_string_entry(key).captures(doc).and_then(|c| c.get(1)) {
        if escaped.is_empty() {
            return (doc.to_string(), KeyEdit::Unchanged);
        }
        let filled = format!("<string>{escaped}</string>");
        let mut out = String::with_capacity(doc.len() + filled.len());
        out.push_str(&doc[..element.start()]);
        out.push_str(&filled);
        out.push_str(&doc[element.end()..]);
        return (out, KeyEdit::Replaced);
    }
    if doc.contains(&format!("<key>{}</key>", key)) {
        return (doc.to_string(), KeyEdit::NotAString);
    }

    let Some(anchor_match) = string_entry(anchor).find(doc) else {
        return (doc.to_string(), KeyEdit::AnchorMissing);
    };
    let indent = indentation_at(doc, anchor_match.start());
    let insert = format!(
        "\n{indent}<key>{key}</key>\n{indent}<string>{escaped}</string>"
    );
    let mut out = String::with_capacity(doc.len() + insert.len());
    out.push_str(&doc[..anchor_match.end()]);
    out.push_str(&insert);
    out.push_str(&doc[anchor_match.end()..]);
    (out, KeyEdit::Inserted)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEdit {
    pub content: String,
    pub game: KeyEdit,
    pub dlc: KeyEdit,
}

impl ManifestEdit {
    pub fn changed(&self) -> bool {
        self.game.changed() || self.dlc.changed()
    }
}

/// Points `MayhemServerURL` at the game endpoint (anchored after
/// `CFBundleVersion`) and `DLCLocation` at the DLC endpoint plus `/static/`
/// (anchored after `MayhemServerURL`, so a freshly inserted game key counts).
pub fn update_manifest(doc: &str, endpoints: &Endpoints) -> ManifestEdit {
    let (doc, game) = set_string(doc, GAME_SERVER_KEY, endpoints.game(), BUNDLE_VERSION_KEY);
    let (content, dlc) = set_string(&doc, DLC_LOCATION_KEY, &endpoints.dlc_static(), GAME_SERVER_KEY);
    ManifestEdit { content, game, dlc }
}

fn log_edit(reporter: &mut Reporter<'_>, key: &str, value: &str, edit: KeyEdit) {
    match edit {
        KeyEdit::Replaced => reporter.log(format!("Updated {}: {}", key, value)),
        KeyEdit::Unchanged => reporter.log(format!("{} already set to {}", key, value)),
        KeyEdit::Inserted => {
            reporter.log(format!("Key '{}' not found.", key));
            reporter.log(format!("Added {}: {}", key, value));
        }
        KeyEdit::AnchorMissing => {
            reporter.log(format!("Key '{}' not found and no anchor to insert after; skipped", key))
        }
        KeyEdit::NotAString => {
            reporter.warn(format!("Key '{}' has a non-string value; left unchanged", key))
        }
    }
}

/// Edits the manifest file in place. A missing or unreadable manifest is
/// fatal; the file is rewritten only when a key changed.
pub fn update_manifest_file(
    path: &Path,
    endpoints: &Endpoints,
    reporter: &mut Reporter<'_>,
) -> PatchResult<bool> {
    reporter.log("Updating Info.plist...");
    let doc = fs::read_to_string(path).map_err(|e| PatchError::io(path, e))?;
    let edit = update_manifest(&doc, endpoints);
    log_edit(reporter, GAME_SERVER_KEY, endpoints.game(), edit.game);
    log_edit(reporter, DLC_LOCATION_KEY, &endpoints.dlc_static(), edit.dlc);
    if !edit.changed() {
        return Ok(false);
    }
    storage::replace_file(path, edit.content.as_bytes()).map_err(|e| PatchError::io(path, e))?;
    Ok(true)
}
