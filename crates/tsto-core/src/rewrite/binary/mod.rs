//! Length-preserving literal replacement in native binaries.
//!
//! Native libraries and executables keep pointers and length tables that
//! assume every embedded string stays where it is, so a replacement must
//! occupy exactly the bytes of the literal it overwrites. The whole new buffer
//! is built in memory and written once; a failing slot leaves the file as it
//! was.

mod pad;

pub use pad::{pad_to, PadStyle};

use std::fs;
use std::path::Path;

use super::directive::ReplacementDirective;
use crate::endpoints::with_suffix;
use crate::error::{PatchError, PatchResult};
use crate::observer::Reporter;
use crate::storage;

/// One literal to replace and the value that takes its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySlot {
    /// Short name for log lines ("DLC URL", "Game server URL").
    pub label: String,
    pub literal: Vec<u8>,
    /// Caller-supplied base value; a trailing `/` is stripped.
    pub base: String,
    /// Fixed suffix the slot needs after the base (`/static/` or empty).
    pub suffix: String,
    pub style: PadStyle,
}

impl BinarySlot {
    pub fn new(
        label: impl Into<String>,
        literal: impl Into<Vec<u8>>,
        base: impl Into<String>,
        suffix: impl Into<String>,
        style: PadStyle,
    ) -> Self {
        Self {
            label: label.into(),
            literal: literal.into(),
            base: base.into(),
            suffix: suffix.into(),
            style,
        }
    }

    /// Normalized replacement before padding.
    pub fn desired(&self) -> String {
        with_suffix(&self.base, &self.suffix)
    }

    /// Replacement padded to the literal's length.
    pub fn padded(&self) -> PatchResult<Vec<u8>> {
        pad_to(self.desired().as_bytes(), self.literal.len(), self.style)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    Applied(ReplacementDirective),
    NotFound { label: String },
}

#[derive(Debug, Clone)]
pub struct BinaryPatch {
    pub bytes: Vec<u8>,
    pub outcomes: Vec<SlotOutcome>,
}

impl BinaryPatch {
    pub fn applied(&self) -> impl Iterator<Item = &ReplacementDirective> {
        self.outcomes.iter().filter_map(|o| match o {
            SlotOutcome::Applied(d) => Some(d),
            SlotOutcome::NotFound { .. } => None,
        })
    }

    pub fn changed(&self) -> bool {
        self.applied().next().is_some()
    }
}

/// Non-overlapping offsets of `needle` in `haystack`.
pub(crate) fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut positions = Vec::new();
    if needle.is_empty() || haystack.len() < needle.len() {
        return positions;
    }
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if &haystack[i..i + needle.len()] == needle {
            positions.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    positions
}

/// Applies `slots` in order to a copy of `input`, replacing the first
/// occurrence of each literal. The returned buffer always has `input`'s length.
///
/// `file` only labels the directives. A slot whose replacement is too long
/// fails the whole call; a slot whose literal is absent is reported as
/// `NotFound`.
pub fn patch_bytes(file: &Path, input: &[u8], slots: &[BinarySlot]) -> PatchResult<BinaryPatch> {
    let mut bytes = input.to_vec();
    let mut outcomes = Vec::with_capacity(slots.len());
    for slot in slots {
        let replacement = slot.padded()?;
        let hits = find_all(&bytes, &slot.literal);
        let Some(&offset) = hits.first() else {
            outcomes.push(SlotOutcome::NotFound {
                label: slot.label.clone(),
            });
            continue;
        };
        bytes[offset..offset + replacement.len()].copy_from_slice(&replacement);
        outcomes.push(SlotOutcome::Applied(ReplacementDirective {
            file: file.to_path_buf(),
            offset,
            original_len: slot.literal.len(),
            original: slot.literal.clone(),
            replacement,
            occurrences: hits.len(),
        }));
    }
    debug_assert_eq!(bytes.len(), input.len());
    Ok(BinaryPatch { bytes, outcomes })
}

/// Patches a binary file in place. Any I/O failure is fatal; the file is
/// replaced atomically and only when at least one slot applied.
pub fn patch_binary_file(
    path: &Path,
    slots: &[BinarySlot],
    reporter: &mut Reporter<'_>,
) -> PatchResult<Vec<ReplacementDirective>> {
    let content = fs::read(path).map_err(|e| PatchError::io(path, e))?;
    reporter.log(format!("Binary file: {}", path.display()));
    reporter.log(format!("File size: {} bytes", content.len()));

    for slot in slots {
        let desired = slot.desired();
        reporter.log(format!("{}:", slot.label));
        reporter.log(format!(
            "  Old URL: {} ({} bytes)",
            String::from_utf8_lossy(&slot.literal),
            slot.literal.len()
        ));
        reporter.log(format!("  New URL: {} ({} bytes)", desired, desired.len()));
        if desired.len() > slot.literal.len() {
            reporter.log(format!(
                "  ERROR: New URL is longer than old URL by {} bytes",
                desired.len() - slot.literal.len()
            ));
        }
    }

    let patch = patch_bytes(path, &content, slots)?;
    for outcome in &patch.outcomes {
        match outcome {
            SlotOutcome::Applied(d) => {
                reporter.log(format!(
                    "  Found literal at offset {}, replaced with: {}",
                    d.offset,
                    d.replacement_str()
                ));
                if d.occurrences > 1 {
                    reporter.warn(format!(
                        "{} occurrences of {} in {}; only the first was patched",
                        d.occurrences,
                        String::from_utf8_lossy(&d.original),
                        path.display()
                    ));
                }
            }
            SlotOutcome::NotFound { label } => {
                reporter.log(format!("  {} not found in {}", label, path.display()));
            }
        }
    }

    if patch.changed() {
        storage::replace_file(path, &patch.bytes).map_err(|e| PatchError::io(path, e))?;
        reporter.log("Binary file updated successfully");
    }
    Ok(patch.applied().cloned().collect())
}
