//! Padding a shorter replacement up to the original literal's length.

use crate::error::{PatchError, PatchResult};

/// How filler bytes are chosen for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadStyle {
    /// URL with path semantics: `./` pairs, then one `/` if a byte is left.
    PathSegments,
    /// Plain host URL: `/` repeated.
    TrailingSlashes,
}

/// Pads `value` to exactly `target` bytes.
///
/// Fails with `ReplacementTooLong` when `value` is already longer than
/// `target`; never truncates. A value of exactly `target` bytes is returned
/// unchanged.
pub fn pad_to(value: &[u8], target: usize, style: PadStyle) -> PatchResult<Vec<u8>> {
    if value.len() > target {
        return Err(PatchError::ReplacementTooLong {
            replacement: String::from_utf8_lossy(value).into_owned(),
            old_len: target,
            new_len: value.len(),
        });
    }
    let mut out = Vec::with_capacity(target);
    out.extend_from_slice(value);
    match style {
        PadStyle::PathSegments => {
            while out.len() + 1 < target {
                out.extend_from_slice(b"./");
            }
            if out.len() < target {
                out.push(b'/');
            }
        }
        PadStyle::TrailingSlashes => out.resize(target, b'/'),
    }
    debug_assert_eq!(out.len(), target);
    Ok(out)
}
