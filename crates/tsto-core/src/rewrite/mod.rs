//! URL rewriting engines.
//!
//! - `text`: unconstrained substring replacement in text resources.
//! - `binary`: length-preserving literal replacement in native binaries.
//! - `plist`: key/value edits in property-list documents.

pub mod binary;
pub mod plist;
pub mod text;

mod directive;

pub use binary::{patch_binary_file, patch_bytes, BinaryPatch, BinarySlot, PadStyle, SlotOutcome};
pub use directive::ReplacementDirective;
pub use plist::{update_manifest, update_manifest_file, KeyEdit, ManifestEdit};
pub use text::{rewrite_text, rewrite_text_file, rewrite_text_tree, TextRewrite};
