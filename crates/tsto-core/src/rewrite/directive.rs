//! Record of one applied binary replacement.

use serde::Serialize;
use std::path::PathBuf;

/// Created when an occurrence is replaced; never mutated afterwards. Only used
/// for logging and the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacementDirective {
    pub file: PathBuf,
    pub offset: usize,
    pub original_len: usize,
    #[serde(serialize_with = "lossy_utf8")]
    pub original: Vec<u8>,
    #[serde(serialize_with = "lossy_utf8")]
    pub replacement: Vec<u8>,
    /// Occurrences of the literal in the buffer; only the first was replaced.
    pub occurrences: usize,
}

impl ReplacementDirective {
    pub fn replacement_str(&self) -> String {
        String::from_utf8_lossy(&self.replacement).into_owned()
    }
}

fn lossy_utf8<S: serde::Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(bytes))
}
