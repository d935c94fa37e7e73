//! Replacement endpoints and URL mappings.

use crate::error::{PatchError, PatchResult};

/// Path suffix the DLC constant encodes after its host.
pub const DLC_SUFFIX: &str = "/static/";

/// The two endpoints a patched client is redirected to, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    game: String,
    dlc: String,
}

impl Endpoints {
    /// Trims whitespace and trailing slashes; both values must be non-empty.
    pub fn new(game: &str, dlc: &str) -> PatchResult<Self> {
        Ok(Self {
            game: normalize(game, "game server")?,
            dlc: normalize(dlc, "DLC server")?,
        })
    }

    /// Game server base URL without trailing slash.
    pub fn game(&self) -> &str {
        &self.game
    }

    /// DLC server base URL without trailing slash.
    pub fn dlc(&self) -> &str {
        &self.dlc
    }

    /// DLC base with the fixed `/static/` suffix appended.
    pub fn dlc_static(&self) -> String {
        with_suffix(&self.dlc, DLC_SUFFIX)
    }
}

fn normalize(raw: &str, which: &'static str) -> PatchResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(PatchError::EmptyEndpoint { which });
    }
    Ok(trimmed.to_string())
}

/// Strips trailing `/` from `base` and appends `suffix`.
pub fn with_suffix(base: &str, suffix: &str) -> String {
    let mut out = base.trim_end_matches('/').to_string();
    out.push_str(suffix);
    out
}

/// Ordered (original literal → replacement) pairs. Order is scan and report
/// order; keys are matched exactly and case-sensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMapping {
    pairs: Vec<(String, String)>,
}

impl UrlMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair; a repeated key keeps its first position and takes the new value.
    pub fn insert(&mut self, original: impl Into<String>, replacement: impl Into<String>) {
        let original = original.into();
        let replacement = replacement.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == original) {
            Some(pair) => pair.1 = replacement,
            None => self.pairs.push((original, replacement)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UrlMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = UrlMapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}
