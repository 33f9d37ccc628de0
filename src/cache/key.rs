//! Canonical cache keys
//!
//! A price lookup for (A, B) and (B, A) hits the same entry: addresses are
//! trimmed, sorted and de-duplicated before being joined. Addresses are
//! case-sensitive (base58), so no case folding is applied.

use crate::types::TokenPair;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(String);

impl PairKey {
    /// Order-independent key for an arbitrary address set
    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parts: Vec<String> = addresses
            .into_iter()
            .map(|a| a.as_ref().trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        parts.sort();
        parts.dedup();
        PairKey(parts.join(","))
    }

    pub fn from_pair(pair: &TokenPair) -> Self {
        Self::from_addresses([&pair.from_token, &pair.to_token])
    }

    /// Addresses encoded in this key, in canonical order
    pub fn addresses(&self) -> Vec<String> {
        if self.0.is_empty() {
            return Vec::new();
        }
        self.0.split(',').map(str::to_string).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&TokenPair> for PairKey {
    fn from(pair: &TokenPair) -> Self {
        PairKey::from_pair(pair)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
