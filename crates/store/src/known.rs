use crate::fingerprint::Fingerprint;
use carwatch_extract::Listing;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every listing reported so far, keyed by fingerprint.
///
/// Serialized as a plain JSON object. Entries are only ever added in normal
/// operation; the first sighting of a fingerprint is the one kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownSet {
    entries: BTreeMap<Fingerprint, Listing>,
}

impl KnownSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Fingerprint, &Listing)> {
        self.entries.iter()
    }

    /// Record `listings` as seen. Returns how many were not already known.
    pub fn apply(&mut self, listings: impl IntoIterator<Item = Listing>) -> usize {
        let mut inserted = 0;
        for listing in listings {
            let fingerprint = Fingerprint::of(&listing);
            if !self.entries.contains_key(&fingerprint) {
                self.entries.insert(fingerprint, listing);
                inserted += 1;
            }
        }
        inserted
    }
}
impl FromIterator<Listing> for KnownSet {
    fn from_iter<T: IntoIterator<Item = Listing>>(iter: T) -> Self {
        let mut known = Self::new();
        known.apply(iter);
        known
    }
}
