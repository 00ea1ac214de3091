//! Change detection between a freshly parsed page and the known set.
//!
//! Nothing here mutates the [`KnownSet`]; recording what was reported is
//! the caller's job, via [`KnownSet::apply`].

use crate::fingerprint::Fingerprint;
use crate::known::KnownSet;
use carwatch_extract::Listing;
use std::collections::HashSet;

/// A listing together with whether this is the first time we've seen it.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub listing: Listing,
    pub fingerprint: Fingerprint,
    /// Absent from the known set, and not a repeat earlier on the same page.
    pub is_first_seen: bool,
}

/// Classify every listing in `current`, preserving page order.
pub fn classify(current: &[Listing], known: &KnownSet) -> Vec<Classified> {
    let mut seen = HashSet::new();
    current
        .iter()
        .map(|listing| {
            let fingerprint = Fingerprint::of(listing);
            let is_first_seen = !known.contains(&fingerprint) && seen.insert(fingerprint.clone());
            Classified {
                listing: listing.clone(),
                fingerprint,
                is_first_seen,
            }
        })
        .collect()
}

/// The first-seen subset of `current`, in page order.
pub fn diff(current: &[Listing], known: &KnownSet) -> Vec<Listing> {
    classify(current, known)
        .into_iter()
        .filter(|classified| classified.is_first_seen)
        .map(|classified| classified.listing)
        .collect()
}

/// Listings in `previous` that no longer appear in `current`.
pub fn removed(previous: &[Listing], current: &[Listing]) -> Vec<Listing> {
    let present: HashSet<Fingerprint> = current.iter().map(Fingerprint::of).collect();
    let mut reported = HashSet::new();
    previous
        .iter()
        .filter(|listing| {
            let fingerprint = Fingerprint::of(listing);
            !present.contains(&fingerprint) && reported.insert(fingerprint)
        })
        .cloned()
        .collect()
}
