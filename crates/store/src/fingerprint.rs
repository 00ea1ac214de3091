use carwatch_extract::Listing;
use derive_more::Display;
use serde::{Deserialize, Serialize};

const FINGERPRINT_LEN: usize = 16;

/// Stable identity of a listing across scrapes.
///
/// Derived from the name and display price only: the same vehicle seen at a
/// different time, position, or badge state has the same fingerprint, and a
/// price change makes it a different listing.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(listing: &Listing) -> Self {
        let hash = blake3::hash(format!("{}_{}", listing.name, listing.price).as_bytes());
        let mut hex = hash.to_hex().to_string();
        hex.truncate(FINGERPRINT_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<&Listing> for Fingerprint {
    fn from(listing: &Listing) -> Self {
        Self::of(listing)
    }
}

pub fn fingerprint(listing: &Listing) -> Fingerprint {
    Fingerprint::of(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use time::macros::datetime;

    fn listing(name: &str, price: &str, detected_at: OffsetDateTime) -> Listing {
        Listing {
            name: name.to_string(),
            price: price.to_string(),
            year: Some("2020年".to_string()),
            site_marked_new: false,
            detected_at,
            source_url: "https://example.com/".to_string(),
        }
    }

    #[test]
    fn deterministic_and_short() {
        let a = listing("プリウス S", "153.7万円", OffsetDateTime::UNIX_EPOCH);
        assert_eq!(fingerprint(&a), fingerprint(&a));
        assert_eq!(fingerprint(&a).as_str().len(), FINGERPRINT_LEN);
        assert!(fingerprint(&a).as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ignores_detection_details() {
        let a = listing("プリウス S", "153.7万円", OffsetDateTime::UNIX_EPOCH);
        let mut b = listing("プリウス S", "153.7万円", datetime!(2025-06-01 09:00 +9));
        b.site_marked_new = true;
        b.year = None;
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn name_and_price_both_matter() {
        let a = listing("プリウス S", "153.7万円", OffsetDateTime::UNIX_EPOCH);
        let b = listing("プリウス S", "149.0万円", OffsetDateTime::UNIX_EPOCH);
        let c = listing("プリウス A", "153.7万円", OffsetDateTime::UNIX_EPOCH);
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }
}
