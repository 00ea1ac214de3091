use crate::models::Listing;

/// Numeric post-filters applied after extraction.
///
/// Permissive: a listing whose price or year can't be parsed is kept, since
/// dropping it silently would hide a vehicle the site already filtered for us.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Criteria {
    /// Inclusive price ceiling in 万円.
    pub price_max: Option<f64>,
    /// Inclusive minimum model year.
    pub year_min: Option<u16>,
}

impl Criteria {
    pub fn retains(&self, listing: &Listing) -> bool {
        let price_ok = match (self.price_max, listing.price_man_yen()) {
            (Some(max), Some(price)) => price <= max,
            _ => true,
        };
        let year_ok = match (self.year_min, listing.model_year()) {
            (Some(min), Some(year)) => year >= min,
            _ => true,
        };
        price_ok && year_ok
    }

    pub fn apply(&self, listings: Vec<Listing>) -> Vec<Listing> {
        let before = listings.len();
        let kept: Vec<Listing> = listings.into_iter().filter(|listing| self.retains(listing)).collect();
        if kept.len() != before {
            tracing::debug!(before, after = kept.len(), "Listings filtered by criteria");
        }
        kept
    }
}
