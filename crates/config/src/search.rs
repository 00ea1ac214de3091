use serde::{Deserialize, Serialize};

/// Search conditions for the listing site.
///
/// These parameterize both the query string of the fetched URL and the
/// post-filtering applied to the parsed listings. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Listing search page, without query string.
    pub base_url: String,
    /// Site-specific car model code (`Cn` parameter).
    pub car_code: String,
    /// Listings whose name does not contain this substring are discarded.
    pub name_filter: String,
    /// Price ceiling in 万円 (`Pmx` parameter, also applied after parsing).
    pub price_max: Option<u32>,
    /// Oldest model year accepted (`Ymn` parameter, also applied after parsing).
    pub year_min: Option<u16>,
    /// Site-specific drivetrain code (`Drv` parameter); "2" selects 4WD/e-Four.
    pub drive_type: Option<String>,
    /// Restrict results to manufacturer-certified vehicles.
    pub certified_only: bool,
    /// How many ancestors of a name element are searched for its price.
    pub ancestor_hops: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://toyota.jp/ucar/carlist/".to_string(),
            car_code: "01_プリウス".to_string(),
            name_filter: "プリウス".to_string(),
            price_max: Some(160),
            year_min: Some(2019),
            drive_type: Some("2".to_string()),
            certified_only: true,
            ancestor_hops: 10,
        }
    }
}

impl SearchConfig {
    /// One-line human summary, used in logs.
    pub fn describe(&self) -> String {
        let mut parts = vec![self.name_filter.clone()];
        if let Some(year) = self.year_min {
            parts.push(format!("{year}+"));
        }
        if let Some(drive) = &self.drive_type {
            parts.push(format!("drivetrain {drive}"));
        }
        if let Some(price) = self.price_max {
            parts.push(format!("<= {price}万円"));
        }
        if self.certified_only {
            parts.push("certified only".to_string());
        }
        parts.join(", ")
    }
}
