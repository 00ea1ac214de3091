use crate::consts;
use time::OffsetDateTime;

/// A single vehicle listing as it appeared on a search result page.
///
/// Created by the extractor and never mutated afterwards. Identity across
/// scrapes is derived from `name` and `price` only (see the store's
/// fingerprint), so `detected_at` and `site_marked_new` may differ between
/// two sightings of the same vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Listing {
    /// Vehicle display name, e.g. "プリウス A ツーリングセレクション".
    pub name: String,
    /// Display price, e.g. "153.7万円", or [`UNKNOWN_PRICE`](crate::UNKNOWN_PRICE).
    pub price: String,
    /// Model year text, e.g. "2020(R02)年".
    #[cfg_attr(feature = "serde", serde(default))]
    pub year: Option<String>,
    /// The site rendered a "NEW"/"新着" badge next to this listing. Unrelated
    /// to whether we have seen the listing before.
    #[cfg_attr(feature = "serde", serde(default))]
    pub site_marked_new: bool,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub detected_at: OffsetDateTime,
    /// Search page the listing was scraped from.
    pub source_url: String,
}

impl Listing {
    /// Numeric price in 万円, if the display price contains one.
    pub fn price_man_yen(&self) -> Option<f64> {
        parse_man_yen(&self.price)
    }

    /// Four-digit model year, if the year text contains one.
    pub fn model_year(&self) -> Option<u16> {
        self.year.as_deref().and_then(parse_year)
    }
}

/// Extract the numeric amount from a price such as `"153.7万円"`.
pub fn parse_man_yen(price: &str) -> Option<f64> {
    let cleaned = price.replace(',', "");
    consts::PRICE_REGEX
        .captures(&cleaned)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

pub(crate) fn parse_year(text: &str) -> Option<u16> {
    consts::YEAR_REGEX
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
}
