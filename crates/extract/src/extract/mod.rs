//! Listing extraction from rendered search result pages.

mod ancestor;

use std::str::FromStr;

pub use self::ancestor::{Association, find_associated_field};
use crate::error::{ErrorKind, Result};
use crate::models::{Listing, normalize_text};
use crate::consts;
use exn::OptionExt;
use scraper::{ElementRef, Html};
use std::convert::Infallible;
use time::OffsetDateTime;
use tracing::instrument;

#[derive(Debug)]
pub struct Extractor {
    document: Html,
    source_url: String,
    max_hops: usize,
}
impl Extractor {
    pub fn from_document(document: Html) -> Self {
        Self {
            document,
            source_url: String::new(),
            max_hops: consts::DEFAULT_MAX_HOPS,
        }
    }

    pub fn from_html(html: &str) -> Self {
        Self::from_document(Html::parse_document(html))
    }

    /// URL recorded on every extracted [`Listing`].
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// Bound on how far above a name element the price may be.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Every listing whose name contains `name_filter`, in page order.
    ///
    /// Never fails: an item that cannot be read is logged and skipped, and a
    /// page without any name elements yields an empty list.
    #[instrument(skip(self), fields(source_url = %self.source_url))]
    pub fn listings(&self, name_filter: &str) -> Vec<Listing> {
        let detected_at = OffsetDateTime::now_utc();
        let mut listings = Vec::new();
        let mut candidates = 0usize;
        for (index, anchor) in self.document.select(&consts::NAME_SELECTOR).enumerate() {
            candidates += 1;
            match self.listing(anchor, name_filter, detected_at) {
                Ok(Some(listing)) => listings.push(listing),
                Ok(None) => {},
                Err(err) => tracing::warn!(index, error = ?err, "Skipping unreadable listing"),
            }
        }
        tracing::debug!(candidates, matched = listings.len(), "Listings extracted");
        listings
    }

    /// `Ok(None)` when the name doesn't match the filter.
    fn listing(&self, anchor: ElementRef<'_>, name_filter: &str, detected_at: OffsetDateTime) -> Result<Option<Listing>> {
        let name = Some(normalize_text(anchor.text().collect::<String>()))
            .filter(|name| !name.is_empty())
            .ok_or_raise(|| ErrorKind::MissingField("name"))?;
        if !name.contains(name_filter) {
            tracing::trace!(%name, "Name does not match filter");
            return Ok(None);
        }

        let association = find_associated_field(anchor, &consts::PRICE_SELECTOR, self.max_hops);
        let price = match &association {
            Some(found) => Some(normalize_text(found.field.text().collect::<String>()))
                .filter(|price| !price.is_empty())
                .unwrap_or_else(|| consts::UNKNOWN_PRICE.to_string()),
            None => {
                tracing::debug!(%name, max_hops = self.max_hops, "No price found near listing");
                consts::UNKNOWN_PRICE.to_string()
            },
        };
        // Year and badge are looked up in the card that held the price, or
        // just around the name when the card couldn't be identified.
        let scope = association.map(|found| found.scope).or_else(|| ancestor::ancestor_elements(anchor).next());

        Ok(Some(Listing {
            year: scope.and_then(|scope| year_text(scope, anchor)),
            site_marked_new: scope.is_some_and(has_new_marker),
            name,
            price,
            detected_at,
            source_url: self.source_url.clone(),
        }))
    }
}
impl FromStr for Extractor {
    type Err = Infallible;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_html(s))
    }
}
impl From<Html> for Extractor {
    fn from(document: Html) -> Self {
        Self::from_document(document)
    }
}

/// First year-looking `p`/`span` in `scope`, outside the name element.
fn year_text(scope: ElementRef<'_>, anchor: ElementRef<'_>) -> Option<String> {
    scope
        .select(&consts::YEAR_CANDIDATE_SELECTOR)
        .filter(|element| element.id() != anchor.id() && !element.ancestors().any(|node| node.id() == anchor.id()))
        .map(|element| normalize_text(element.text().collect::<String>()))
        .find(|text| text.contains(consts::YEAR_SUFFIX) && consts::YEAR_REGEX.is_match(text))
}

fn has_new_marker(scope: ElementRef<'_>) -> bool {
    let text = scope.text().collect::<String>();
    consts::NEW_MARKERS.iter().any(|marker| text.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <ul class="result">
            <li class="car">
              <div class="head"><span class="badge">NEW</span><p class="detais-name2">プリウス A ツーリングセレクション</p></div>
              <div class="detail"><p>2020(R02)年</p><p>走行 1.2万km</p></div>
              <div class="price"><p class="car-price-sub">153.7万円</p></div>
            </li>
            <li class="car">
              <div class="head"><p class="detais-name2">アクア G</p></div>
              <div class="price"><p class="car-price-sub">120万円</p></div>
            </li>
            <li class="car">
              <div class="head"><p class="detais-name2">
                プリウス S
              </p></div>
              <div class="detail"><span>年式 2019年</span></div>
              <div class="price"><p class="car-price-sub">98.5万円</p></div>
            </li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn extracts_matching_listings_in_page_order() {
        let listings = Extractor::from_html(SEARCH_PAGE)
            .with_source_url("https://example.com/search")
            .listings("プリウス");
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.name, "プリウス A ツーリングセレクション");
        assert_eq!(first.price, "153.7万円");
        assert_eq!(first.year.as_deref(), Some("2020(R02)年"));
        assert!(first.site_marked_new);
        assert_eq!(first.source_url, "https://example.com/search");

        let second = &listings[1];
        assert_eq!(second.name, "プリウス S");
        assert_eq!(second.price, "98.5万円");
        assert_eq!(second.year.as_deref(), Some("年式 2019年"));
        assert!(!second.site_marked_new);
    }

    #[test]
    fn empty_markup_yields_nothing() {
        assert!(Extractor::from_html("").listings("プリウス").is_empty());
        assert!(Extractor::from_html("<html><body><p>nothing</p></body></html>").listings("プリウス").is_empty());
    }

    #[test]
    fn missing_price_is_unknown() {
        let html = r#"<html><body><div><div><p class="detais-name2">プリウス Z</p><span>2021年</span></div></div></body></html>"#;
        let listings = Extractor::from_html(html).listings("プリウス");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, consts::UNKNOWN_PRICE);
        // Falls back to the name's parent for the year.
        assert_eq!(listings[0].year.as_deref(), Some("2021年"));
    }

    #[test]
    fn price_beyond_hop_bound_is_unknown() {
        let html = r#"<html><body><div><p class="car-price-sub">100万円</p><div><div><p class="detais-name2">プリウス</p></div></div></div></body></html>"#;
        assert_eq!(Extractor::from_html(html).with_max_hops(3).listings("プリウス")[0].price, "100万円");
        assert_eq!(Extractor::from_html(html).with_max_hops(2).listings("プリウス")[0].price, consts::UNKNOWN_PRICE);
    }

    #[test]
    fn malformed_item_is_skipped() {
        let html = r#"<html><body>
            <div><p class="detais-name2">   </p><p class="car-price-sub">1万円</p></div>
            <div><p class="detais-name2">プリウス</p><p class="car-price-sub">2万円</p></div>
        </body></html>"#;
        let listings = Extractor::from_html(html).listings("プリウス");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, "2万円");
    }

    #[test]
    fn year_in_name_is_not_the_model_year() {
        let html = r#"<html><body><div>
            <p class="detais-name2">プリウス <span>2023年</span>モデル</p>
            <p>2019(R01)年</p>
            <p class="car-price-sub">140万円</p>
        </div></body></html>"#;
        let listing = &Extractor::from_html(html).listings("プリウス")[0];
        assert_eq!(listing.year.as_deref(), Some("2019(R01)年"));

        let html = r#"<html><body><div><p class="detais-name2">プリウス 2023年モデル</p><p class="car-price-sub">140万円</p></div></body></html>"#;
        assert_eq!(Extractor::from_html(html).listings("プリウス")[0].year, None);
    }

    #[test]
    fn new_marker_in_japanese() {
        let html = r#"<html><body><div><em>新着</em><p class="detais-name2">プリウス</p><p class="car-price-sub">2万円</p></div></body></html>"#;
        assert!(Extractor::from_html(html).listings("プリウス")[0].site_marked_new);
    }
}
