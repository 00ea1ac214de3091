//! Output of the offline CLI commands.

use crate::error::{ErrorKind, Result};
use carwatch_config::SearchConfig;
use carwatch_extract::{Criteria, Extractor};
use carwatch_store::{JsonStore, KnownSet, classify};
use exn::ResultExt;
use std::path::Path;
use time::format_description::well_known::Rfc3339;

/// Known-set summary, oldest sighting first.
pub async fn status(store: &JsonStore) -> String {
    let known = store.load().await;
    let mut out = format!("{} known listing(s) in {}\n", known.len(), store.primary_path().display());
    let mut entries: Vec<_> = known.iter().collect();
    entries.sort_by_key(|(_, listing)| listing.detected_at);
    for (fingerprint, listing) in entries {
        let seen = listing.detected_at.format(&Rfc3339).unwrap_or_default();
        out.push_str(&format!("{fingerprint}  {seen}  {}  {}\n", listing.price, listing.name));
    }
    out
}

/// Parse saved markup and describe every listing it contains, as the
/// monitor would see it against `known`.
pub fn inspect_html(html: &str, search: &SearchConfig, known: &KnownSet) -> String {
    let listings = Extractor::from_html(html)
        .with_max_hops(search.ancestor_hops)
        .listings(&search.name_filter);
    let criteria = Criteria {
        price_max: search.price_max.map(f64::from),
        year_min: search.year_min,
    };
    let mut out = format!("{} listing(s) matching '{}'\n", listings.len(), search.name_filter);
    for classified in classify(&listings, known) {
        let listing = &classified.listing;
        out.push_str(&format!(
            "{}  {}\n    price: {}  year: {}  site NEW: {}  first seen: {}  within filters: {}\n",
            classified.fingerprint,
            listing.name,
            listing.price,
            listing.year.as_deref().unwrap_or("-"),
            yes_no(listing.site_marked_new),
            yes_no(classified.is_first_seen),
            yes_no(criteria.retains(listing)),
        ));
    }
    out
}

pub async fn inspect(path: &Path, search: &SearchConfig, store: &JsonStore) -> Result<String> {
    let bytes = tokio::fs::read(path).await.or_raise(|| ErrorKind::Io)?;
    let html = String::from_utf8_lossy(&bytes);
    Ok(inspect_html(&html, search, &store.load().await))
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carwatch_extract::Listing;
    use time::OffsetDateTime;

    const HTML: &str = r#"<html><body>
        <div><span>NEW</span><p class="detais-name2">プリウス A</p><p>2020年</p><p class="car-price-sub">150万円</p></div>
        <div><p class="detais-name2">プリウス S</p><p>2017年</p><p class="car-price-sub">90万円</p></div>
    </body></html>"#;

    #[test]
    fn inspect_describes_each_listing() {
        let known: KnownSet = [Listing {
            name: "プリウス S".to_string(),
            price: "90万円".to_string(),
            year: None,
            site_marked_new: false,
            detected_at: OffsetDateTime::UNIX_EPOCH,
            source_url: String::new(),
        }]
        .into_iter()
        .collect();
        let out = inspect_html(HTML, &SearchConfig::default(), &known);
        assert!(out.starts_with("2 listing(s) matching 'プリウス'\n"));
        assert!(out.contains("price: 150万円  year: 2020年  site NEW: yes  first seen: yes  within filters: yes"));
        assert!(out.contains("price: 90万円  year: 2017年  site NEW: no  first seen: no  within filters: no"));
    }

    #[tokio::test]
    async fn status_lists_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("vehicles.json"), dir.path().join("backup.json"));
        assert!(status(&store).await.starts_with("0 known listing(s)"));

        let known: KnownSet = Extractor::from_html(HTML).listings("プリウス").into_iter().collect();
        store.save(&known).await.unwrap();
        let out = status(&store).await;
        assert!(out.starts_with("2 known listing(s)"));
        assert!(out.contains("150万円  プリウス A"));
    }
}
