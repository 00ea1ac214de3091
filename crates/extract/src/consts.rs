use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Placeholder stored when no price could be associated with a name element.
pub const UNKNOWN_PRICE: &str = "unknown";
/// Default bound on the ancestor walk from a name element to its price.
pub const DEFAULT_MAX_HOPS: usize = 10;
/// Substrings marking a listing as newly arrived on the site.
pub(crate) const NEW_MARKERS: [&str; 2] = ["NEW", "新着"];
pub(crate) const YEAR_SUFFIX: char = '年';

// Vehicle name inside each search result card.
selector!(NAME_SELECTOR, "p.detais-name2");
// Total price ("153.7万円") somewhere in the same card.
selector!(PRICE_SELECTOR, "p.car-price-sub");
selector!(YEAR_CANDIDATE_SELECTOR, "p, span");
regex!(PRICE_REGEX, r"(\d+(?:\.\d+)?)万円");
regex!(YEAR_REGEX, r"((?:19|20)\d{2})");
