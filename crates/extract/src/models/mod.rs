pub(crate) mod listing;

pub use self::listing::Listing;

/// Collapse runs of whitespace (including full-width spaces) into single
/// ASCII spaces and trim the ends.
pub(crate) fn normalize_text(s: impl AsRef<str>) -> String {
    s.as_ref().split_whitespace().collect::<Vec<_>>().join(" ")
}
