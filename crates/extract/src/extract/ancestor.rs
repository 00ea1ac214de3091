//! Bounded upward search from an anchor element to a related field.
//!
//! Result cards on the search page keep the vehicle name and its price in
//! sibling subtrees, so the price is found by climbing from the name towards
//! the card root and searching each ancestor's subtree.

use scraper::{ElementRef, Selector};

/// Where a field was found relative to its anchor.
#[derive(Debug, Clone, Copy)]
pub struct Association<'a> {
    /// The ancestor whose subtree contained the field.
    pub scope: ElementRef<'a>,
    /// The first element in `scope` matching the field marker.
    pub field: ElementRef<'a>,
    /// Distance from the anchor to `scope`; the parent is hop 1.
    pub hops: usize,
}

/// Climb at most `max_hops` ancestors from `anchor` looking for an element
/// matching `marker`.
///
/// The walk never examines `<body>` or anything above it, so a field from an
/// unrelated part of the page is never associated.
pub fn find_associated_field<'a>(
    anchor: ElementRef<'a>,
    marker: &Selector,
    max_hops: usize,
) -> Option<Association<'a>> {
    ancestor_elements(anchor)
        .take(max_hops)
        .enumerate()
        .find_map(|(index, scope)| {
            scope.select(marker).next().map(|field| Association {
                scope,
                field,
                hops: index + 1,
            })
        })
}

/// Element ancestors of `anchor`, nearest first, stopping before `<body>`.
pub(crate) fn ancestor_elements(anchor: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|element| !matches!(element.value().name(), "body" | "html"))
}
