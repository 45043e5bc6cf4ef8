//! Link resolution - translating offsets between a source document and a
//! derived product through a product's range maps.

use crate::product::Product;
use crate::range::OffsetRange;

/// Which of a product's two maps a query goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Source offsets -> product offsets (`range_map`).
    Forward,
    /// Product offsets -> source offsets (`range_map_rev`).
    Reverse,
}

/// Intervals in the other document corresponding to `offset`.
///
/// First-match scan in entry sequence order; `None` means the offset is
/// not covered by any entry (explicit absence, not an error).
pub fn resolve(product: &Product, offset: usize, direction: Direction) -> Option<&[OffsetRange]> {
    let map = match direction {
        Direction::Forward => &product.range_map,
        Direction::Reverse => &product.range_map_rev,
    };
    map.lookup(offset).map(|entry| entry.target.as_slice())
}

/// Resolve one selection range.
///
/// Only the selection's START offset is used as the query point; a
/// multi-offset selection maps via its anchor position alone. On a miss
/// the result is a zero-length selection at the document origin rather
/// than nothing, so the applied selection list never goes stale - at the
/// cost of a visible jump to offset 0. Documented behavior.
pub fn resolve_selection(
    product: &Product,
    selection: &OffsetRange,
    direction: Direction,
) -> Vec<OffsetRange> {
    match resolve(product, selection.start, direction) {
        Some(targets) => targets.to_vec(),
        None => vec![OffsetRange::new(0, 0)],
    }
}

/// Resolve a whole selection list, preserving input order. An entry that
/// resolves to an empty target set contributes nothing to the union.
pub fn resolve_selections(
    product: &Product,
    selections: &[OffsetRange],
    direction: Direction,
) -> Vec<OffsetRange> {
    let mut union = Vec::new();
    for selection in selections {
        union.extend(resolve_selection(product, selection, direction));
    }
    union
}
