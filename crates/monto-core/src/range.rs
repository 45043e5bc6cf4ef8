//! Offset ranges and the directional range maps that link a source
//! document to a derived product.

use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)` of character offsets into a document.
///
/// A zero-length range (`start == end`) contains no offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetRange {
    pub start: usize,
    pub end: usize,
}

impl OffsetRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether `offset` falls inside the interval (`start <= offset < end`).
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Move both bounds forward by `delta`. Used to rebase intervals that
    /// were expressed relative to an appended chunk into the coordinate
    /// space of the full, now-longer content.
    pub fn shift(&mut self, delta: usize) {
        self.start += delta;
        self.end += delta;
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_well_formed(&self) -> bool {
        self.start <= self.end
    }
}

impl std::fmt::Display for OffsetRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One directed mapping entry: offsets within `source` correspond to the
/// union of the `target` intervals.
///
/// `target` is semantically a set; duplicates are tolerated and order only
/// matters as query priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub source: OffsetRange,
    pub target: Vec<OffsetRange>,
}

impl RangeEntry {
    pub fn new(source: OffsetRange, target: Vec<OffsetRange>) -> Self {
        Self { source, target }
    }
}

/// Ordered sequence of [`RangeEntry`], one direction of correspondence.
///
/// Query policy: the FIRST entry (by sequence position) whose `source`
/// contains the query offset wins, regardless of how many later entries
/// also match. Later re-publications rely on this for determinism.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeMap(Vec<RangeEntry>);

impl RangeMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_entries(entries: Vec<RangeEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[RangeEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First entry whose `source` interval contains `offset`, or `None`
    /// when the offset is not covered by any entry.
    pub fn lookup(&self, offset: usize) -> Option<&RangeEntry> {
        self.0.iter().find(|entry| entry.source.contains(offset))
    }

    /// Merge an appended forward map (source offsets -> product offsets)
    /// into this one.
    ///
    /// `new` carries target offsets relative to the appended chunk, so
    /// every target interval is first rebased by `prior_len` (the product
    /// content length before the append). Source intervals index the
    /// unchanged source document and are never shifted.
    ///
    /// If this map is empty the shifted `new` map replaces it wholesale.
    /// Otherwise each new entry extends the target sets of old entries
    /// whose `source` is exactly equal (both bounds); a new entry with no
    /// matching old source key is dropped. The drop is a quirk of the
    /// append protocol (producers re-send the same source keys across
    /// increments) and is preserved as-is.
    pub fn merge_forward(&mut self, mut new: RangeMap, prior_len: usize) {
        for entry in &mut new.0 {
            for target in &mut entry.target {
                target.shift(prior_len);
            }
        }

        if self.0.is_empty() {
            self.0 = new.0;
            return;
        }

        for entry in new.0 {
            for old in self.0.iter_mut().filter(|old| old.source == entry.source) {
                old.target.extend(entry.target.iter().copied());
            }
        }
    }

    /// Merge an appended reverse map (product offsets -> source offsets)
    /// into this one.
    ///
    /// Here it is the `source` side that indexes the growing product
    /// content, so each new entry's source interval is rebased by
    /// `prior_len` and the shifted entries are simply concatenated:
    /// reverse-map source keys are always fresh, never duplicated.
    pub fn merge_reverse(&mut self, mut new: RangeMap, prior_len: usize) {
        for entry in &mut new.0 {
            entry.source.shift(prior_len);
        }
        self.0.extend(new.0);
    }

    /// All source and target intervals are well-formed (`start <= end`).
    pub fn is_well_formed(&self) -> bool {
        self.0.iter().all(|entry| {
            entry.source.is_well_formed() && entry.target.iter().all(|t| t.is_well_formed())
        })
    }

    /// Largest target bound in the map (0 when empty).
    pub fn max_target_bound(&self) -> usize {
        self.0
            .iter()
            .flat_map(|entry| entry.target.iter())
            .map(|t| t.end)
            .max()
            .unwrap_or(0)
    }

    /// Largest source bound in the map (0 when empty).
    pub fn max_source_bound(&self) -> usize {
        self.0.iter().map(|entry| entry.source.end).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(s: (usize, usize), targets: &[(usize, usize)]) -> RangeEntry {
        RangeEntry::new(
            OffsetRange::new(s.0, s.1),
            targets.iter().map(|&(a, b)| OffsetRange::new(a, b)).collect(),
        )
    }

    #[test]
    fn test_containment() {
        let r = OffsetRange::new(2, 5);
        assert!(!r.contains(1));
        assert!(r.contains(2));
        assert!(r.contains(4));
        assert!(!r.contains(5));
    }

    #[test]
    fn test_zero_length_contains_nothing() {
        let r = OffsetRange::new(3, 3);
        assert!(!r.contains(2));
        assert!(!r.contains(3));
        assert!(!r.contains(4));
        assert!(r.is_empty());
    }

    #[test]
    fn test_shift() {
        let mut r = OffsetRange::new(0, 3);
        r.shift(15);
        assert_eq!(r, OffsetRange::new(15, 18));
    }

    #[test]
    fn test_lookup_first_match_wins() {
        // Overlapping entries: the first by sequence position wins.
        let map = RangeMap::from_entries(vec![
            entry((0, 10), &[(0, 1)]),
            entry((5, 15), &[(1, 2)]),
        ]);

        let hit = map.lookup(7).unwrap();
        assert_eq!(hit.target, vec![OffsetRange::new(0, 1)]);

        let hit = map.lookup(12).unwrap();
        assert_eq!(hit.target, vec![OffsetRange::new(1, 2)]);

        assert!(map.lookup(15).is_none());
    }

    #[test]
    fn test_merge_forward_into_empty() {
        let mut old = RangeMap::new();
        let new = RangeMap::from_entries(vec![entry((0, 2), &[(0, 3)])]);

        old.merge_forward(new, 10);

        // Targets rebased, sources untouched.
        assert_eq!(old.entries(), &[entry((0, 2), &[(10, 13)])]);
    }

    #[test]
    fn test_merge_forward_unions_matching_source() {
        // Spec'd example: old {5,10}->[{0,3}], append {5,10}->[{0,3}] at
        // prior length 15 yields {5,10}->[{0,3},{15,18}].
        let mut old = RangeMap::from_entries(vec![entry((5, 10), &[(0, 3)])]);
        let new = RangeMap::from_entries(vec![entry((5, 10), &[(0, 3)])]);

        old.merge_forward(new, 15);

        assert_eq!(old.entries(), &[entry((5, 10), &[(0, 3), (15, 18)])]);
    }

    #[test]
    fn test_merge_drops_unknown_source_key() {
        // Appended entries whose source key is absent from a non-empty old
        // map are dropped: an append can only extend pre-existing keys.
        let mut old = RangeMap::from_entries(vec![entry((5, 10), &[(0, 3)])]);
        let snapshot = old.clone();
        let new = RangeMap::from_entries(vec![entry((20, 25), &[(0, 2)])]);

        old.merge_forward(new, 15);

        assert_eq!(old, snapshot);
    }

    #[test]
    fn test_merge_forward_requires_exact_source_equality() {
        // Overlap is not enough; both bounds must match.
        let mut old = RangeMap::from_entries(vec![entry((5, 10), &[(0, 3)])]);
        let new = RangeMap::from_entries(vec![entry((5, 9), &[(0, 1)])]);

        old.merge_forward(new, 3);

        assert_eq!(old.entries(), &[entry((5, 10), &[(0, 3)])]);
    }

    #[test]
    fn test_merge_reverse_shifts_sources_and_concatenates() {
        let mut old = RangeMap::from_entries(vec![entry((0, 2), &[(0, 2)])]);
        let new = RangeMap::from_entries(vec![entry((0, 3), &[(4, 7)])]);

        old.merge_reverse(new, 2);

        assert_eq!(
            old.entries(),
            &[entry((0, 2), &[(0, 2)]), entry((2, 5), &[(4, 7)])]
        );
    }

    #[test]
    fn test_bounds_helpers() {
        let map = RangeMap::from_entries(vec![
            entry((0, 4), &[(1, 9)]),
            entry((6, 7), &[(2, 3), (0, 5)]),
        ]);
        assert_eq!(map.max_target_bound(), 9);
        assert_eq!(map.max_source_bound(), 7);
        assert_eq!(RangeMap::new().max_target_bound(), 0);
    }

    #[test]
    fn test_serde_shape() {
        let map = RangeMap::from_entries(vec![entry((0, 2), &[(0, 2)])]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"[{"source":{"start":0,"end":2},"target":[{"start":0,"end":2}]}]"#);

        let back: RangeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
