//! Region index (C3): base-address → region lookup over one snapshot.
//!
//! Strictly shorter-lived than the snapshot it indexes and never owns a
//! region buffer — it exists only to make the differ's "does this base
//! exist in the old snapshot" check O(1) instead of O(regions).

use crate::snapshot::{Snapshot, SnapshotRegion};
use std::collections::HashMap;

/// Maps a region's base address to its position in the backing snapshot's
/// region list. Capacity is sized from the region count per spec §4.3
/// (`2n - 1`, minimum 16); `std::collections::HashMap` already chains
/// internally, so a duplicate `base` (impossible per §3's uniqueness
/// invariant, but handled defensively) simply overwrites like the
/// original's `hash_map_put`.
pub struct RegionIndex<'a> {
    snapshot: &'a Snapshot,
    by_base: HashMap<u64, usize>,
}

impl<'a> RegionIndex<'a> {
    pub fn build(snapshot: &'a Snapshot) -> Self {
        let capacity = (2 * snapshot.region_count()).saturating_sub(1).max(16);
        let mut by_base = HashMap::with_capacity(capacity);
        for (i, region) in snapshot.regions.iter().enumerate() {
            by_base.insert(region.base, i);
        }
        Self { snapshot, by_base }
    }

    /// Look up the region with the given base address, if any.
    pub fn get(&self, base: u64) -> Option<&'a SnapshotRegion> {
        self.by_base.get(&base).map(|&i| &self.snapshot.regions[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotRegion;

    fn region(base: u64, bytes: &[u8]) -> SnapshotRegion {
        SnapshotRegion {
            base,
            len: bytes.len(),
            data: Some(bytes.to_vec()),
        }
    }

    #[test]
    fn finds_region_by_base() {
        let snap = Snapshot {
            regions: vec![region(0x1000, &[1, 2, 3]), region(0x2000, &[4, 5])],
        };
        let index = RegionIndex::build(&snap);
        assert_eq!(index.get(0x1000).unwrap().bytes(), &[1, 2, 3]);
        assert_eq!(index.get(0x2000).unwrap().bytes(), &[4, 5]);
        assert!(index.get(0x3000).is_none());
    }

    #[test]
    fn empty_snapshot_has_minimum_capacity_and_no_hits() {
        let snap = Snapshot::default();
        let index = RegionIndex::build(&snap);
        assert!(index.get(0x1000).is_none());
    }
}
