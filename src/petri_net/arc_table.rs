//! The sparse weighted arc table and its bipartition-checking edge kind.
//!
//! Named `Edge` rather than `Arc` — a weighted place/transition connection
//! is called an "arc" everywhere else in this crate's public API — to avoid
//! shadowing `std::sync::Arc`, which the rest of the engine uses pervasively
//! for shared ownership of embedded sub-nets.

use crate::uri::Uri;
use std::collections::HashMap;

/// A directed edge, carrying which side is the place and which is the
/// transition so the bipartition invariant (an arc's endpoints are of
/// opposite kinds) can be checked once at `connect` time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Edge {
    PlaceToTransition(Uri, Uri),
    TransitionToPlace(Uri, Uri),
}

impl Edge {
    pub fn endpoints(&self) -> (&Uri, &Uri) {
        match self {
            Edge::PlaceToTransition(p, t) => (p, t),
            Edge::TransitionToPlace(t, p) => (t, p),
        }
    }
}

/// `(src_uri, dst_uri) -> weight`. Missing pairs have weight 0.
#[derive(Debug, Default)]
pub struct ArcTable {
    weights: HashMap<(Uri, Uri), u32, ahash::RandomState>,
}

impl ArcTable {
    pub fn new() -> Self {
        ArcTable {
            weights: HashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// `weight(p, t)` (input weight) or `weight(t, p)` (output weight).
    /// Missing pairs yield 0.
    pub fn weight(&self, src: &Uri, dst: &Uri) -> u32 {
        self.weights
            .get(&(src.clone(), dst.clone()))
            .copied()
            .unwrap_or(0)
    }

    pub fn contains(&self, src: &Uri, dst: &Uri) -> bool {
        self.weights.contains_key(&(src.clone(), dst.clone()))
    }

    pub fn insert(&mut self, src: Uri, dst: Uri, weight: u32) {
        self.weights.insert((src, dst), weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(Uri, Uri), &u32)> {
        self.weights.iter()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pairs_are_weight_zero() {
        let table = ArcTable::new();
        assert_eq!(table.weight(&Uri::new("P0"), &Uri::new("T0")), 0);
    }

    #[test]
    fn insert_then_weight_round_trips() {
        let mut table = ArcTable::new();
        table.insert(Uri::new("P0"), Uri::new("T0"), 3);
        assert_eq!(table.weight(&Uri::new("P0"), &Uri::new("T0")), 3);
        assert!(table.contains(&Uri::new("P0"), &Uri::new("T0")));
    }
}
