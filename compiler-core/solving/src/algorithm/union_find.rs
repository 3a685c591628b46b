//! Disjoint sets over points.
//!
//! The parent table sits behind an [`Arc`] and is copied only on the first
//! write after a clone, which keeps forking for speculative instance search
//! cheap.

use std::sync::Arc;

use points::PointId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parents: Arc<FxHashMap<PointId, PointId>>,
}

impl UnionFind {
    /// Returns the representative of `point`, recording it as a singleton if unseen.
    pub fn find(&mut self, point: PointId) -> PointId {
        if !self.parents.contains_key(&point) {
            Arc::make_mut(&mut self.parents).insert(point, point);
            return point;
        }
        self.representative(point)
    }

    /// Returns the representative of `point` without recording it.
    pub fn representative(&self, mut point: PointId) -> PointId {
        while let Some(&parent) = self.parents.get(&point) {
            if parent == point {
                break;
            }
            point = parent;
        }
        point
    }

    /// Merges the sets containing `a` and `b`, making `a` the representative.
    ///
    /// Returns the previous representatives of both sets.
    pub fn union(&mut self, a: PointId, b: PointId) -> (PointId, PointId) {
        let a_root = self.find(a);
        let b_root = self.find(b);

        let parents = Arc::make_mut(&mut self.parents);
        parents.insert(a_root, a);
        parents.insert(b_root, a);
        parents.insert(a, a);

        (a_root, b_root)
    }

    pub fn contains(&self, point: PointId) -> bool {
        self.parents.contains_key(&point)
    }

    /// Iterates over every point that has been seen.
    pub fn points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.parents.keys().copied()
    }
}
