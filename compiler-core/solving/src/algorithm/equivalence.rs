//! Equivalence classes of points and the concrete types unified onto them.

use std::iter;
use std::sync::Arc;

use itertools::Itertools;
use points::{PointId, Points};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::algorithm::union_find::UnionFind;
use crate::core::{Constructed, Group, Substitutions, Type};

/// Handle to a substitution map awaiting normalisation in [`Equivalence::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeferredId(u32);

impl DeferredId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct Equivalence {
    union_find: UnionFind,
    groups: Arc<FxHashMap<PointId, Vec<Type>>>,
    deferred: Arc<Vec<Substitutions>>,
    error: bool,
}

/// The materialised result of solving.
#[derive(Debug, Default)]
pub struct Finished {
    pub groups: Vec<Group>,
    pub deferred: Vec<Substitutions>,
}

impl Equivalence {
    /// Determines if any unification failed since this state was created or forked.
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Creates an independent copy for speculation.
    ///
    /// The copy starts with a clear error flag so that it reports only the
    /// failures of its own branch.
    pub fn fork(&self) -> Equivalence {
        Equivalence { error: false, ..self.clone() }
    }

    /// Replaces this state with a speculative branch, keeping earlier failures.
    pub fn commit(&mut self, fork: Equivalence) {
        let error = self.error || fork.error;
        *self = fork;
        self.error = error;
    }

    pub fn find(&mut self, point: PointId) -> PointId {
        self.union_find.find(point)
    }

    /// Returns the types recorded for the class of `point`.
    pub fn types_of(&self, point: PointId) -> &[Type] {
        let representative = self.union_find.representative(point);
        self.groups.get(&representative).map(Vec::as_slice).unwrap_or_default()
    }

    #[tracing::instrument(skip_all, name = "unify")]
    pub fn unify(&mut self, left: &Type, right: &Type) {
        self.unify_core(left, right);
    }

    /// Returns whether a conflict was found anywhere below `left` and `right`.
    ///
    /// A conflict is recorded on every point side at each level it passes
    /// through, so a class whose constructed types disagree only in their
    /// children still carries both types.
    fn unify_core(&mut self, left: &Type, right: &Type) -> bool {
        if left == right {
            return false;
        }

        if let (&Type::Point(left), &Type::Point(right)) = (left, right) {
            return self.unify_points(left, right);
        }

        let left_resolved = self.resolve_shallow(left);
        let right_resolved = self.resolve_shallow(right);

        let conflict = match (&left_resolved, &right_resolved) {
            (&Type::Point(point), Type::Constructed(_)) => {
                self.insert(point, right_resolved.clone());
                return false;
            }
            (Type::Constructed(_), &Type::Point(point)) => {
                self.insert(point, left_resolved.clone());
                return false;
            }
            (Type::Point(_), Type::Point(_)) => {
                unreachable!("invariant violated: constructed type resolved to a point")
            }
            (Type::Constructed(l), Type::Constructed(r)) => {
                if l.tag == r.tag && l.children.len() == r.children.len() {
                    let children = iter::zip(l.children.iter(), r.children.iter());
                    children.fold(false, |conflict, (l, r)| self.unify_core(l, r) || conflict)
                } else {
                    tracing::debug!(left = ?l.tag, right = ?r.tag, "conflict");
                    self.error = true;
                    true
                }
            }
        };

        if conflict {
            for side in [left, right] {
                if let &Type::Point(point) = side {
                    self.insert(point, left_resolved.clone());
                    self.insert(point, right_resolved.clone());
                }
            }
        }

        conflict
    }

    fn unify_points(&mut self, left: PointId, right: PointId) -> bool {
        let left_root = self.union_find.find(left);
        let right_root = self.union_find.find(right);

        if left_root == right_root {
            return false;
        }

        let groups = Arc::make_mut(&mut self.groups);
        let left_types = groups.remove(&left_root);
        let right_types = groups.remove(&right_root);

        self.union_find.union(left, right);

        if let Some(left_types) = left_types {
            Arc::make_mut(&mut self.groups).insert(left, left_types);
        }

        let survivor = Type::Point(left);
        let right_types = right_types.into_iter().flatten();
        right_types.fold(false, |conflict, t| self.unify_core(&survivor, &t) || conflict)
    }

    /// Resolves a point to the first type of its class, or to its representative.
    pub fn resolve_shallow(&mut self, t: &Type) -> Type {
        match t {
            &Type::Point(point) => {
                let representative = self.union_find.find(point);
                let first = self.groups.get(&representative).and_then(|types| types.first());
                first.cloned().unwrap_or(Type::Point(representative))
            }
            Type::Constructed(_) => t.clone(),
        }
    }

    /// Determines if `point` has not been pinned to any concrete type.
    pub fn is_unresolved(&mut self, point: PointId) -> bool {
        matches!(self.resolve_shallow(&Type::Point(point)), Type::Point(_))
    }

    fn insert(&mut self, point: PointId, t: Type) {
        let representative = self.union_find.find(point);

        if self.occurs(representative, &t) {
            tracing::trace!(?representative, "recursive type dropped");
            return;
        }

        let types = Arc::make_mut(&mut self.groups).entry(representative).or_default();
        if !types.contains(&t) {
            types.push(t);
        }
    }

    /// Determines if the class of `representative` appears inside `t`,
    /// following the types already recorded for other classes.
    fn occurs(&self, representative: PointId, t: &Type) -> bool {
        fn aux(
            equivalence: &Equivalence,
            representative: PointId,
            t: &Type,
            seen: &mut FxHashSet<PointId>,
        ) -> bool {
            match t {
                &Type::Point(point) => {
                    let point = equivalence.union_find.representative(point);
                    if point == representative {
                        return true;
                    }
                    if !seen.insert(point) {
                        return false;
                    }
                    let types = equivalence.groups.get(&point).into_iter().flatten();
                    types.into_iter().any(|t| aux(equivalence, representative, t, seen))
                }
                Type::Constructed(constructed) => constructed
                    .children
                    .iter()
                    .any(|child| aux(equivalence, representative, child, seen)),
            }
        }

        let mut seen = FxHashSet::default();
        aux(self, representative, t, &mut seen)
    }

    /// Substitutes every point in `t` with the first type of its class, deeply.
    pub fn apply(&self, t: &Type) -> Type {
        fn aux(equivalence: &Equivalence, t: &Type, visiting: &mut Vec<PointId>) -> Type {
            match t {
                &Type::Point(point) => {
                    let representative = equivalence.union_find.representative(point);
                    if visiting.contains(&representative) {
                        return Type::Point(representative);
                    }
                    let first = equivalence.groups.get(&representative).and_then(|t| t.first());
                    let Some(first) = first else {
                        return Type::Point(representative);
                    };
                    visiting.push(representative);
                    let applied = aux(equivalence, first, visiting);
                    visiting.pop();
                    applied
                }
                Type::Constructed(Constructed { tag, children, emit }) => {
                    let children = children.iter().map(|child| aux(equivalence, child, visiting));
                    Type::Constructed(Constructed {
                        tag: tag.clone(),
                        children: children.collect(),
                        emit: emit.clone(),
                    })
                }
            }
        }

        aux(self, t, &mut vec![])
    }

    pub fn apply_substitutions(&self, substitutions: &Substitutions) -> Substitutions {
        let substitutions = substitutions.iter();
        substitutions.map(|(parameter, t)| (parameter.clone(), self.apply(t))).collect()
    }

    /// Schedules `substitutions` for normalisation once all merging has finished.
    pub fn defer(&mut self, substitutions: Substitutions) -> DeferredId {
        let id = DeferredId(self.deferred.len() as u32);
        Arc::make_mut(&mut self.deferred).push(substitutions);
        id
    }

    /// Materialises groups and normalises deferred substitutions.
    ///
    /// Every class that gained a concrete type becomes one group; every
    /// other point that was seen becomes a singleton group.
    pub fn finish(&self, points: &Points) -> Finished {
        let deferred = self.deferred.iter();
        let deferred = deferred.map(|substitutions| self.apply_substitutions(substitutions));
        let deferred = deferred.collect();

        let mut classes: FxHashMap<PointId, Vec<PointId>> = FxHashMap::default();
        for point in self.union_find.points() {
            let representative = self.union_find.representative(point);
            classes.entry(representative).or_default().push(point);
        }

        let mut groups = vec![];
        for (representative, mut nodes) in classes {
            nodes.sort_by_key(|&node| points.position(node));
            match self.groups.get(&representative) {
                Some(types) if !types.is_empty() => {
                    let types = types.iter().map(|t| self.apply(t)).unique().collect();
                    groups.push(Group { nodes, types });
                }
                _ => {
                    let singletons =
                        nodes.into_iter().map(|node| Group { nodes: vec![node], types: vec![] });
                    groups.extend(singletons);
                }
            }
        }

        groups.sort_by_key(|group| points.position(group.nodes[0]));

        Finished { groups, deferred }
    }
}
