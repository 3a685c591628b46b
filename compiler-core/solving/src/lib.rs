pub mod algorithm;
pub mod error;
pub mod trace;

pub mod core;
pub use crate::core::{Bound, Group, GroupId, Instance, Type};

use std::sync::Arc;

use la_arena::Arena;
use points::{PointId, Points};
use rustc_hash::FxHashMap;

use crate::algorithm::constraint::Constraint;
use crate::algorithm::equivalence::Finished;
use crate::algorithm::state::{Outcome, Resolution};
use crate::error::{ErrorKind, SolveError};

/// The constraints and instances produced by constraint extraction.
#[derive(Debug, Default)]
pub struct Program {
    pub top_level: Vec<Constraint>,
    pub definitions: FxHashMap<PointId, Arc<[Constraint]>>,
    pub instances: FxHashMap<PointId, Vec<Instance>>,
}

impl Program {
    pub fn define(
        &mut self,
        definition: PointId,
        constraints: impl IntoIterator<Item = Constraint>,
    ) {
        let constraints = constraints.into_iter().collect();
        self.definitions.insert(definition, constraints);
    }

    pub fn register_instance(&mut self, instance: Instance) {
        self.instances.entry(instance.trait_id).or_default().push(instance);
    }

    pub fn definition(&self, id: PointId) -> &[Constraint] {
        self.definitions.get(&id).map(|constraints| &constraints[..]).unwrap_or_default()
    }

    pub fn instances(&self, trait_id: PointId) -> &[Instance] {
        self.instances.get(&trait_id).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBound {
    pub bound: Bound,
    pub instance: PointId,
    pub error: bool,
}

/// The facts attached to points once solving has finished.
#[derive(Debug, Default)]
pub struct SolvedModule {
    pub types: FxHashMap<PointId, Vec<Type>>,
    pub groups: Arena<Group>,
    pub group_of: FxHashMap<PointId, GroupId>,
    pub resolved: FxHashMap<PointId, Vec<ResolvedBound>>,
    pub unresolved: FxHashMap<PointId, Vec<Bound>>,
    pub errors: Vec<SolveError>,
}

impl SolvedModule {
    /// Every type in the group of `point`; more than one means a conflict.
    pub fn lookup_types(&self, point: PointId) -> &[Type] {
        self.types.get(&point).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn lookup_group(&self, point: PointId) -> Option<&Group> {
        let id = self.group_of.get(&point)?;
        Some(&self.groups[*id])
    }

    pub fn lookup_resolved(&self, point: PointId) -> &[ResolvedBound] {
        self.resolved.get(&point).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn lookup_unresolved(&self, point: PointId) -> &[Bound] {
        self.unresolved.get(&point).map(Vec::as_slice).unwrap_or_default()
    }

    fn insert_session(&mut self, finished: Finished, resolutions: Vec<Resolution>) {
        let Finished { groups, deferred } = finished;

        for group in groups {
            let nodes = group.nodes.clone();
            let types = group.types.clone();
            let conflicting = group.is_conflicting();

            let id = self.groups.alloc(group);
            for &node in &nodes {
                self.group_of.insert(node, id);
                self.types.entry(node).or_default().extend(types.iter().cloned());
            }

            if conflicting {
                let kind = ErrorKind::ConflictingTypes { group: id };
                self.errors.push(SolveError { kind, point: nodes[0] });
            }
        }

        for Resolution { bound, deferred: id, outcome } in resolutions {
            let substitutions = deferred[id.index()].clone();
            let bound = Bound { substitutions, ..bound };
            let point = bound.source;

            match outcome {
                Outcome::Resolved { instance, error } => {
                    if error {
                        let kind = ErrorKind::ErrorInstance { bound: bound.clone(), instance };
                        self.errors.push(SolveError { kind, point });
                    }
                    let resolved = ResolvedBound { bound, instance, error };
                    self.resolved.entry(point).or_default().push(resolved);
                }
                Outcome::Unresolved => {
                    let kind = ErrorKind::UnresolvedBound { bound: bound.clone() };
                    self.errors.push(SolveError { kind, point });
                    self.unresolved.entry(point).or_default().push(bound);
                }
            }
        }
    }
}

/// Solves `program`, allocating any fresh points into `points`.
pub fn solve(points: &mut Points, program: &Program) -> SolvedModule {
    algorithm::solve_program(points, program)
}
