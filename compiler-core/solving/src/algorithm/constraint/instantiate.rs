use points::{PointId, Points};
use rustc_hash::FxHashMap;

use crate::algorithm::state::{SolveContext, SolveState};
use crate::core::{Constructed, Substitutions, Tag, Type, TypeParameter};

/// Replays the constraints of `definition` under fresh identity at `source`.
///
/// The definition's own point is replaced by `source`, so the type the
/// template assigns to itself lands on the call site. Points the definition
/// owns are replaced by fresh copies; any other point is shared with the
/// call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiateConstraint {
    pub source: PointId,
    pub definition: PointId,
    pub replacements: FxHashMap<PointId, PointId>,
    pub substitutions: Substitutions,
}

impl InstantiateConstraint {
    pub fn new(source: PointId, definition: PointId) -> InstantiateConstraint {
        let mut replacements = FxHashMap::default();
        replacements.insert(definition, source);
        let substitutions = Substitutions::new();
        InstantiateConstraint { source, definition, replacements, substitutions }
    }

    pub fn with_substitutions(self, substitutions: Substitutions) -> InstantiateConstraint {
        InstantiateConstraint { substitutions, ..self }
    }

    pub(super) fn instantiate(
        &self,
        replacer: &mut Replacer,
        points: &mut Points,
    ) -> InstantiateConstraint {
        let source = replacer.point(points, self.source);
        let substitutions = replacer.substitutions(points, &self.substitutions);
        InstantiateConstraint::new(source, self.definition).with_substitutions(substitutions)
    }

    pub(super) fn run(&self, state: &mut SolveState, context: &mut SolveContext<'_>) {
        self.instantiate_into(state, context);
    }

    /// Enqueues fresh copies of the definition's constraints onto `state`.
    ///
    /// Returns the [`Replacer`] so that callers can express other data, such
    /// as an instance's own substitutions, under the same fresh identity.
    #[tracing::instrument(skip_all, name = "instantiate", fields(source = ?self.source, definition = ?self.definition))]
    pub fn instantiate_into(
        &self,
        state: &mut SolveState,
        context: &mut SolveContext<'_>,
    ) -> Replacer {
        let mut replacer = Replacer {
            source: self.source,
            definition: self.definition,
            replacements: self.replacements.clone(),
            substitutions: self.substitutions.clone(),
        };

        let program = context.program;
        let constraints = program.definition(self.definition);
        tracing::trace!(count = constraints.len());

        for constraint in constraints {
            if let Some(constraint) = constraint.instantiate(&mut replacer, context.points) {
                state.queue.push(constraint);
            }
        }

        replacer
    }
}

/// Maps template points and type parameters to their fresh counterparts.
///
/// Every lookup is memoised, so repeated references within one
/// instantiation share a single fresh point.
#[derive(Debug)]
pub struct Replacer {
    source: PointId,
    definition: PointId,
    replacements: FxHashMap<PointId, PointId>,
    substitutions: Substitutions,
}

impl Replacer {
    pub fn new(source: PointId, definition: PointId) -> Replacer {
        let replacements = FxHashMap::default();
        let substitutions = Substitutions::new();
        Replacer { source, definition, replacements, substitutions }
    }

    /// Replaces `point` if it belongs to the definition being instantiated.
    pub fn point(&mut self, points: &mut Points, point: PointId) -> PointId {
        if let Some(&replaced) = self.replacements.get(&point) {
            return replaced;
        }
        if points.owner(point) != Some(self.definition) {
            return point;
        }
        self.fresh(points, point)
    }

    fn fresh(&mut self, points: &mut Points, point: PointId) -> PointId {
        let source = self.source;
        *self.replacements.entry(point).or_insert_with(|| points.instantiate(point, source))
    }

    /// Unless the call site supplied it, a parameter becomes the fresh copy
    /// of the point that declares it.
    pub fn parameter(&mut self, points: &mut Points, parameter: &TypeParameter) -> Type {
        if let Some(t) = self.substitutions.get(parameter) {
            return t.clone();
        }
        let fresh = Type::Point(self.fresh(points, parameter.source));
        self.substitutions.insert(parameter.clone(), fresh.clone());
        fresh
    }

    pub fn ty(&mut self, points: &mut Points, t: &Type) -> Type {
        match t {
            &Type::Point(point) => Type::Point(self.point(points, point)),
            Type::Constructed(Constructed { tag: Tag::Parameter(parameter), .. }) => {
                self.parameter(points, parameter)
            }
            Type::Constructed(Constructed { tag, children, emit }) => {
                let children = children.iter().map(|child| self.ty(points, child));
                Type::Constructed(Constructed {
                    tag: tag.clone(),
                    children: children.collect(),
                    emit: emit.clone(),
                })
            }
        }
    }

    /// Replaces the values of `substitutions`; the parameters themselves are kept.
    pub fn substitutions(
        &mut self,
        points: &mut Points,
        substitutions: &Substitutions,
    ) -> Substitutions {
        let substitutions = substitutions.iter();
        substitutions.map(|(parameter, t)| (parameter.clone(), self.ty(points, t))).collect()
    }
}
