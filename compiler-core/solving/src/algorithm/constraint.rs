/// Implements trait bound resolution.
mod bound;

/// Implements generic instantiation.
mod instantiate;

pub use bound::BoundConstraint;
pub use instantiate::{InstantiateConstraint, Replacer};

use points::{PointId, Points};

use crate::algorithm::queue::Stage;
use crate::algorithm::state::{SolveContext, SolveState};
use crate::core::{Bound, Type};
use crate::trace;

/// A typing obligation consumed by the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Type(TypeConstraint),
    Instantiate(InstantiateConstraint),
    Bound(BoundConstraint),
    /// A fallback type applied only if nothing else pinned the slot down.
    Default(TypeConstraint),
    /// Runs in the generic template but is dropped from every instantiation.
    ScopeLimited(Box<Constraint>),
}

impl Constraint {
    pub fn stage(&self) -> Stage {
        match self {
            Constraint::Type(constraint) => {
                if constraint.ty.mentions_point() {
                    Stage::Group
                } else {
                    Stage::Type
                }
            }
            Constraint::Instantiate(_) => Stage::Instantiate,
            Constraint::Bound(_) => Stage::Bound,
            Constraint::Default(_) => Stage::Default,
            Constraint::ScopeLimited(constraint) => constraint.stage(),
        }
    }

    /// Re-expresses this constraint for a specific call site.
    pub fn instantiate(&self, replacer: &mut Replacer, points: &mut Points) -> Option<Constraint> {
        let constraint = match self {
            Constraint::Type(constraint) => {
                Constraint::Type(constraint.instantiate(replacer, points))
            }
            Constraint::Instantiate(constraint) => {
                Constraint::Instantiate(constraint.instantiate(replacer, points))
            }
            Constraint::Bound(constraint) => {
                Constraint::Bound(constraint.instantiate(replacer, points))
            }
            Constraint::Default(constraint) => {
                Constraint::Default(constraint.instantiate(replacer, points))
            }
            Constraint::ScopeLimited(_) => return None,
        };
        Some(constraint)
    }

    pub fn run(&self, state: &mut SolveState, context: &mut SolveContext<'_>) {
        match self {
            Constraint::Type(constraint) | Constraint::Default(constraint) => {
                constraint.run(state, context)
            }
            Constraint::Instantiate(constraint) => constraint.run(state, context),
            Constraint::Bound(constraint) => constraint.run(state, context),
            Constraint::ScopeLimited(constraint) => constraint.run(state, context),
        }
    }

    /// Returns the bound if this constraint is a hypothesis of a generic template.
    pub fn hypothesis(&self) -> Option<&Bound> {
        match self {
            Constraint::Bound(BoundConstraint { bound }) => {
                (bound.from_constraint && !bound.instantiated).then_some(bound)
            }
            Constraint::ScopeLimited(constraint) => constraint.hypothesis(),
            _ => None,
        }
    }
}

/// Asserts that `node` has type `ty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeConstraint {
    pub node: PointId,
    pub ty: Type,
    pub only_if_instantiated: bool,
    pub is_default: bool,
    /// Set on copies produced by instantiation.
    pub instantiated: bool,
}

impl TypeConstraint {
    pub fn new(node: PointId, ty: Type) -> TypeConstraint {
        TypeConstraint {
            node,
            ty,
            only_if_instantiated: false,
            is_default: false,
            instantiated: false,
        }
    }

    /// Creates the payload of a [`Constraint::Default`].
    pub fn fallback(node: PointId, ty: Type) -> TypeConstraint {
        let constraint = TypeConstraint::new(node, ty);
        TypeConstraint { only_if_instantiated: true, is_default: true, ..constraint }
    }

    fn instantiate(&self, replacer: &mut Replacer, points: &mut Points) -> TypeConstraint {
        TypeConstraint {
            node: replacer.point(points, self.node),
            ty: replacer.ty(points, &self.ty),
            only_if_instantiated: self.only_if_instantiated,
            is_default: self.is_default,
            instantiated: true,
        }
    }

    fn run(&self, state: &mut SolveState, context: &SolveContext<'_>) {
        if self.only_if_instantiated && !self.instantiated {
            return;
        }

        tracing::trace!(node = ?self.node, ty = %trace::render(context.points, &self.ty));

        if self.is_default && !state.equivalence.is_unresolved(self.node) {
            tracing::trace!(node = ?self.node, "default skipped");
            return;
        }

        state.equivalence.unify(&Type::Point(self.node), &self.ty);
    }
}
