pub mod trace;

use std::fmt::Write;

use itertools::Itertools;
use points::{PointId, Points, Span};
use smol_str::SmolStr;
use solving::algorithm::constraint::{
    BoundConstraint, Constraint, InstantiateConstraint, TypeConstraint,
};
use solving::core::{ParameterId, Substitutions, Type, TypeParameter, pretty};
use solving::error::ErrorKind;
use solving::{Bound, Instance, Program, SolvedModule};

/// Assembles a [`Program`] by hand, in place of constraint extraction.
///
/// Every point is given its own span in allocation order, so source order
/// and allocation order agree. Points created with the `_in` methods belong
/// to a definition and are copied when it is instantiated.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    pub points: Points,
    pub program: Program,
    offset: u32,
    parameters: u32,
}

impl ProgramBuilder {
    pub fn point(&mut self, source: &str) -> PointId {
        let span = self.span(source);
        self.points.allocate(span, source)
    }

    pub fn point_in(&mut self, owner: PointId, source: &str) -> PointId {
        let span = self.span(source);
        self.points.allocate_in(owner, span, source)
    }

    fn span(&mut self, source: &str) -> Span {
        let start = self.offset;
        let end = start + source.len() as u32;
        self.offset = end + 1;
        Span::new(start, end)
    }

    /// Declares a nominal type without parameters and returns it.
    pub fn declare(&mut self, name: &str) -> Type {
        let declaration = self.point(name);
        Type::named(declaration, [])
    }

    pub fn parameter(&mut self, name: &str) -> TypeParameter {
        let source = self.point(name);
        self.fresh_parameter(name, source, false)
    }

    /// A parameter declared by the definition `owner`.
    pub fn parameter_in(&mut self, owner: PointId, name: &str) -> TypeParameter {
        let source = self.point_in(owner, name);
        self.fresh_parameter(name, source, false)
    }

    pub fn inferred(&mut self, name: &str) -> TypeParameter {
        let source = self.point(name);
        self.fresh_parameter(name, source, true)
    }

    fn fresh_parameter(&mut self, name: &str, source: PointId, infer: bool) -> TypeParameter {
        let id = ParameterId(self.parameters);
        self.parameters += 1;
        TypeParameter { id, name: SmolStr::new(name), source, infer }
    }

    pub fn top_level(&mut self, constraint: Constraint) {
        self.program.top_level.push(constraint);
    }

    pub fn define(
        &mut self,
        definition: PointId,
        constraints: impl IntoIterator<Item = Constraint>,
    ) {
        self.program.define(definition, constraints);
    }

    pub fn instance(
        &mut self,
        name: &str,
        trait_id: PointId,
        substitutions: impl IntoIterator<Item = (TypeParameter, Type)>,
    ) -> PointId {
        self.register(name, trait_id, substitutions, false, false)
    }

    pub fn default_instance(
        &mut self,
        name: &str,
        trait_id: PointId,
        substitutions: impl IntoIterator<Item = (TypeParameter, Type)>,
    ) -> PointId {
        self.register(name, trait_id, substitutions, true, false)
    }

    pub fn error_instance(
        &mut self,
        name: &str,
        trait_id: PointId,
        substitutions: impl IntoIterator<Item = (TypeParameter, Type)>,
    ) -> PointId {
        self.register(name, trait_id, substitutions, false, true)
    }

    fn register(
        &mut self,
        name: &str,
        trait_id: PointId,
        substitutions: impl IntoIterator<Item = (TypeParameter, Type)>,
        default: bool,
        error: bool,
    ) -> PointId {
        let node = self.point(name);
        let substitutions = substitutions.into_iter().collect();
        let instance = Instance { node, trait_id, substitutions, default, error };
        self.program.register_instance(instance);
        node
    }

    pub fn solve(&mut self) -> SolvedModule {
        solving::solve(&mut self.points, &self.program)
    }

    /// Finds the unique copy of `from` made on behalf of the call site `by`.
    pub fn instantiated(&self, from: PointId, by: PointId) -> PointId {
        let copies = self.points.iter().filter(|(_, data)| {
            data.instantiated_from == Some(from) && data.instantiated_by == Some(by)
        });
        let copies = copies.map(|(id, _)| id).collect_vec();
        let [copy] = copies[..] else {
            panic!("expected one copy of {from:?} by {by:?}, found {copies:?}");
        };
        copy
    }

    /// Names a point by its source text, primed once per level of instantiation.
    pub fn name(&self, point: PointId) -> String {
        let mut name = self.points.source(point).to_string();
        let mut current = point;
        while let Some(from) = self.points[current].instantiated_from {
            name.push('\'');
            current = from;
        }
        name
    }

    /// Renders the typed groups, resolved bounds, and errors of `solved`.
    pub fn report(&self, solved: &SolvedModule) -> String {
        let mut buffer = String::default();

        for (_, group) in solved.groups.iter() {
            if group.types.is_empty() {
                continue;
            }
            let nodes = group.nodes.iter().map(|&node| self.name(node)).join(", ");
            let types = group.types.iter().map(|t| pretty::print(&self.points, t)).join(" | ");
            writeln!(buffer, "{nodes} :: {types}").unwrap();
        }

        let resolved = solved.resolved.iter();
        let resolved = resolved.sorted_by_key(|(point, _)| self.points.position(**point));
        for (&point, bounds) in resolved {
            for resolved in bounds {
                let bound = pretty::print_bound(&self.points, &resolved.bound);
                let instance = self.name(resolved.instance);
                writeln!(buffer, "{}: {bound} => {instance}", self.name(point)).unwrap();
            }
        }

        for error in &solved.errors {
            let point = self.name(error.point);
            match &error.kind {
                ErrorKind::ConflictingTypes { .. } => {
                    writeln!(buffer, "error at {point}: conflicting types").unwrap();
                }
                ErrorKind::UnresolvedBound { bound } => {
                    let bound = pretty::print_bound(&self.points, bound);
                    writeln!(buffer, "error at {point}: unresolved {bound}").unwrap();
                }
                ErrorKind::ErrorInstance { bound, instance } => {
                    let bound = pretty::print_bound(&self.points, bound);
                    let instance = self.name(*instance);
                    writeln!(buffer, "error at {point}: {bound} => {instance}").unwrap();
                }
            }
        }

        buffer
    }
}

pub fn has_type(node: PointId, ty: Type) -> Constraint {
    Constraint::Type(TypeConstraint::new(node, ty))
}

/// Like [`has_type`], but skipped inside the generic template itself.
pub fn has_type_when_instantiated(node: PointId, ty: Type) -> Constraint {
    let constraint = TypeConstraint::new(node, ty);
    Constraint::Type(TypeConstraint { only_if_instantiated: true, ..constraint })
}

pub fn instantiate(source: PointId, definition: PointId) -> Constraint {
    Constraint::Instantiate(InstantiateConstraint::new(source, definition))
}

pub fn default_type(node: PointId, ty: Type) -> Constraint {
    Constraint::Default(TypeConstraint::fallback(node, ty))
}

pub fn scope_limited(constraint: Constraint) -> Constraint {
    Constraint::ScopeLimited(Box::new(constraint))
}

/// Requires the trait to hold at `source`.
pub fn bound(
    source: PointId,
    trait_id: PointId,
    substitutions: impl IntoIterator<Item = (TypeParameter, Type)>,
) -> Constraint {
    let bound = make_bound(source, trait_id, substitutions, false);
    Constraint::Bound(BoundConstraint::new(bound))
}

/// Assumes the trait holds, as a `where` clause of a generic template.
pub fn hypothesis(
    source: PointId,
    trait_id: PointId,
    substitutions: impl IntoIterator<Item = (TypeParameter, Type)>,
) -> Constraint {
    let bound = make_bound(source, trait_id, substitutions, true);
    Constraint::Bound(BoundConstraint::new(bound))
}

fn make_bound(
    source: PointId,
    trait_id: PointId,
    substitutions: impl IntoIterator<Item = (TypeParameter, Type)>,
    from_constraint: bool,
) -> Bound {
    let substitutions = substitutions.into_iter().collect();
    Bound { source, trait_id, substitutions, from_constraint, instantiated: false }
}

pub fn substitutions(entries: impl IntoIterator<Item = (TypeParameter, Type)>) -> Substitutions {
    entries.into_iter().collect()
}
