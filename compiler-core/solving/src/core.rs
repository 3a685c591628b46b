pub mod pretty;

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use la_arena::Idx;
use points::PointId;
use smol_str::SmolStr;

/// Identifies a generic parameter across all of its uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParameterId(pub u32);

/// A generic parameter of a trait or definition.
///
/// Parameters marked `infer` are solved from the shape of the chosen
/// instance rather than supplied by the call site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeParameter {
    pub id: ParameterId,
    pub name: SmolStr,
    pub source: PointId,
    pub infer: bool,
}

pub type Substitutions = BTreeMap<TypeParameter, Type>;

/// The head of a constructed type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// A nominal type, identified by the point of its declaration.
    Named(PointId),
    /// A generic parameter inside a template, replaced on instantiation.
    Parameter(TypeParameter),
    Function,
    Tuple,
    Block,
    Intrinsic,
    /// Type-level text, used by error instances.
    Message(SmolStr),
}

#[derive(Debug, Clone)]
pub struct Constructed {
    pub tag: Tag,
    pub children: Arc<[Type]>,
    /// Emission template consumed by code generation.
    pub emit: Option<SmolStr>,
}

impl PartialEq for Constructed {
    fn eq(&self, other: &Constructed) -> bool {
        self.tag == other.tag && self.children == other.children
    }
}

impl Eq for Constructed {}

impl Hash for Constructed {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
        self.children.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Point(PointId),
    Constructed(Constructed),
}

impl Type {
    pub fn constructed(tag: Tag, children: impl IntoIterator<Item = Type>) -> Type {
        let children = children.into_iter().collect();
        Type::Constructed(Constructed { tag, children, emit: None })
    }

    pub fn named(declaration: PointId, children: impl IntoIterator<Item = Type>) -> Type {
        Type::constructed(Tag::Named(declaration), children)
    }

    pub fn parameter(parameter: TypeParameter) -> Type {
        Type::constructed(Tag::Parameter(parameter), [])
    }

    pub fn function(inputs: impl IntoIterator<Item = Type>, output: Type) -> Type {
        let children = inputs.into_iter().chain([output]);
        Type::constructed(Tag::Function, children)
    }

    pub fn tuple(elements: impl IntoIterator<Item = Type>) -> Type {
        Type::constructed(Tag::Tuple, elements)
    }

    pub fn message(text: impl Into<SmolStr>) -> Type {
        Type::constructed(Tag::Message(text.into()), [])
    }

    /// Attaches an emission template; equality is unaffected.
    pub fn with_emit(self, template: impl Into<SmolStr>) -> Type {
        match self {
            Type::Constructed(constructed) => {
                let emit = Some(template.into());
                Type::Constructed(Constructed { emit, ..constructed })
            }
            point @ Type::Point(_) => point,
        }
    }

    /// Determines if any point appears anywhere inside this type.
    pub fn mentions_point(&self) -> bool {
        match self {
            Type::Point(_) => true,
            Type::Constructed(constructed) => constructed.children.iter().any(Type::mentions_point),
        }
    }
}

/// An obligation that `trait_id` be implemented at `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub source: PointId,
    pub trait_id: PointId,
    pub substitutions: Substitutions,
    /// Set for hypotheses assumed by a generic template, i.e. `where` clauses.
    pub from_constraint: bool,
    pub instantiated: bool,
}

/// An implementation of a trait, registered per trait by definition resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub node: PointId,
    pub trait_id: PointId,
    pub substitutions: Substitutions,
    pub default: bool,
    pub error: bool,
}

impl Instance {
    /// Treats a hypothesis bound as an instance that is already known to hold.
    pub fn implied_by(bound: &Bound) -> Instance {
        Instance {
            node: bound.source,
            trait_id: bound.trait_id,
            substitutions: bound.substitutions.clone(),
            default: false,
            error: false,
        }
    }
}

/// An equivalence class together with every concrete type unified onto it.
///
/// More than one type means the class is in conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub nodes: Vec<PointId>,
    pub types: Vec<Type>,
}

impl Group {
    pub fn is_conflicting(&self) -> bool {
        self.types.len() > 1
    }
}

pub type GroupId = Idx<Group>;

/// Splits substitutions into call-site supplied and instance inferred parameters.
pub fn partition_substitutions(substitutions: &Substitutions) -> (Substitutions, Substitutions) {
    substitutions
        .iter()
        .map(|(parameter, t)| (parameter.clone(), t.clone()))
        .partition(|(parameter, _)| !parameter.infer)
}
