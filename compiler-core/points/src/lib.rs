//! Program points: the identities that the solver treats as unification variables.
//!
//! Points are allocated into an arena and never freed. A point created by
//! instantiation remembers the template point it was copied from and the call
//! site that caused the copy; both links are fixed at construction.
//!
//! A point may belong to a definition. Only the points a definition owns
//! are copied when that definition is instantiated; everything else it
//! mentions keeps its identity across call sites.

use std::ops;

use la_arena::{Arena, Idx};
use smol_str::SmolStr;

/// A byte range in the source text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Span {
        Span { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointData {
    pub span: Span,
    pub source: SmolStr,
    pub owner: Option<PointId>,
    pub instantiated_from: Option<PointId>,
    pub instantiated_by: Option<PointId>,
}

pub type PointId = Idx<PointData>;

#[derive(Debug, Default)]
pub struct Points {
    inner: Arena<PointData>,
}

impl Points {
    pub fn allocate(&mut self, span: Span, source: impl Into<SmolStr>) -> PointId {
        self.alloc(None, span, source.into())
    }

    /// Allocates a point that belongs to the definition `owner`.
    pub fn allocate_in(
        &mut self,
        owner: PointId,
        span: Span,
        source: impl Into<SmolStr>,
    ) -> PointId {
        self.alloc(Some(owner), span, source.into())
    }

    fn alloc(&mut self, owner: Option<PointId>, span: Span, source: SmolStr) -> PointId {
        self.inner.alloc(PointData {
            span,
            source,
            owner,
            instantiated_from: None,
            instantiated_by: None,
        })
    }

    /// Creates a fresh copy of `from` on behalf of the call site `by`.
    ///
    /// The copy keeps the owner of `from`, so a template nested inside
    /// another is still recognised after the outer one is instantiated.
    pub fn instantiate(&mut self, from: PointId, by: PointId) -> PointId {
        let PointData { span, ref source, owner, .. } = self.inner[from];
        let source = source.clone();
        self.inner.alloc(PointData {
            span,
            source,
            owner,
            instantiated_from: Some(from),
            instantiated_by: Some(by),
        })
    }

    /// Follows `instantiated_from` links back to the point written in the source.
    pub fn original(&self, mut point: PointId) -> PointId {
        while let Some(from) = self.inner[point].instantiated_from {
            point = from;
        }
        point
    }

    pub fn owner(&self, point: PointId) -> Option<PointId> {
        self.inner[point].owner
    }

    pub fn source(&self, point: PointId) -> &str {
        &self.inner[point].source
    }

    /// Sort key placing points in source order, with allocation order as a tiebreaker.
    pub fn position(&self, point: PointId) -> (Span, PointId) {
        (self.inner[point].span, point)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PointId, &PointData)> {
        self.inner.iter()
    }
}

impl ops::Index<PointId> for Points {
    type Output = PointData;

    fn index(&self, id: PointId) -> &PointData {
        &self.inner[id]
    }
}
