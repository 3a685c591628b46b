//! Tracing helpers for solver debugging.
//!
//! The solver only emits events and spans; installing a subscriber is left
//! to whoever embeds it.

use std::fmt;

use points::{PointId, Points};

use crate::core::{Bound, Type, pretty};

/// A rendered type for tracing output.
///
/// Implements both [`fmt::Display`] for human-readable output and
/// [`fmt::Debug`] for structured subscribers.
#[derive(Clone)]
pub struct TypeTrace(String);

impl fmt::Display for TypeTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[inline]
pub fn render(points: &Points, t: &Type) -> TypeTrace {
    TypeTrace(pretty::print(points, t))
}

#[inline]
pub fn render_bound(points: &Points, bound: &Bound) -> TypeTrace {
    TypeTrace(pretty::print_bound(points, bound))
}

/// Creates an info-level span for one solving session.
#[inline]
pub fn solve_session(points: &Points, definition: Option<PointId>) -> tracing::span::EnteredSpan {
    const TOP_LEVEL: &str = "<top level>";
    let name = definition.map_or(TOP_LEVEL, |definition| points.source(definition));
    tracing::info_span!("solve_session", ?definition, %name).entered()
}
