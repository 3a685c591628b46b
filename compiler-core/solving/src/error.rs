//! Implements the user-facing conditions found while solving.
//!
//! These are data, not failures: a single run collects every conflict and
//! unresolved bound so the diagnostics layer can report all of them.

use points::PointId;

use crate::core::{Bound, GroupId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The group accumulated more than one concrete type.
    ConflictingTypes { group: GroupId },
    /// No tier produced exactly one matching instance.
    UnresolvedBound { bound: Bound },
    /// The bound resolved to an instance declared as an error.
    ErrorInstance { bound: Bound, instance: PointId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveError {
    pub kind: ErrorKind,
    /// The point the error is reported at.
    pub point: PointId,
}
