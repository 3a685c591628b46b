use std::sync::Arc;

use itertools::Itertools;
use points::Points;

use crate::algorithm::constraint::{InstantiateConstraint, Replacer};
use crate::algorithm::queue::Stage;
use crate::algorithm::state::{Outcome, Resolution, SolveContext, SolveState};
use crate::core::{Bound, Instance, Substitutions, partition_substitutions};
use crate::trace;

/// Requires that the trait of `bound` be resolved to exactly one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundConstraint {
    pub bound: Bound,
}

/// Priority buckets of instance candidates, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    /// Instances assumed to hold in the current session.
    Implied,
    NonDefault,
    Default,
}

impl Tier {
    fn requires_instantiation(self) -> bool {
        !matches!(self, Tier::Implied)
    }
}

struct Candidate<'i> {
    instance: &'i Instance,
    fork: SolveState,
    inferred: Substitutions,
}

impl BoundConstraint {
    pub fn new(bound: Bound) -> BoundConstraint {
        BoundConstraint { bound }
    }

    pub(super) fn instantiate(
        &self,
        replacer: &mut Replacer,
        points: &mut Points,
    ) -> BoundConstraint {
        let Bound { source, trait_id, ref substitutions, from_constraint, .. } = self.bound;
        let bound = Bound {
            source: replacer.point(points, source),
            trait_id,
            substitutions: replacer.substitutions(points, substitutions),
            from_constraint,
            instantiated: true,
        };
        BoundConstraint { bound }
    }

    #[tracing::instrument(skip_all, name = "resolve_bound", fields(source = ?self.bound.source))]
    pub(super) fn run(&self, state: &mut SolveState, context: &mut SolveContext<'_>) {
        let bound = &self.bound;

        if bound.source == bound.trait_id && !bound.instantiated {
            tracing::trace!("trait self-reference");
            return;
        }

        if bound.from_constraint && !bound.instantiated {
            tracing::trace!("hypothesis");
            return;
        }

        tracing::debug!(bound = %trace::render_bound(context.points, bound));

        let (plain, inferred) = partition_substitutions(&bound.substitutions);

        let program = context.program;
        let (defaults, non_defaults): (Vec<_>, Vec<_>) =
            program.instances(bound.trait_id).iter().partition(|instance| instance.default);

        let implied = Arc::clone(&state.implied);
        let implied = implied.iter().filter(|instance| instance.trait_id == bound.trait_id);

        let tiers = [
            (Tier::Implied, implied.collect_vec()),
            (Tier::NonDefault, non_defaults),
            (Tier::Default, defaults),
        ];

        let mut resolved = None;
        for (tier, instances) in tiers {
            let candidates = instances.into_iter().filter_map(|instance| {
                try_candidate(state, context, bound, &plain, &inferred, tier, instance)
            });
            let candidates = candidates.collect_vec();

            tracing::debug!(?tier, candidates = candidates.len());

            if let Ok(candidate) = candidates.into_iter().exactly_one() {
                resolved = Some((tier, candidate));
                break;
            }
        }

        let outcome = match resolved {
            Some((tier, Candidate { instance, fork, inferred: solved })) => {
                state.commit(fork);

                for (parameter, t) in &solved {
                    if let Some(slot) = inferred.get(parameter) {
                        state.equivalence.unify(slot, t);
                    }
                }

                tracing::debug!(?tier, instance = ?instance.node, "resolved");

                if tier == Tier::Implied {
                    None
                } else {
                    Some(Outcome::Resolved { instance: instance.node, error: instance.error })
                }
            }
            None => {
                tracing::debug!("unresolved");
                Some(Outcome::Unresolved)
            }
        };

        let deferred = state.equivalence.defer(bound.substitutions.clone());
        if let Some(outcome) = outcome {
            let resolution = Resolution { bound: bound.clone(), deferred, outcome };
            Arc::make_mut(&mut state.resolutions).push(resolution);
        }
    }
}

/// Checks `instance` against `bound` on a fork of `state`.
///
/// Every parameter of the instance must be either supplied by the bound,
/// in which case both sides are unified, or inferred by it. Returns the fork
/// if it completed without unification errors, together with the values the
/// instance gives the inferred parameters, expressed in the fork's identity.
fn try_candidate<'i>(
    state: &SolveState,
    context: &mut SolveContext<'_>,
    bound: &Bound,
    plain: &Substitutions,
    inferred: &Substitutions,
    tier: Tier,
    instance: &'i Instance,
) -> Option<Candidate<'i>> {
    let mut fork = state.fork();

    let substitutions = if tier.requires_instantiation() {
        let instantiate = InstantiateConstraint::new(bound.source, instance.node);
        let mut replacer = instantiate.instantiate_into(&mut fork, context);
        let substitutions = replacer.substitutions(context.points, &instance.substitutions);
        fork.run_before(context, Some(Stage::Bound));
        substitutions
    } else {
        instance.substitutions.clone()
    };

    let mut solved = Substitutions::new();
    for (parameter, t) in substitutions {
        if let Some(expected) = plain.get(&parameter) {
            fork.equivalence.unify(expected, &t);
        } else if inferred.contains_key(&parameter) {
            solved.insert(parameter, t);
        } else {
            unreachable!(
                "invariant violated: parameter {} of {:?} missing in bound substitutions",
                parameter.name, instance.node
            );
        }
    }

    if fork.equivalence.has_error() {
        tracing::trace!(instance = ?instance.node, "rejected");
        return None;
    }

    Some(Candidate { instance, fork, inferred: solved })
}
