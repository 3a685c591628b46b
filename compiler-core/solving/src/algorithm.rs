pub mod constraint;
pub mod equivalence;
pub mod queue;
pub mod state;
pub mod union_find;

use std::sync::Arc;

use itertools::Itertools;
use points::{PointId, Points};

use crate::algorithm::constraint::Constraint;
use crate::algorithm::state::{SolveContext, SolveState};
use crate::core::Instance;
use crate::{Program, SolvedModule, trace};

/// Solves every generic template, then the top-level constraints.
///
/// Each template is its own session in which its `where` clauses are
/// implied instances; calls to a template are solved in the session of the
/// caller through instantiation.
pub fn solve_program(points: &mut Points, program: &Program) -> SolvedModule {
    let mut solved = SolvedModule::default();

    for definition in program.definitions.keys().copied().sorted() {
        let constraints = program.definition(definition);
        let implied = constraints.iter().filter_map(Constraint::hypothesis);
        let implied = implied.map(Instance::implied_by).collect();
        solve_session(points, program, &mut solved, Some(definition), implied, constraints);
    }

    let top_level = &program.top_level;
    solve_session(points, program, &mut solved, None, Arc::default(), top_level);

    solved
}

fn solve_session(
    points: &mut Points,
    program: &Program,
    solved: &mut SolvedModule,
    definition: Option<PointId>,
    implied: Arc<[Instance]>,
    constraints: &[Constraint],
) {
    let _span = trace::solve_session(points, definition);

    let mut state = SolveState::new(implied);
    state.queue.extend(constraints.iter().cloned());

    let mut context = SolveContext { points: &mut *points, program };
    state.run(&mut context);

    let finished = state.equivalence.finish(points);
    tracing::debug!(groups = finished.groups.len(), bounds = state.resolutions.len(), "finished");

    solved.insert_session(finished, Arc::unwrap_or_clone(state.resolutions));
}
