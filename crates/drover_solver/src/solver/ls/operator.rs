use smallvec::SmallVec;

use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::{
            cross_exchange::CrossExchange, intra_cross_exchange::IntraCrossExchange,
            intra_exchange::IntraExchange, intra_mixed_exchange::IntraMixedExchange,
            intra_or_opt::IntraOrOpt, intra_relocate::IntraRelocate, intra_two_opt::IntraTwoOpt,
            mixed_exchange::MixedExchange, or_opt::OrOpt, pd_shift::PdShift,
            priority_replace::PriorityReplace, relocate::Relocate, reverse_two_opt::ReverseTwoOpt,
            route_exchange::RouteExchange, route_split::RouteSplit, swap_star::SwapStar,
            tsp_fix::TspFix, two_opt::TwoOpt, unassigned_exchange::UnassignedExchange,
        },
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

/// Uniform contract of a route-mutation move. `evaluate` combines
/// feasibility and the exact cost delta: `None` means the move would break
/// an invariant, otherwise applying it changes the total cost by exactly
/// the returned amount.
pub trait LocalSearchOperator: Sized {
    fn generate_moves<C>(
        problem: &Problem,
        solution: &SolutionState,
        pair: (RouteIdx, RouteIdx),
        consumer: C,
    ) where
        C: FnMut(Self);

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost>;

    fn apply(&self, problem: &Problem, solution: &mut SolutionState);

    fn updated_routes(&self) -> Vec<RouteIdx>;
}

/// Closed set of moves, dispatched by match: the operator family is known
/// at compile time.
#[derive(Clone, Debug)]
pub enum Move {
    UnassignedExchange(UnassignedExchange),
    Relocate(Relocate),
    IntraRelocate(IntraRelocate),
    OrOpt(OrOpt),
    IntraOrOpt(IntraOrOpt),
    CrossExchange(CrossExchange),
    IntraCrossExchange(IntraCrossExchange),
    MixedExchange(MixedExchange),
    IntraMixedExchange(IntraMixedExchange),
    TwoOpt(TwoOpt),
    IntraTwoOpt(IntraTwoOpt),
    ReverseTwoOpt(ReverseTwoOpt),
    IntraExchange(IntraExchange),
    PdShift(PdShift),
    RouteExchange(RouteExchange),
    SwapStar(SwapStar),
    RouteSplit(RouteSplit),
    PriorityReplace(PriorityReplace),
    TspFix(TspFix),
}

macro_rules! dispatch {
    ($self:expr, $op:ident => $body:expr) => {
        match $self {
            Move::UnassignedExchange($op) => $body,
            Move::Relocate($op) => $body,
            Move::IntraRelocate($op) => $body,
            Move::OrOpt($op) => $body,
            Move::IntraOrOpt($op) => $body,
            Move::CrossExchange($op) => $body,
            Move::IntraCrossExchange($op) => $body,
            Move::MixedExchange($op) => $body,
            Move::IntraMixedExchange($op) => $body,
            Move::TwoOpt($op) => $body,
            Move::IntraTwoOpt($op) => $body,
            Move::ReverseTwoOpt($op) => $body,
            Move::IntraExchange($op) => $body,
            Move::PdShift($op) => $body,
            Move::RouteExchange($op) => $body,
            Move::SwapStar($op) => $body,
            Move::RouteSplit($op) => $body,
            Move::PriorityReplace($op) => $body,
            Move::TspFix($op) => $body,
        }
    };
}

impl Move {
    pub fn operator_name(&self) -> &'static str {
        match self {
            Move::UnassignedExchange(_) => "Unassigned-Exchange",
            Move::Relocate(_) => "Relocate",
            Move::IntraRelocate(_) => "Intra-Relocate",
            Move::OrOpt(_) => "Or-Opt",
            Move::IntraOrOpt(_) => "Intra-Or-Opt",
            Move::CrossExchange(_) => "Cross-Exchange",
            Move::IntraCrossExchange(_) => "Intra-Cross-Exchange",
            Move::MixedExchange(_) => "Mixed-Exchange",
            Move::IntraMixedExchange(_) => "Intra-Mixed-Exchange",
            Move::TwoOpt(_) => "Two-Opt",
            Move::IntraTwoOpt(_) => "Intra-Two-Opt",
            Move::ReverseTwoOpt(_) => "Reverse-Two-Opt",
            Move::IntraExchange(_) => "Intra-Exchange",
            Move::PdShift(_) => "PD-Shift",
            Move::RouteExchange(_) => "Route-Exchange",
            Move::SwapStar(_) => "Swap-Star",
            Move::RouteSplit(_) => "Route-Split",
            Move::PriorityReplace(_) => "Priority-Replace",
            Move::TspFix(_) => "TSP-Fix",
        }
    }

    pub fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        dispatch!(self, op => op.evaluate(problem, solution))
    }

    pub fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        dispatch!(self, op => op.apply(problem, solution))
    }

    pub fn updated_routes(&self) -> Vec<RouteIdx> {
        dispatch!(self, op => op.updated_routes())
    }
}

/// Sum of two independent route splices; both must be feasible. Only valid
/// for distinct routes.
#[allow(clippy::too_many_arguments)]
pub(crate) fn pair_delta<I1, I2>(
    problem: &Problem,
    solution: &SolutionState,
    r1: RouteIdx,
    seq1: I1,
    range1: (usize, usize),
    r2: RouteIdx,
    seq2: I2,
    range2: (usize, usize),
) -> Option<Cost>
where
    I1: Iterator<Item = Step> + Clone,
    I2: Iterator<Item = Step> + Clone,
{
    debug_assert_ne!(r1, r2);
    let d1 = solution
        .route(r1)
        .evaluate_splice(problem, seq1, range1.0, range1.1)?;
    let d2 = solution
        .route(r2)
        .evaluate_splice(problem, seq2, range2.0, range2.1)?;
    Some(d1.cost + d2.cost)
}

/// Single splice realizing "remove the step at `remove`, then place `step`
/// before the step originally at `insert`". Returns the sequence and the
/// replaced range.
pub(crate) fn remove_then_insert(
    steps: &[Step],
    remove: usize,
    insert: usize,
    step: Step,
) -> (SmallVec<[Step; 8]>, usize, usize) {
    if insert <= remove {
        let mut seq = SmallVec::new();
        seq.push(step);
        seq.extend(steps[insert..remove].iter().copied());
        (seq, insert, remove + 1)
    } else {
        let mut seq: SmallVec<[Step; 8]> = steps[remove + 1..insert].iter().copied().collect();
        seq.push(step);
        (seq, remove, insert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::job::JobIdx;

    fn jobs(ids: &[usize]) -> Vec<Step> {
        ids.iter().map(|&i| Step::Job(JobIdx::new(i))).collect()
    }

    fn splice(steps: &[Step], seq: &[Step], start: usize, end: usize) -> Vec<Step> {
        let mut out = steps.to_vec();
        out.splice(start..end, seq.iter().copied());
        out
    }

    #[test]
    fn test_remove_then_insert_before() {
        let steps = jobs(&[0, 1, 2, 3]);
        let (seq, start, end) = remove_then_insert(&steps, 2, 0, Step::Job(JobIdx::new(9)));
        assert_eq!(splice(&steps, &seq, start, end), jobs(&[9, 0, 1, 3]));
    }

    #[test]
    fn test_remove_then_insert_after() {
        let steps = jobs(&[0, 1, 2, 3]);
        let (seq, start, end) = remove_then_insert(&steps, 1, 3, Step::Job(JobIdx::new(9)));
        assert_eq!(splice(&steps, &seq, start, end), jobs(&[0, 2, 9, 3]));
    }

    #[test]
    fn test_remove_then_insert_in_place() {
        let steps = jobs(&[0, 1, 2]);
        let (seq, start, end) = remove_then_insert(&steps, 1, 1, Step::Job(JobIdx::new(9)));
        assert_eq!(splice(&steps, &seq, start, end), jobs(&[0, 9, 2]));
    }
}
