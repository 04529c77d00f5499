use crate::config::SolverConfig;
use crate::logic::constraints::AssignmentProblem;
use crate::model::{Connection, Fiber, Link};
use good_lp::Expression;

/// Charge for pairing `fiber` with `link` when their core counts differ.
pub fn mismatch_penalty(fiber: &Fiber, link: &Link, config: &SolverConfig) -> i64 {
    if fiber.cores() != link.cores() {
        config.core_penalty
    } else {
        0
    }
}

/// Cores `fiber` carries beyond what `link` needs.
pub fn core_overrun(fiber: &Fiber, link: &Link) -> i64 {
    (fiber.cores() as i64 - link.cores() as i64).max(0)
}

/// Quality cost of one pair, excluding the fiber usage tier.
pub fn pair_cost(fiber: &Fiber, link: &Link, config: &SolverConfig) -> i64 {
    mismatch_penalty(fiber, link, config)
        + config.core_overrun_weight * core_overrun(fiber, link)
        + config.length_weight * fiber.length() as i64
}

/// Builds the single weighted objective ranking feasible assignments.
///
/// Tiers, heaviest first: fibers used (`fiberWeight` each), core mismatch
/// (`corePenalty`), cores beyond the link requirement (`coreOverrunWeight` per
/// core), and length beyond the link requirement (`lengthWeight` per unit).
pub struct ObjectiveComposer<'a> {
    fibers: &'a [Fiber],
    links: &'a [Link],
    config: &'a SolverConfig,
}

impl<'a> ObjectiveComposer<'a> {
    pub fn new(fibers: &'a [Fiber], links: &'a [Link], config: &'a SolverConfig) -> Self {
        Self {
            fibers,
            links,
            config,
        }
    }

    pub fn compose(&self, problem: &AssignmentProblem) -> Expression {
        let mut objective = Expression::with_capacity(problem.matrix.len());

        for (l, link) in self.links.iter().enumerate() {
            for (f, var) in problem.matrix.link_column(l) {
                let fiber = &self.fibers[f];
                let weight = self.config.fiber_weight + pair_cost(fiber, link, self.config);
                objective.add_mul(weight as f64, var);
            }
            // Length overrun is measured against the requirement, not from zero
            objective -= (self.config.length_weight * link.length() as i64) as f64;
        }

        objective
    }

    /// Install the composed objective on the problem's model.
    pub fn apply(&self, problem: &mut AssignmentProblem) {
        let objective = self.compose(problem);
        problem.model.minimize(objective);
    }
}
