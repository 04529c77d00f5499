use crate::config::SolverConfig;
use crate::logic::constraints::AssignmentProblem;
use crate::logic::couplers::CouplerEstimate;
use crate::logic::objective::{mismatch_penalty, pair_cost};
use crate::model::{
    AssignedFiber, AssignmentReport, Connection, Fiber, Link, LinkAssignment, SolveMetadata,
};
use crate::solver::{SolveOutcome, SolveStatus};
use std::collections::BTreeMap;

/// Reads a solved assignment matrix back into an [`AssignmentReport`].
pub struct Reporter<'a> {
    fibers: &'a [Fiber],
    links: &'a [Link],
    config: &'a SolverConfig,
}

impl<'a> Reporter<'a> {
    pub fn new(fibers: &'a [Fiber], links: &'a [Link], config: &'a SolverConfig) -> Self {
        Self {
            fibers,
            links,
            config,
        }
    }

    pub fn report(
        &self,
        problem: &AssignmentProblem,
        outcome: &SolveOutcome,
        metadata: SolveMetadata,
    ) -> AssignmentReport {
        if !outcome.status.has_solution() {
            return Self::no_solution(outcome.status, metadata);
        }

        let mut used = vec![false; self.fibers.len()];
        let mut assignments = Vec::with_capacity(self.links.len());
        let mut core_tally = BTreeMap::new();
        let mut couplers = CouplerEstimate::new();
        let mut total_mismatch = 0;

        for (l, link) in self.links.iter().enumerate() {
            let assigned: Vec<&Fiber> = problem
                .matrix
                .link_column(l)
                .filter(|(_, var)| outcome.value(*var))
                .map(|(f, _)| {
                    used[f] = true;
                    &self.fibers[f]
                })
                .collect();

            let assignment = self.link_assignment(link, &assigned);
            total_mismatch += assigned
                .iter()
                .map(|fiber| mismatch_penalty(fiber, link, self.config))
                .sum::<i64>();

            if let Some(max_cores) = assignment.max_cores() {
                *core_tally.entry(max_cores).or_insert(0) += 1;
                couplers.add_chain(
                    assigned.len(),
                    max_cores,
                    self.config.min_coupler,
                    self.config.max_coupler,
                );
            }
            if assignment.over_budget {
                log::warn!(
                    "Link {} costs {} which exceeds the budget of {}",
                    link,
                    assignment.quality_cost,
                    self.config.max_cost
                );
            }

            assignments.push(assignment);
        }

        couplers.fold_below(self.config.min_coupler);

        let unused: Vec<Fiber> = self
            .fibers
            .iter()
            .zip(&used)
            .filter(|(_, &used)| !used)
            .map(|(fiber, _)| fiber.clone())
            .collect();

        AssignmentReport {
            status: outcome.status,
            objective: outcome.objective_value,
            mismatch_penalty: total_mismatch,
            links: assignments,
            unused,
            core_tally,
            couplers,
            metadata,
        }
    }

    fn link_assignment(&self, link: &Link, assigned: &[&Fiber]) -> LinkAssignment {
        let total_length = assigned.iter().map(|f| f.length() as u64).sum();
        let quality_cost = if assigned.is_empty() {
            0
        } else {
            assigned
                .iter()
                .map(|fiber| pair_cost(fiber, link, self.config))
                .sum::<i64>()
                - self.config.length_weight * link.length() as i64
        };

        LinkAssignment {
            link: link.clone(),
            fibers: assigned.iter().map(|&f| AssignedFiber::from(f)).collect(),
            total_length,
            quality_cost,
            over_budget: quality_cost > self.config.max_cost,
        }
    }

    pub fn no_solution(status: SolveStatus, metadata: SolveMetadata) -> AssignmentReport {
        AssignmentReport {
            status,
            objective: None,
            mismatch_penalty: 0,
            links: Vec::new(),
            unused: Vec::new(),
            core_tally: BTreeMap::new(),
            couplers: CouplerEstimate::new(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::constraints::ConstraintGenerator;
    use std::time::Duration;

    fn solved(problem: &AssignmentProblem, chosen: &[(usize, usize)]) -> SolveOutcome {
        let values = problem
            .model
            .assignment(chosen.iter().map(|&(f, l)| problem.matrix.get(f, l)));
        SolveOutcome::solved(&problem.model, SolveStatus::Optimal, values, Duration::ZERO)
    }

    #[test]
    fn test_report_lists_assignments_and_unused() {
        let fibers = vec![
            Fiber::new("F1", 1, 20),
            Fiber::new("F2", 1, 25),
            Fiber::new("spare", 12, 400),
        ];
        let links = vec![Link::new("A", "B", 1, 50)];
        let config = SolverConfig::default();
        let problem = ConstraintGenerator::new(&fibers, &links, &config).build();
        let outcome = solved(&problem, &[(0, 0), (1, 0)]);

        let report = Reporter::new(&fibers, &links, &config).report(
            &problem,
            &outcome,
            SolveMetadata::default(),
        );

        let ab = report.link("A", "B").unwrap();
        assert_eq!(ab.fiber_names(), vec!["F1", "F2"]);
        assert_eq!(ab.total_length, 45);
        assert_eq!(ab.quality_cost, -5);
        assert!(!ab.over_budget);
        assert_eq!(report.mismatch_penalty, 0);
        assert_eq!(report.unused.len(), 1);
        assert_eq!(report.unused[0].name, "spare");
        assert_eq!(report.core_tally.get(&1), Some(&1));
        // a single-core splice falls back to the smallest coupler
        assert_eq!(report.couplers.iter().collect::<Vec<_>>(), vec![(2, 1)]);
    }

    #[test]
    fn test_over_budget_flag() {
        let fibers = vec![Fiber::new("wide", 6, 150)];
        let links = vec![Link::new("A", "B", 2, 100)];
        let config = SolverConfig::default();
        let problem = ConstraintGenerator::new(&fibers, &links, &config).build();
        let outcome = solved(&problem, &[(0, 0)]);

        let report = Reporter::new(&fibers, &links, &config).report(
            &problem,
            &outcome,
            SolveMetadata::default(),
        );

        let ab = report.link("A", "B").unwrap();
        assert_eq!(ab.quality_cost, 10_000 + 400 + 50);
        assert!(ab.over_budget);
        assert_eq!(report.mismatch_penalty, 10_000);
    }

    #[test]
    fn test_core_tally_counts_links_per_widest_fiber() {
        let fibers = vec![
            Fiber::new("M1", 4, 120),
            Fiber::new("M2", 4, 130),
            Fiber::new("S1", 1, 80),
        ];
        let links = vec![
            Link::new("A", "B", 4, 100),
            Link::new("A", "C", 4, 100),
            Link::new("A", "D", 1, 70),
        ];
        let config = SolverConfig::default();
        let problem = ConstraintGenerator::new(&fibers, &links, &config).build();
        let outcome = solved(&problem, &[(0, 0), (1, 1), (2, 2)]);

        let report = Reporter::new(&fibers, &links, &config).report(
            &problem,
            &outcome,
            SolveMetadata::default(),
        );

        assert_eq!(report.core_tally.into_iter().collect::<Vec<_>>(), vec![(1, 1), (4, 2)]);
        assert!(report.couplers.is_empty());
        assert!(report.unused.is_empty());
    }

    #[test]
    fn test_no_solution_report_is_empty() {
        let fibers = vec![Fiber::new("F1", 1, 10)];
        let links = vec![Link::new("A", "B", 1, 500)];
        let config = SolverConfig::default();
        let problem = ConstraintGenerator::new(&fibers, &links, &config).build();
        let outcome = SolveOutcome::unsolved(SolveStatus::Infeasible, Duration::ZERO, None);

        let report = Reporter::new(&fibers, &links, &config).report(
            &problem,
            &outcome,
            SolveMetadata::default(),
        );

        assert!(!report.has_solution());
        assert!(report.links.is_empty());
        assert!(report.to_string().starts_with("No solution found (INFEASIBLE)."));
    }

    #[test]
    fn test_timed_out_and_error_render_status_and_message() {
        let fibers = vec![Fiber::new("F1", 1, 60)];
        let links = vec![Link::new("A", "B", 1, 50)];
        let config = SolverConfig::default();
        let problem = ConstraintGenerator::new(&fibers, &links, &config).build();

        for (status, label) in [
            (SolveStatus::TimedOut, "TIMED_OUT"),
            (SolveStatus::Error, "ERROR"),
            (SolveStatus::Unknown, "UNKNOWN"),
        ] {
            let outcome = SolveOutcome::unsolved(status, Duration::from_secs(1), None);
            let metadata = SolveMetadata {
                message: Some("no answer within 1s".to_string()),
                ..SolveMetadata::default()
            };

            let report = Reporter::new(&fibers, &links, &config).report(&problem, &outcome, metadata);

            assert_eq!(report.status, status);
            assert_eq!(report.objective, None);
            assert!(report.unused.is_empty());
            assert_eq!(
                report.to_string(),
                format!("No solution found ({}).\nno answer within 1s\n", label)
            );
        }
    }
}
