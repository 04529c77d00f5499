use crate::config::SolverConfig;
use crate::logic::constraints::ConstraintGenerator;
use crate::logic::objective::ObjectiveComposer;
use crate::logic::report::Reporter;
use crate::model::{
    AssignmentReport, Fiber, Link, PipelinePhase, SolveMetadata, SolveStatistics, SolverInfo,
};
use crate::solver::{Backend, Model, SolveLimits, SolveOutcome, SolveStatus};
use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::time::Instant;

/// The assignment pipeline orchestrates one complete run
/// From fibers + links → model → solve → AssignmentReport
pub struct AssignmentPipeline<'a> {
    fibers: &'a [Fiber],
    links: Vec<Link>,
    config: &'a SolverConfig,
}

impl<'a> AssignmentPipeline<'a> {
    /// Create a pipeline. Links are reordered so the most constrained come first.
    pub fn new(fibers: &'a [Fiber], links: &[Link], config: &'a SolverConfig) -> Self {
        Self {
            fibers,
            links: order_links(links),
            config,
        }
    }

    /// Links in the order they are modelled and reported
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Execute the pipeline with the configured time budget
    pub fn run<B: Backend>(&self, backend: &B) -> Result<AssignmentReport> {
        let limits = match self.config.time_limit() {
            Some(limit) => SolveLimits::with_time_limit(limit),
            None => SolveLimits::unlimited(),
        };
        self.run_with_limits(backend, &limits)
    }

    pub fn run_with_limits<B: Backend>(
        &self,
        backend: &B,
        limits: &SolveLimits,
    ) -> Result<AssignmentReport> {
        let start_time = Instant::now();
        let mut phases = Vec::new();

        // Step 1: Check configuration and entity identities
        self.config.validate()?;
        self.check_identities()?;

        // Step 2: Build variables and feasibility constraints
        let phase_start = Instant::now();
        let mut problem = ConstraintGenerator::new(self.fibers, &self.links, self.config).build();
        phases.push(phase("build_constraints", phase_start));

        // Step 3: Compose the single objective
        let phase_start = Instant::now();
        ObjectiveComposer::new(self.fibers, &self.links, self.config).apply(&mut problem);
        phases.push(phase("compose_objective", phase_start));

        log::info!(
            "Solving {} fibers x {} links with {} ({} variables, {} constraints, {} pairs pruned)",
            self.fibers.len(),
            self.links.len(),
            backend.name(),
            problem.model.num_vars(),
            problem.model.num_constraints(),
            problem.pruned_pairs
        );

        // Step 4: Solve
        let phase_start = Instant::now();
        let outcome = backend.solve(&problem.model, limits);
        phases.push(phase("solve", phase_start));

        // Step 5: Reject answers that break the model
        let outcome = validate(&problem.model, outcome);
        match outcome.status {
            SolveStatus::Optimal | SolveStatus::Feasible => log::info!(
                "Solver finished {} with objective {} in {:?}",
                outcome.status,
                outcome.objective_value.unwrap_or_default(),
                outcome.elapsed
            ),
            status => log::warn!(
                "Solver finished {} after {:?}{}",
                status,
                outcome.elapsed,
                outcome
                    .message
                    .as_ref()
                    .map(|m| format!(": {}", m))
                    .unwrap_or_default()
            ),
        }

        // Step 6: Read the solution back
        let phase_start = Instant::now();
        let mut metadata = SolveMetadata {
            total_time_ms: 0,
            pipeline_phases: Vec::new(),
            solver_info: Some(SolverInfo {
                name: backend.name().to_string(),
                time_limit_secs: limits.time_limit.map(|d| d.as_secs()),
            }),
            statistics: SolveStatistics {
                fibers: self.fibers.len(),
                links: self.links.len(),
                variables: problem.model.num_vars(),
                constraints: problem.model.num_constraints(),
                pruned_pairs: problem.pruned_pairs,
            },
            message: outcome.message.clone(),
        };
        let mut report = Reporter::new(self.fibers, &self.links, self.config).report(
            &problem,
            &outcome,
            metadata.clone(),
        );
        phases.push(phase("report", phase_start));

        metadata.pipeline_phases = phases;
        metadata.total_time_ms = start_time.elapsed().as_millis() as u64;
        report.metadata = metadata;

        Ok(report)
    }

    fn check_identities(&self) -> Result<()> {
        let mut names = HashSet::new();
        for fiber in self.fibers {
            if !names.insert(fiber.name.as_str()) {
                return Err(anyhow!("Duplicate fiber name '{}'", fiber.name));
            }
        }
        let mut ids = HashSet::new();
        for link in &self.links {
            if !ids.insert(&link.id) {
                return Err(anyhow!("Duplicate link '{}'", link.id));
            }
        }
        Ok(())
    }
}

/// Most constrained first: by descending priority, identity breaking ties.
pub fn order_links(links: &[Link]) -> Vec<Link> {
    let mut ordered = links.to_vec();
    ordered.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| a.id.cmp(&b.id))
    });
    ordered
}

fn phase(name: &str, started: Instant) -> PipelinePhase {
    PipelinePhase {
        name: name.to_string(),
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

fn validate(model: &Model, outcome: SolveOutcome) -> SolveOutcome {
    if !outcome.status.has_solution() {
        return outcome;
    }
    let missing = model
        .vars()
        .iter()
        .filter(|var| !outcome.values.contains_key(var))
        .count();
    if missing > 0 {
        return SolveOutcome::unsolved(
            SolveStatus::Error,
            outcome.elapsed,
            Some(format!(
                "backend left {} of {} variables unassigned",
                missing,
                model.num_vars()
            )),
        );
    }
    match model.violations(&outcome.values).first() {
        None => outcome,
        Some(constraint) => SolveOutcome::unsolved(
            SolveStatus::Error,
            outcome.elapsed,
            Some(format!("backend solution violates {}", constraint.name)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Backend answering with a fixed assignment, in variable order
    struct FixedBackend(Vec<bool>);

    impl Backend for FixedBackend {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn solve(&self, model: &Model, _limits: &SolveLimits) -> SolveOutcome {
            let values = model.vars().iter().copied().zip(self.0.iter().copied()).collect();
            SolveOutcome::solved(model, SolveStatus::Feasible, values, Duration::ZERO)
        }
    }

    /// Backend whose budget always runs out
    struct ExhaustedBackend;

    impl Backend for ExhaustedBackend {
        fn name(&self) -> &'static str {
            "exhausted"
        }

        fn solve(&self, _model: &Model, limits: &SolveLimits) -> SolveOutcome {
            SolveOutcome::unsolved(
                SolveStatus::TimedOut,
                limits.time_limit.unwrap_or_default(),
                Some("no answer within 60s".to_string()),
            )
        }
    }

    #[test]
    fn test_links_ordered_most_constrained_first() {
        let links = vec![
            Link::new("A", "B", 1, 900),
            Link::new("A", "C", 4, 10),
            Link::new("A", "D", 1, 900),
            Link::new("A", "E", 12, 5),
        ];
        let ordered: Vec<String> = order_links(&links).iter().map(|l| l.to_string()).collect();
        assert_eq!(ordered, vec!["A to E", "A to C", "A to B", "A to D"]);
    }

    #[test]
    fn test_duplicate_fiber_names_rejected() {
        let fibers = vec![Fiber::new("F1", 1, 10), Fiber::new("F1", 1, 20)];
        let links = vec![Link::new("A", "B", 1, 10)];
        let config = SolverConfig::default();
        let pipeline = AssignmentPipeline::new(&fibers, &links, &config);
        assert!(pipeline.run(&FixedBackend(vec![true, false])).is_err());
    }

    #[test]
    fn test_invalid_backend_answer_becomes_error() {
        let fibers = vec![Fiber::new("F1", 1, 10), Fiber::new("F2", 1, 10)];
        let links = vec![Link::new("A", "B", 1, 10)];
        let config = SolverConfig::default();
        let pipeline = AssignmentPipeline::new(&fibers, &links, &config);

        let report = pipeline
            .run_with_limits(&FixedBackend(vec![false, false]), &SolveLimits::unlimited())
            .unwrap();

        assert_eq!(report.status, SolveStatus::Error);
        assert!(report
            .metadata
            .message
            .as_deref()
            .unwrap_or_default()
            .contains("link[A to B]."));
    }

    #[test]
    fn test_metadata_records_phases_and_sizes() {
        let fibers = vec![Fiber::new("F1", 1, 10)];
        let links = vec![Link::new("A", "B", 1, 10)];
        let config = SolverConfig::default();
        let pipeline = AssignmentPipeline::new(&fibers, &links, &config);

        let report = pipeline.run(&FixedBackend(vec![true])).unwrap();

        assert_eq!(report.status, SolveStatus::Feasible);
        assert_eq!(report.metadata.statistics.variables, 1);
        assert_eq!(report.metadata.solver_info.as_ref().unwrap().name, "fixed");
        assert_eq!(
            report.metadata.solver_info.as_ref().unwrap().time_limit_secs,
            Some(60)
        );
        let names: Vec<&str> = report
            .metadata
            .pipeline_phases
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["build_constraints", "compose_objective", "solve", "report"]);
    }

    #[test]
    fn test_short_answer_becomes_error() {
        let fibers = vec![Fiber::new("F1", 1, 60), Fiber::new("F2", 1, 60)];
        let links = vec![Link::new("A", "B", 1, 50)];
        let config = SolverConfig::default();
        let pipeline = AssignmentPipeline::new(&fibers, &links, &config);

        let report = pipeline.run(&FixedBackend(vec![true])).unwrap();

        assert_eq!(report.status, SolveStatus::Error);
        assert_eq!(
            report.metadata.message.as_deref(),
            Some("backend left 1 of 2 variables unassigned")
        );
    }

    #[test]
    fn test_invalid_config_rejected_before_solving() {
        let fibers = vec![Fiber::new("F1", 1, 20), Fiber::new("F2", 1, 25)];
        let links = vec![Link::new("A", "B", 1, 50)];
        let config = SolverConfig {
            min_coupler: 0,
            ..SolverConfig::default()
        };
        let pipeline = AssignmentPipeline::new(&fibers, &links, &config);

        let err = pipeline.run(&FixedBackend(vec![true, true])).unwrap_err();
        assert!(err.to_string().contains("minCoupler"));
    }

    #[test]
    fn test_timeout_is_reported_not_raised() {
        let fibers = vec![Fiber::new("F1", 1, 60)];
        let links = vec![Link::new("A", "B", 1, 50)];
        let config = SolverConfig::default();
        let pipeline = AssignmentPipeline::new(&fibers, &links, &config);

        let report = pipeline.run(&ExhaustedBackend).unwrap();

        assert_eq!(report.status, SolveStatus::TimedOut);
        assert_ne!(report.status, SolveStatus::Infeasible);
        assert!(report.links.is_empty());
        assert_eq!(report.metadata.message.as_deref(), Some("no answer within 60s"));
        assert!(report
            .to_string()
            .starts_with("No solution found (TIMED_OUT).\nno answer within 60s"));
    }
}
