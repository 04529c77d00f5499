use crate::logic::couplers::CouplerEstimate;
use crate::model::{Fiber, Link};
use crate::solver::SolveStatus;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of one assignment run: the solution read back from the solver plus usage figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentReport {
    pub status: SolveStatus,

    /// Objective value of the accepted solution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<i64>,

    /// Sum of core mismatch penalties charged by the solution
    pub mismatch_penalty: i64,

    /// Links in processing order with the fibers serving them
    pub links: Vec<LinkAssignment>,

    pub unused: Vec<Fiber>,

    /// Number of links per widest assigned fiber core count
    pub core_tally: BTreeMap<u32, usize>,

    pub couplers: CouplerEstimate,

    pub metadata: SolveMetadata,
}

impl AssignmentReport {
    pub fn has_solution(&self) -> bool {
        self.status.has_solution()
    }

    pub fn link(&self, source: &str, destination: &str) -> Option<&LinkAssignment> {
        self.links
            .iter()
            .find(|a| a.link.id.source == source && a.link.id.destination == destination)
    }

    pub fn fibers_used(&self) -> usize {
        self.links.iter().map(|a| a.fibers.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedFiber {
    pub name: String,
    pub cores: u32,
    pub length: u32,
}

impl From<&Fiber> for AssignedFiber {
    fn from(fiber: &Fiber) -> Self {
        Self {
            name: fiber.name.clone(),
            cores: fiber.span.cores,
            length: fiber.span.length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkAssignment {
    pub link: Link,
    pub fibers: Vec<AssignedFiber>,
    pub total_length: u64,
    /// Mismatch, core overrun and length overrun charged for this link
    pub quality_cost: i64,
    /// Set when `quality_cost` exceeds the configured budget
    pub over_budget: bool,
}

impl LinkAssignment {
    pub fn max_cores(&self) -> Option<u32> {
        self.fibers.iter().map(|f| f.cores).max()
    }

    pub fn fiber_names(&self) -> Vec<&str> {
        self.fibers.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Metadata about a solve run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveMetadata {
    /// Total time taken for the run (in milliseconds)
    pub total_time_ms: u64,

    /// Phases of the pipeline with their timings
    pub pipeline_phases: Vec<PipelinePhase>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver_info: Option<SolverInfo>,

    pub statistics: SolveStatistics,

    /// Explanation attached to a run without a solution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelinePhase {
    pub name: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveStatistics {
    pub fibers: usize,
    pub links: usize,
    pub variables: usize,
    pub constraints: usize,
    pub pruned_pairs: usize,
}

fn list<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    format!("[{}]", items.map(|i| i.to_string()).join(", "))
}

impl fmt::Display for AssignmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_solution() {
            writeln!(f, "No solution found ({}).", self.status)?;
            if let Some(message) = &self.metadata.message {
                writeln!(f, "{}", message)?;
            }
            return Ok(());
        }

        writeln!(f, "Total cost = {}", self.objective.unwrap_or_default())?;
        writeln!(f, "Mismatch penalty = {}", self.mismatch_penalty)?;
        writeln!(f)?;

        for assignment in &self.links {
            writeln!(
                f,
                "Link {} with length {} and {} cores has {} {} {} {}{}",
                assignment.link,
                assignment.link.span.length,
                assignment.link.span.cores,
                list(assignment.fibers.iter().map(|a| &a.name)),
                list(assignment.fibers.iter().map(|a| a.length)),
                assignment.total_length,
                list(assignment.fibers.iter().map(|a| a.cores)),
                if assignment.over_budget {
                    format!(" (cost {} over budget)", assignment.quality_cost)
                } else {
                    String::new()
                }
            )?;
        }

        for fiber in &self.unused {
            writeln!(f, "not using {}", fiber)?;
        }

        for (cores, amount) in &self.core_tally {
            writeln!(f, "cores {} amount {}", cores, amount)?;
        }

        for (tier, amount) in self.couplers.iter() {
            writeln!(f, "couplers {} amount {}", tier, amount)?;
        }

        Ok(())
    }
}
