use crate::solver::{Assignment, Model};
use good_lp::Variable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Terminal state of a solve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// A solution was found and proven optimal.
    Optimal,
    /// A solution was found without an optimality proof.
    Feasible,
    /// The constraints cannot be satisfied.
    Infeasible,
    /// The search ended without a solution or a proof.
    Unknown,
    /// The time budget elapsed before the search finished.
    TimedOut,
    /// The backend failed internally or returned an invalid answer.
    Error,
}

impl SolveStatus {
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
            SolveStatus::TimedOut => "TIMED_OUT",
            SolveStatus::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveLimits {
    pub time_limit: Option<Duration>,
}

impl SolveLimits {
    pub fn unlimited() -> Self {
        Self { time_limit: None }
    }

    pub fn with_time_limit(time_limit: Duration) -> Self {
        Self {
            time_limit: Some(time_limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub objective_value: Option<i64>,
    /// Value of every model variable. Empty without a solution.
    pub values: Assignment,
    pub elapsed: Duration,
    pub message: Option<String>,
}

impl SolveOutcome {
    pub fn solved(model: &Model, status: SolveStatus, values: Assignment, elapsed: Duration) -> Self {
        Self {
            status,
            objective_value: Some(model.objective_value(&values)),
            values,
            elapsed,
            message: None,
        }
    }

    pub fn unsolved(status: SolveStatus, elapsed: Duration, message: Option<String>) -> Self {
        Self {
            status,
            objective_value: None,
            values: Assignment::new(),
            elapsed,
            message,
        }
    }

    pub fn value(&self, var: Variable) -> bool {
        self.values.get(&var).copied().unwrap_or(false)
    }
}

/// A constraint-optimization engine able to solve a [`Model`].
pub trait Backend {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &Model, limits: &SolveLimits) -> SolveOutcome;
}
