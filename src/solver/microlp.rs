use crate::solver::{is_constant, Assignment, Backend, Model, Sense, SolveLimits, SolveOutcome, SolveStatus};
use ::microlp::{ComparisonOp, OptimizationDirection, Problem};
use good_lp::{IntoAffineExpression, Variable};
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

/// Branch and bound backend built on the pure Rust `microlp` solver.
///
/// The `good_lp` model is lowered the way `good_lp` lowers into its own pure Rust
/// backends, but onto `microlp`'s integer search. The search runs on a worker
/// thread so a time budget can be enforced. `microlp` offers no cancellation, so
/// a worker that exceeds its budget is detached and left to finish in the background.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

impl MicroLpBackend {
    pub fn new() -> Self {
        Self
    }
}

enum Lowered {
    Problem(Problem, Vec<::microlp::Variable>),
    /// A constant row is already violated; no search needed.
    Infeasible(String),
    /// A row mentions a variable the model never declared.
    Invalid(String),
}

fn lower(model: &Model) -> Lowered {
    let mut problem = Problem::new(OptimizationDirection::Minimize);
    let position: HashMap<Variable, usize> = model
        .vars()
        .iter()
        .enumerate()
        .map(|(i, &var)| (var, i))
        .collect();

    let mut costs = vec![0.0; model.num_vars()];
    if let Some(objective) = model.objective() {
        for (var, coeff) in IntoAffineExpression::linear_coefficients(objective) {
            match position.get(&var) {
                Some(&i) => costs[i] += coeff,
                None => return Lowered::Invalid("objective".to_string()),
            }
        }
    }
    let vars: Vec<::microlp::Variable> = costs
        .iter()
        .map(|&cost| problem.add_binary_var(cost))
        .collect();

    let nothing = model.assignment([]);
    for row in model.rows() {
        if is_constant(&row.expr) {
            if !row.is_satisfied(&nothing) {
                return Lowered::Infeasible(row.name.clone());
            }
            continue;
        }

        let mut terms = Vec::new();
        for (var, coeff) in IntoAffineExpression::linear_coefficients(&row.expr) {
            if coeff == 0.0 {
                continue;
            }
            match position.get(&var) {
                Some(&i) => terms.push((i, coeff)),
                None => return Lowered::Invalid(row.name.clone()),
            }
        }
        // Stable term order keeps the search reproducible
        terms.sort_by_key(|&(i, _)| i);
        let terms: Vec<(::microlp::Variable, f64)> =
            terms.into_iter().map(|(i, coeff)| (vars[i], coeff)).collect();

        let op = match row.sense {
            Sense::Le => ComparisonOp::Le,
            Sense::Ge => ComparisonOp::Ge,
            Sense::Eq => ComparisonOp::Eq,
        };
        problem.add_constraint(terms, op, row.effective_rhs());
    }

    Lowered::Problem(problem, vars)
}

fn search(problem: Problem, vars: Vec<::microlp::Variable>) -> Result<Vec<bool>, ::microlp::Error> {
    let solution = problem.solve()?;
    Ok(vars
        .iter()
        .map(|&var| solution.var_value_rounded(var) > 0.5)
        .collect())
}

impl Backend for MicroLpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, model: &Model, limits: &SolveLimits) -> SolveOutcome {
        let start = Instant::now();

        if model.num_vars() == 0 {
            let nothing = model.assignment([]);
            let violated = model.violations(&nothing);
            return match violated.first() {
                None => SolveOutcome::solved(model, SolveStatus::Optimal, nothing, start.elapsed()),
                Some(row) => SolveOutcome::unsolved(
                    SolveStatus::Infeasible,
                    start.elapsed(),
                    Some(format!("constraint {} cannot hold", row.name)),
                ),
            };
        }

        let (problem, vars) = match lower(model) {
            Lowered::Problem(problem, vars) => (problem, vars),
            Lowered::Infeasible(name) => {
                return SolveOutcome::unsolved(
                    SolveStatus::Infeasible,
                    start.elapsed(),
                    Some(format!("constraint {} cannot hold", name)),
                );
            }
            Lowered::Invalid(name) => {
                return SolveOutcome::unsolved(
                    SolveStatus::Error,
                    start.elapsed(),
                    Some(format!("{} refers to a variable outside the model", name)),
                );
            }
        };
        log::debug!(
            "microlp: {} binary variables, {} rows",
            vars.len(),
            model.num_constraints()
        );

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("microlp-search".to_string())
            .spawn(move || {
                let _ = tx.send(search(problem, vars));
            });
        if let Err(e) = spawned {
            return SolveOutcome::unsolved(
                SolveStatus::Error,
                start.elapsed(),
                Some(format!("failed to start search worker: {}", e)),
            );
        }

        let received = match limits.time_limit {
            Some(limit) => rx.recv_timeout(limit),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Ok(values)) => {
                let values: Assignment = model.vars().iter().copied().zip(values).collect();
                SolveOutcome::solved(model, SolveStatus::Optimal, values, start.elapsed())
            }
            Ok(Err(::microlp::Error::Infeasible)) => {
                SolveOutcome::unsolved(SolveStatus::Infeasible, start.elapsed(), None)
            }
            Ok(Err(::microlp::Error::Unbounded)) => SolveOutcome::unsolved(
                SolveStatus::Unknown,
                start.elapsed(),
                Some("relaxation reported unbounded".to_string()),
            ),
            Ok(Err(::microlp::Error::InternalError(msg))) => {
                SolveOutcome::unsolved(SolveStatus::Error, start.elapsed(), Some(msg))
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "microlp search exceeded {:?}; abandoning worker",
                    limits.time_limit.unwrap_or_default()
                );
                SolveOutcome::unsolved(
                    SolveStatus::TimedOut,
                    start.elapsed(),
                    Some(format!(
                        "no answer within {:?}",
                        limits.time_limit.unwrap_or_default()
                    )),
                )
            }
            Err(RecvTimeoutError::Disconnected) => SolveOutcome::unsolved(
                SolveStatus::Error,
                start.elapsed(),
                Some("search worker terminated without an answer".to_string()),
            ),
        }
    }
}
