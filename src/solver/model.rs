use good_lp::{variable, Expression, IntoAffineExpression, ProblemVariables, Variable};
use std::collections::HashMap;
use std::fmt;

/// Values of every variable of a [`Model`]; a `good_lp` solution in its own right.
pub type Assignment = HashMap<Variable, bool>;

const TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
            Sense::Eq => write!(f, "=="),
        }
    }
}

/// A named row `expr <sense> rhs`. The constant part of `expr` counts on the left.
#[derive(Debug, Clone)]
pub struct Row {
    pub name: String,
    pub expr: Expression,
    pub sense: Sense,
    pub rhs: f64,
}

impl Row {
    pub fn is_satisfied(&self, values: &Assignment) -> bool {
        let lhs = (&self.expr).eval_with(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + TOLERANCE,
            Sense::Ge => lhs >= self.rhs - TOLERANCE,
            Sense::Eq => (lhs - self.rhs).abs() <= TOLERANCE,
        }
    }

    /// Right-hand side with the expression constant moved across.
    pub fn effective_rhs(&self) -> f64 {
        self.rhs - self.expr.constant()
    }
}

/// Whether `expr` has no variable with a non-zero coefficient.
pub fn is_constant(expr: &Expression) -> bool {
    IntoAffineExpression::linear_coefficients(expr)
        .into_iter()
        .all(|(_, coeff)| coeff == 0.0)
}

/// A 0/1 program over `good_lp` variables: named rows and one objective to minimize.
#[derive(Default)]
pub struct Model {
    variables: ProblemVariables,
    vars: Vec<Variable>,
    rows: Vec<Row>,
    objective: Option<Expression>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool_var(&mut self, name: impl Into<String>) -> Variable {
        let var = self.variables.add(variable().binary().name(name));
        self.vars.push(var);
        var
    }

    pub fn add_row(&mut self, name: impl Into<String>, expr: Expression, sense: Sense, rhs: f64) {
        self.rows.push(Row {
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    pub fn add_le(&mut self, name: impl Into<String>, expr: Expression, rhs: f64) {
        self.add_row(name, expr, Sense::Le, rhs);
    }

    pub fn add_ge(&mut self, name: impl Into<String>, expr: Expression, rhs: f64) {
        self.add_row(name, expr, Sense::Ge, rhs);
    }

    pub fn add_eq(&mut self, name: impl Into<String>, expr: Expression, rhs: f64) {
        self.add_row(name, expr, Sense::Eq, rhs);
    }

    /// Bound `expr` to `[lower, upper]`, collapsing to an equality when both ends meet.
    pub fn add_range(&mut self, name: impl Into<String>, expr: Expression, lower: f64, upper: f64) {
        let name = name.into();
        if lower == upper {
            self.add_eq(name, expr, lower);
        } else {
            self.add_ge(format!("{}.min", name), expr.clone(), lower);
            self.add_le(format!("{}.max", name), expr, upper);
        }
    }

    /// Force a variable to a fixed value.
    pub fn fix(&mut self, var: Variable, value: bool) {
        let name = format!("fix[{}]", self.var_name(var));
        self.add_eq(name, Expression::from(var), f64::from(value));
    }

    /// Set the objective to minimize. A model carries exactly one objective.
    pub fn minimize(&mut self, objective: Expression) {
        if self.objective.is_some() {
            log::warn!("Replacing an existing objective; only the latest one is optimized");
        }
        self.objective = Some(objective);
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.rows.len()
    }

    pub fn var_name(&self, var: Variable) -> String {
        self.variables.display(&var).to_string()
    }

    /// Variables in creation order
    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn objective(&self) -> Option<&Expression> {
        self.objective.as_ref()
    }

    /// Assignment setting exactly the `chosen` variables.
    pub fn assignment(&self, chosen: impl IntoIterator<Item = Variable>) -> Assignment {
        let mut values: Assignment = self.vars.iter().map(|&var| (var, false)).collect();
        for var in chosen {
            values.insert(var, true);
        }
        values
    }

    pub fn objective_value(&self, values: &Assignment) -> i64 {
        self.objective
            .as_ref()
            .map(|objective| objective.eval_with(values).round() as i64)
            .unwrap_or(0)
    }

    /// Rows the assignment breaks; empty means feasible.
    pub fn violations(&self, values: &Assignment) -> Vec<&Row> {
        self.rows.iter().filter(|row| !row.is_satisfied(values)).collect()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("vars", &self.vars.len())
            .field("rows", &self.rows.len())
            .field("has_objective", &self.objective.is_some())
            .finish()
    }
}
