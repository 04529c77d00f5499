use crate::config::SolverConfig;
use crate::logic::fitness::is_admissible;
use crate::model::{Connection, Fiber, Link};
use crate::solver::{is_constant, Model};
use good_lp::{Expression, Variable};

/// Dense fiber × link grid of decision variables, fiber-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentMatrix {
    fiber_count: usize,
    link_count: usize,
    vars: Vec<Variable>,
}

impl AssignmentMatrix {
    pub fn get(&self, fiber: usize, link: usize) -> Variable {
        self.vars[fiber * self.link_count + link]
    }

    /// Variables of one fiber across every link
    pub fn fiber_row(&self, fiber: usize) -> impl Iterator<Item = Variable> + '_ {
        let start = fiber * self.link_count;
        self.vars[start..start + self.link_count].iter().copied()
    }

    /// `(fiber index, variable)` for every fiber on one link
    pub fn link_column(&self, link: usize) -> impl Iterator<Item = (usize, Variable)> + '_ {
        (0..self.fiber_count).map(move |fiber| (fiber, self.get(fiber, link)))
    }

    pub fn fiber_count(&self) -> usize {
        self.fiber_count
    }

    pub fn link_count(&self) -> usize {
        self.link_count
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// A populated model together with the matrix that indexes it.
#[derive(Debug)]
pub struct AssignmentProblem {
    pub model: Model,
    pub matrix: AssignmentMatrix,
    pub pruned_pairs: usize,
}

/// Turns fibers, links and configuration into decision variables and feasibility rows.
pub struct ConstraintGenerator<'a> {
    fibers: &'a [Fiber],
    links: &'a [Link],
    config: &'a SolverConfig,
}

impl<'a> ConstraintGenerator<'a> {
    pub fn new(fibers: &'a [Fiber], links: &'a [Link], config: &'a SolverConfig) -> Self {
        Self {
            fibers,
            links,
            config,
        }
    }

    pub fn build(&self) -> AssignmentProblem {
        let mut model = Model::new();
        let matrix = self.declare_variables(&mut model);
        let pruned_pairs = self.prune_inadmissible(&mut model, &matrix);

        for (f, fiber) in self.fibers.iter().enumerate() {
            let used: Expression = matrix.fiber_row(f).sum();
            model.add_le(format!("fiber[{}].at_most_one", fiber.name), used, 1.0);
        }

        for (l, link) in self.links.iter().enumerate() {
            if link.is_multicore() {
                self.add_multicore_rules(&mut model, &matrix, l, link);
            } else {
                self.add_chain_rules(&mut model, &matrix, l, link);
            }
        }

        log::debug!(
            "Built {} variables and {} constraints ({} pairs pruned)",
            model.num_vars(),
            model.num_constraints(),
            pruned_pairs
        );

        AssignmentProblem {
            model,
            matrix,
            pruned_pairs,
        }
    }

    fn declare_variables(&self, model: &mut Model) -> AssignmentMatrix {
        let mut vars = Vec::with_capacity(self.fibers.len() * self.links.len());
        for fiber in self.fibers {
            for link in self.links {
                vars.push(model.new_bool_var(format!("x[{},{}]", fiber.name, link.id)));
            }
        }
        AssignmentMatrix {
            fiber_count: self.fibers.len(),
            link_count: self.links.len(),
            vars,
        }
    }

    fn prune_inadmissible(&self, model: &mut Model, matrix: &AssignmentMatrix) -> usize {
        let mut pruned = 0;
        for (f, fiber) in self.fibers.iter().enumerate() {
            for (l, link) in self.links.iter().enumerate() {
                if !is_admissible(fiber, link) {
                    model.fix(matrix.get(f, l), false);
                    pruned += 1;
                }
            }
        }
        pruned
    }

    fn column<F>(&self, matrix: &AssignmentMatrix, link: usize, weight: F) -> Expression
    where
        F: Fn(&Fiber) -> f64,
    {
        matrix
            .link_column(link)
            .map(|(f, var)| weight(&self.fibers[f]) * var)
            .sum()
    }

    /// Multicore runs take exactly one fiber: no splicing of multicore segments.
    fn add_multicore_rules(
        &self,
        model: &mut Model,
        matrix: &AssignmentMatrix,
        l: usize,
        link: &Link,
    ) {
        let name = format!("link[{}]", link.id);

        model.add_eq(
            format!("{}.single", name),
            self.column(matrix, l, |_| 1.0),
            1.0,
        );
        model.add_range(
            format!("{}.length", name),
            self.column(matrix, l, |f| f64::from(f.length())),
            f64::from(link.length()),
            self.config.multicore_length_cap(link.length()) as f64,
        );
        model.add_range(
            format!("{}.cores", name),
            self.column(matrix, l, |f| f64::from(f.cores())),
            f64::from(link.cores()),
            self.config.max_cores as f64,
        );
    }

    /// Low-core runs may chain up to `maxChain` fibers; slack absorbs small shortfalls.
    fn add_chain_rules(&self, model: &mut Model, matrix: &AssignmentMatrix, l: usize, link: &Link) {
        let name = format!("link[{}]", link.id);

        let length = self.column(matrix, l, |f| f64::from(f.length())) + self.config.slack as f64;
        model.add_range(
            format!("{}.length", name),
            length,
            f64::from(link.length()),
            self.config.chain_length_cap(link.length()) as f64,
        );
        model.add_range(
            format!("{}.chain", name),
            self.column(matrix, l, |_| 1.0),
            1.0,
            self.config.max_chain as f64,
        );
        model.add_le(
            format!("{}.cores", name),
            self.column(matrix, l, |f| f64::from(f.cores())),
            self.config.max_cores as f64,
        );

        let max_chain_core = self.config.max_chain_core;
        let high_core = self.column(matrix, l, |f| f64::from(f.cores() > max_chain_core));
        if self.config.max_chain > 1 && !is_constant(&high_core) {
            model.add_le(format!("{}.high_core_chain", name), high_core, 1.0);
        }
    }
}
