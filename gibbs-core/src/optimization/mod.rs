//! Bounded global minimization.
//!
//! Solvers implement the [Minimizer] trait and are selected through the
//! [OptimizationMethod] enum, so that callers like the stability analysis
//! only depend on the uniform `minimize` contract:
//! an objective `f(x, args)`, a box `[(low, high); n]` and auxiliary
//! arguments go in, an [OptimizationOutcome] comes out.
use crate::{GibbsError, GibbsResult};
use enum_dispatch::enum_dispatch;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

mod differential_evolution;
pub use differential_evolution::{
    DifferentialEvolution, DifferentialEvolutionSettings, Mutation, Strategy, Updating,
};

/// Result of a minimization.
#[derive(Clone, Debug)]
pub struct OptimizationOutcome {
    /// Best decision variables found.
    pub x: Array1<f64>,
    /// Objective function value at `x`.
    pub fun: f64,
    /// Whether the solver met its convergence criterion.
    pub converged: bool,
    /// Number of iterations (generations) performed.
    pub iterations: usize,
    /// Number of objective function evaluations.
    pub function_evaluations: usize,
    /// Termination message of the solver.
    pub message: String,
}

impl fmt::Display for OptimizationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        writeln!(f, "x: {}", self.x)?;
        writeln!(f, "fun: {}", self.fun)?;
        write!(
            f,
            "converged: {}, iterations: {}, function evaluations: {}",
            self.converged, self.iterations, self.function_evaluations
        )
    }
}

/// A bounded minimizer.
#[enum_dispatch]
pub trait Minimizer {
    /// Minimize `objective(x, args)` for `x` inside the box spanned by `bounds`.
    fn minimize<A: Sync, F: Fn(&Array1<f64>, &A) -> f64 + Sync>(
        &self,
        objective: F,
        bounds: &[(f64, f64)],
        args: &A,
    ) -> GibbsResult<OptimizationOutcome>;
}

/// Available minimizers.
#[enum_dispatch(Minimizer)]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum OptimizationMethod {
    DifferentialEvolution,
}

impl Default for OptimizationMethod {
    fn default() -> Self {
        DifferentialEvolution::default().into()
    }
}

impl From<DifferentialEvolutionSettings> for OptimizationMethod {
    fn from(settings: DifferentialEvolutionSettings) -> Self {
        DifferentialEvolution::new(settings).into()
    }
}

/// An objective function together with its search space, auxiliary
/// arguments and the method used to minimize it.
pub struct OptimizationProblem<F, A> {
    objective: F,
    bounds: Vec<(f64, f64)>,
    args: A,
    method: OptimizationMethod,
}

impl<F, A> OptimizationProblem<F, A>
where
    A: Sync,
    F: Fn(&Array1<f64>, &A) -> f64 + Sync,
{
    pub fn new(
        objective: F,
        bounds: Vec<(f64, f64)>,
        args: A,
        method: OptimizationMethod,
    ) -> GibbsResult<Self> {
        validate_bounds(&bounds)?;
        Ok(Self {
            objective,
            bounds,
            args,
            method,
        })
    }

    pub fn number_of_decision_variables(&self) -> usize {
        self.bounds.len()
    }

    /// Run the minimizer. Blocks until the solver terminates.
    pub fn solve(&self) -> GibbsResult<OptimizationOutcome> {
        self.method
            .minimize(&self.objective, &self.bounds, &self.args)
    }
}

pub(crate) fn validate_bounds(bounds: &[(f64, f64)]) -> GibbsResult<()> {
    if bounds.is_empty() {
        return Err(GibbsError::InvalidOptimizationProblem(String::from(
            "at least one decision variable is required.",
        )));
    }
    for (i, &(low, high)) in bounds.iter().enumerate() {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(GibbsError::InvalidOptimizationProblem(format!(
                "bounds of variable {} are ({}, {}).",
                i, low, high
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sphere(x: &Array1<f64>, center: &Array1<f64>) -> f64 {
        (x - center).mapv(|d| d * d).sum()
    }

    #[test]
    fn solve_problem() -> GibbsResult<()> {
        let settings = DifferentialEvolutionSettings::new().seed(7).atol(1e-12);
        let problem = OptimizationProblem::new(
            sphere,
            vec![(-5.0, 5.0); 3],
            Array1::from_vec(vec![1.0, -2.0, 0.5]),
            settings.into(),
        )?;
        assert_eq!(problem.number_of_decision_variables(), 3);
        let outcome = problem.solve()?;
        assert!(outcome.converged);
        assert_relative_eq!(outcome.x[0], 1.0, epsilon = 1e-4);
        assert_relative_eq!(outcome.x[1], -2.0, epsilon = 1e-4);
        assert_relative_eq!(outcome.x[2], 0.5, epsilon = 1e-4);
        assert!(outcome.fun < 1e-8);
        Ok(())
    }

    #[test]
    fn invalid_bounds() {
        let method = OptimizationMethod::default();
        let empty = OptimizationProblem::new(sphere, vec![], Array1::zeros(0), method.clone());
        assert!(matches!(
            empty,
            Err(GibbsError::InvalidOptimizationProblem(_))
        ));
        let inverted =
            OptimizationProblem::new(sphere, vec![(1.0, 0.0)], Array1::zeros(1), method.clone());
        assert!(inverted.is_err());
        let infinite = OptimizationProblem::new(
            sphere,
            vec![(0.0, f64::INFINITY)],
            Array1::zeros(1),
            method,
        );
        assert!(infinite.is_err());
    }

    #[test]
    fn method_from_settings() {
        let method: OptimizationMethod = DifferentialEvolutionSettings::new()
            .recombination(0.9)
            .into();
        let OptimizationMethod::DifferentialEvolution(de) = method;
        assert_eq!(de.settings.recombination, 0.9);
    }
}
