#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
use serde::{Deserialize, Serialize};

/// Print messages with level `Verbosity::Iter` or higher.
#[macro_export]
macro_rules! log_iter {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::Verbosity::Iter {
            println!($($arg)*);
        }
    }
}

/// Print messages with level `Verbosity::Result` or higher.
#[macro_export]
macro_rules! log_result {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::Verbosity::Result {
            println!($($arg)*);
        }
    }
}

mod equation_of_state;
mod errors;
pub mod optimization;
mod phase_equilibria;
pub use equation_of_state::{validate_composition, Components, Fugacity};
pub use errors::{GibbsError, GibbsResult};
pub use phase_equilibria::{is_stable, stability_test, stability_test_with, StabilityResult};

/// Level of detail in the iteration output.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verbosity {
    /// Do not print output.
    None,
    /// Print information about the success of failure of the iteration.
    Result,
    /// Print a detailed output for every iteration.
    Iter,
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::None
    }
}

impl From<bool> for Verbosity {
    fn from(monitor: bool) -> Self {
        if monitor {
            Self::Iter
        } else {
            Self::None
        }
    }
}

/// Options for the stability analysis and other solvers.
///
/// If the values are [None], solver specific default
/// values are used.
#[derive(Copy, Clone, Debug, Default)]
pub struct SolverOptions {
    /// Maximum number of iterations.
    pub max_iter: Option<usize>,
    /// Tolerance.
    pub tol: Option<f64>,
    /// Seed of the random number generator. Drawn from the operating system if [None].
    pub seed: Option<u64>,
    /// Iteration output indicated by the [Verbosity] enum.
    pub verbosity: Verbosity,
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn unwrap_or(self, max_iter: usize, tol: f64) -> (usize, f64, Verbosity) {
        (
            self.max_iter.unwrap_or(max_iter),
            self.tol.unwrap_or(tol),
            self.verbosity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_options_defaults() {
        let options = SolverOptions::new().seed(3).verbosity(Verbosity::Result);
        assert_eq!(options.unwrap_or(100, 1e-6), (100, 1e-6, Verbosity::Result));
        assert_eq!(options.seed, Some(3));

        let options = SolverOptions::new().max_iter(10);
        assert_eq!(options.unwrap_or(100, 1e-6), (10, 1e-6, Verbosity::None));
    }

    #[test]
    fn monitor_flag() {
        assert_eq!(Verbosity::from(true), Verbosity::Iter);
        assert_eq!(Verbosity::from(false), Verbosity::None);
        assert!(Verbosity::Iter > Verbosity::Result);
    }
}
