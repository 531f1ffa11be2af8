//! Phase stability analysis of multicomponent mixtures with the
//! Peng-Robinson equation of state.
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

pub mod cubic;

pub use gibbs_core::optimization;
pub use gibbs_core::{
    is_stable, stability_test, stability_test_with, validate_composition, Components, Fugacity,
    GibbsError, GibbsResult, SolverOptions, StabilityResult, Verbosity,
};
