use thiserror::Error;

/// Error type for improperly defined parameters, states and optimization problems.
#[derive(Error, Debug)]
pub enum GibbsError {
    // errors related to parameter handling
    #[error("Incompatible dimensions: {0}")]
    DimensionMismatch(String),
    #[error("Overall composition must sum to 1, got {0}.")]
    InvalidComposition(f64),
    #[error("Invalid physical property: {0} = {1}.")]
    InvalidPhysicalProperty(String, f64),
    #[error(
        "Equation of state is initialized for {0} components while the input specifies {1} components."
    )]
    IncompatibleComponents(usize, usize),

    // errors related to algorithms
    #[error("`{0}` encountered illegal values during the iteration.")]
    IterationFailed(String),
    #[error("Invalid optimization problem: {0}")]
    InvalidOptimizationProblem(String),
    #[error("Invalid solver setting: {0}")]
    InvalidSettings(String),

    // other errors
    #[cfg(feature = "rayon")]
    #[error(transparent)]
    RayonError(#[from] rayon::ThreadPoolBuildError),
}

/// Convenience type for `Result<T, GibbsError>`.
pub type GibbsResult<T> = Result<T, GibbsError>;
