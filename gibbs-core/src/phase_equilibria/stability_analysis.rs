use crate::equation_of_state::validate_composition;
use crate::optimization::{DifferentialEvolutionSettings, Minimizer, OptimizationMethod};
use crate::{Fugacity, GibbsResult, SolverOptions};
use ndarray::{Array1, Zip};
use std::fmt;

const POPULATION_SIZE: usize = 25;
const RECOMBINATION: f64 = 0.9;
const MUTATION: (f64, f64) = (0.5, 1.0);
const MAX_ITER: usize = 1000;
const TOL: f64 = 1e-2;
const FEASIBILITY_TOL: f64 = 1e-2;
const PENALTY_PARAMETER: f64 = 10.0;
const CLOSE_RTOL: f64 = 1e-5;
const CLOSE_ATOL: f64 = 1e-8;

/// Result of a stability test.
#[derive(Clone, Debug)]
pub struct StabilityResult {
    /// Whether the feed splits into (at least) two phases.
    pub phase_split: bool,
    /// Composition at the minimum of the tangent plane distance.
    pub x: Array1<f64>,
    /// Reduced tangent plane distance at `x`.
    pub reduced_tpd: f64,
    /// Whether the minimizer met its convergence criterion. If not, `x`
    /// is the best point found within the iteration budget.
    pub converged: bool,
    /// Number of iterations of the minimizer.
    pub iterations: usize,
}

impl fmt::Display for StabilityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StabilityResult(phase_split={}, x={}, reduced_tpd={}, converged={})",
            self.phase_split, self.x, self.reduced_tpd, self.converged
        )
    }
}

/// The tangent plane of the Gibbs energy at the feed composition.
struct TangentPlane<'a, E> {
    eos: &'a E,
    pressure: f64,
    temperature: f64,
    /// ln z_i + ln phi_i(z)
    d: Array1<f64>,
}

/// Determine if the feed is stable, i.e. if a phase split should occur or not.
pub fn is_stable<E: Fugacity + Sync>(
    eos: &E,
    pressure: f64,
    temperature: f64,
    feed: &Array1<f64>,
    options: SolverOptions,
) -> GibbsResult<bool> {
    Ok(!stability_test(eos, pressure, temperature, feed, options)?.phase_split)
}

/// Perform a stability test of the feed at given pressure (in Pa) and
/// temperature (in K) by globally minimizing the reduced tangent plane
/// distance with differential evolution.
///
/// `options.verbosity` controls the output of the minimizer,
/// `options.seed` makes the result reproducible.
pub fn stability_test<E: Fugacity + Sync>(
    eos: &E,
    pressure: f64,
    temperature: f64,
    feed: &Array1<f64>,
    options: SolverOptions,
) -> GibbsResult<StabilityResult> {
    let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER, TOL);
    let mut settings = DifferentialEvolutionSettings::new()
        .popsize(POPULATION_SIZE)
        .recombination(RECOMBINATION)
        .mutation(MUTATION)
        .tol(tol)
        .max_iter(max_iter)
        .polish(false)
        .disp(verbosity);
    if let Some(seed) = options.seed {
        settings = settings.seed(seed);
    }
    let result = stability_test_with(eos, pressure, temperature, feed, &settings.into())?;
    let verdict = if result.phase_split {
        "Phase split"
    } else {
        "Stable"
    };
    log_result!(
        verbosity,
        "Stability test: {} (reduced tpd = {:.8e}, converged: {}) in {} iteration(s)\n",
        verdict,
        result.reduced_tpd,
        result.converged,
        result.iterations
    );
    Ok(result)
}

/// Perform a stability test using the given minimizer.
pub fn stability_test_with<E: Fugacity + Sync>(
    eos: &E,
    pressure: f64,
    temperature: f64,
    feed: &Array1<f64>,
    method: &OptimizationMethod,
) -> GibbsResult<StabilityResult> {
    eos.validate_components(feed)?;
    validate_composition(feed)?;
    let ln_phi = eos.ln_phi(pressure, temperature, feed)?;
    let tangent_plane = TangentPlane {
        eos,
        pressure,
        temperature,
        d: feed.mapv(f64::ln) + ln_phi,
    };

    // components absent from the feed are kept absent in the trial phase
    let bounds: Vec<_> = feed
        .iter()
        .map(|&z| if z > 0.0 { (0.0, 1.0) } else { (0.0, 0.0) })
        .collect();
    let outcome = method.minimize(reduced_tpd::<E>, &bounds, &tangent_plane)?;

    let x = &outcome.x / outcome.x.sum();
    let phase_split = is_phase_split(&x, feed, outcome.fun);
    Ok(StabilityResult {
        phase_split,
        x,
        reduced_tpd: outcome.fun,
        converged: outcome.converged,
        iterations: outcome.iterations,
    })
}

/// Reduced tangent plane distance of the (not necessarily normalized) trial
/// composition, penalized if the trial is too far from the simplex.
fn reduced_tpd<E: Fugacity>(x: &Array1<f64>, tangent_plane: &TangentPlane<E>) -> f64 {
    let sum = x.sum();
    let penalty = if (sum - 1.0).abs() > FEASIBILITY_TOL {
        PENALTY_PARAMETER * (sum - 1.0).powi(2)
    } else {
        0.0
    };
    if sum <= 0.0 {
        return penalty;
    }
    let x = x / sum;
    let TangentPlane {
        eos,
        pressure,
        temperature,
        d,
    } = tangent_plane;
    match eos.ln_phi(*pressure, *temperature, &x) {
        Ok(ln_phi) => {
            let tpd = Zip::from(&x)
                .and(&ln_phi)
                .and(d)
                .fold(0.0, |acc, &x, &ln_phi, &d| {
                    if x > 0.0 {
                        acc + x * (x.ln() + ln_phi - d)
                    } else {
                        acc
                    }
                });
            tpd + penalty
        }
        Err(_) => f64::INFINITY,
    }
}

/// A minimum that coincides with the feed is the trivial solution and never
/// counts as a phase split, even if its tangent plane distance is slightly negative.
fn is_phase_split(x: &Array1<f64>, feed: &Array1<f64>, reduced_tpd: f64) -> bool {
    let trivial = Zip::from(x)
        .and(feed)
        .all(|&x, &z| (x - z).abs() <= CLOSE_ATOL + CLOSE_RTOL * z.abs());
    !trivial && reduced_tpd < 0.0
}
