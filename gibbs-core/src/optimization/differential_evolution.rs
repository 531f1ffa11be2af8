//! Differential evolution: a population based, derivative-free global minimizer.
//!
//! The implementation follows Storn and Price (1997) with Latin hypercube
//! initialization, dithering of the mutation constant and an optional
//! polishing step of the best population member.
use super::{validate_bounds, Minimizer, OptimizationOutcome};
use crate::{GibbsError, GibbsResult, Verbosity};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const POPULATION_SIZE_PER_VARIABLE: usize = 15;
const POPULATION_SIZE_LIMIT: usize = 100;
const MIN_POPULATION: usize = 5;
const POLISH_STEP: f64 = 0.1;
const POLISH_TOL: f64 = 1e-10;
const POLISH_MAX_EVALUATIONS: usize = 10000;

/// Mutation and crossover scheme used to create trial vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Best1Bin,
    Best1Exp,
    Rand1Bin,
    Rand1Exp,
    RandToBest1Bin,
    RandToBest1Exp,
    CurrentToBest1Bin,
    CurrentToBest1Exp,
    Best2Bin,
    Best2Exp,
    Rand2Bin,
    Rand2Exp,
}

#[derive(Clone, Copy)]
enum Base {
    Best1,
    Rand1,
    RandToBest1,
    CurrentToBest1,
    Best2,
    Rand2,
}

#[derive(Clone, Copy)]
enum Crossover {
    Binomial,
    Exponential,
}

impl Strategy {
    const ALL: [Strategy; 12] = [
        Self::Best1Bin,
        Self::Best1Exp,
        Self::Rand1Bin,
        Self::Rand1Exp,
        Self::RandToBest1Bin,
        Self::RandToBest1Exp,
        Self::CurrentToBest1Bin,
        Self::CurrentToBest1Exp,
        Self::Best2Bin,
        Self::Best2Exp,
        Self::Rand2Bin,
        Self::Rand2Exp,
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::Best1Bin => "best1bin",
            Self::Best1Exp => "best1exp",
            Self::Rand1Bin => "rand1bin",
            Self::Rand1Exp => "rand1exp",
            Self::RandToBest1Bin => "randtobest1bin",
            Self::RandToBest1Exp => "randtobest1exp",
            Self::CurrentToBest1Bin => "currenttobest1bin",
            Self::CurrentToBest1Exp => "currenttobest1exp",
            Self::Best2Bin => "best2bin",
            Self::Best2Exp => "best2exp",
            Self::Rand2Bin => "rand2bin",
            Self::Rand2Exp => "rand2exp",
        }
    }

    fn parts(&self) -> (Base, Crossover) {
        use Crossover::*;
        match self {
            Self::Best1Bin => (Base::Best1, Binomial),
            Self::Best1Exp => (Base::Best1, Exponential),
            Self::Rand1Bin => (Base::Rand1, Binomial),
            Self::Rand1Exp => (Base::Rand1, Exponential),
            Self::RandToBest1Bin => (Base::RandToBest1, Binomial),
            Self::RandToBest1Exp => (Base::RandToBest1, Exponential),
            Self::CurrentToBest1Bin => (Base::CurrentToBest1, Binomial),
            Self::CurrentToBest1Exp => (Base::CurrentToBest1, Exponential),
            Self::Best2Bin => (Base::Best2, Binomial),
            Self::Best2Exp => (Base::Best2, Exponential),
            Self::Rand2Bin => (Base::Rand2, Binomial),
            Self::Rand2Exp => (Base::Rand2, Exponential),
        }
    }

    fn samples(&self) -> usize {
        self.parts().0.samples()
    }
}

impl Base {
    /// Number of population members (besides the candidate) drawn per trial.
    fn samples(&self) -> usize {
        match self {
            Self::Best1 | Self::CurrentToBest1 => 2,
            Self::Rand1 | Self::RandToBest1 => 3,
            Self::Best2 => 4,
            Self::Rand2 => 5,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Strategy {
    type Err = GibbsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| GibbsError::InvalidSettings(format!("unknown strategy '{}'.", s)))
    }
}

/// The mutation constant (differential weight).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Fixed differential weight in [0, 2].
    Constant(f64),
    /// Differential weight drawn uniformly from `[min, max)` in every generation.
    Dither(f64, f64),
}

impl From<f64> for Mutation {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl From<(f64, f64)> for Mutation {
    fn from(value: (f64, f64)) -> Self {
        Self::Dither(value.0, value.1)
    }
}

impl Mutation {
    fn validate(&self) -> GibbsResult<()> {
        let valid = |f: f64| (0.0..=2.0).contains(&f);
        let ok = match *self {
            Self::Constant(f) => valid(f),
            Self::Dither(min, max) => valid(min) && valid(max) && min <= max,
        };
        if ok {
            Ok(())
        } else {
            Err(GibbsError::InvalidSettings(format!(
                "mutation constant {:?} has to be in [0, 2].",
                self
            )))
        }
    }

    fn scale<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Constant(f) => f,
            Self::Dither(min, max) => min + rng.gen::<f64>() * (max - min),
        }
    }
}

/// When trial vectors replace population members.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Updating {
    /// Replace members as soon as a better trial is found.
    #[default]
    Immediate,
    /// Evaluate a complete generation before updating the population.
    /// Always used for parallel evaluation.
    Deferred,
}

/// Settings of the differential evolution solver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DifferentialEvolutionSettings {
    /// Mutation and crossover scheme.
    pub strategy: Strategy,
    /// Crossover probability in [0, 1].
    pub recombination: f64,
    /// Differential weight.
    pub mutation: Mutation,
    /// Relative tolerance on the spread of the population energies.
    pub tol: f64,
    /// Absolute tolerance on the spread of the population energies.
    pub atol: f64,
    /// Maximum number of generations.
    pub max_iter: usize,
    /// Seed of the random number generator. Drawn from the operating system if [None].
    pub seed: Option<u64>,
    /// Number of threads evaluating the population, -1 uses all available cores.
    pub workers: i32,
    /// Iteration output.
    pub disp: Verbosity,
    /// Refine the best member with a local search after the global search.
    pub polish: bool,
    /// Population size per decision variable. If [None],
    /// `min(15 * n, 100)` is used for `n` decision variables.
    pub popsize: Option<usize>,
    /// Update scheme of the population.
    pub updating: Updating,
}

impl Default for DifferentialEvolutionSettings {
    fn default() -> Self {
        Self {
            strategy: Strategy::Best1Bin,
            recombination: 0.3,
            mutation: Mutation::Constant(0.6),
            tol: 1e-5,
            atol: 0.0,
            max_iter: 1000,
            seed: None,
            workers: 1,
            disp: Verbosity::None,
            polish: true,
            popsize: None,
            updating: Updating::Immediate,
        }
    }
}

impl DifferentialEvolutionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn recombination(mut self, recombination: f64) -> Self {
        self.recombination = recombination;
        self
    }

    pub fn mutation<M: Into<Mutation>>(mut self, mutation: M) -> Self {
        self.mutation = mutation.into();
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn workers(mut self, workers: i32) -> Self {
        self.workers = workers;
        self
    }

    pub fn disp<V: Into<Verbosity>>(mut self, disp: V) -> Self {
        self.disp = disp.into();
        self
    }

    pub fn polish(mut self, polish: bool) -> Self {
        self.polish = polish;
        self
    }

    pub fn popsize(mut self, popsize: usize) -> Self {
        self.popsize = Some(popsize);
        self
    }

    pub fn updating(mut self, updating: Updating) -> Self {
        self.updating = updating;
        self
    }

    /// Population size per decision variable for a problem with `n` decision variables.
    pub fn population_size(&self, n: usize) -> usize {
        self.popsize
            .unwrap_or_else(|| (POPULATION_SIZE_PER_VARIABLE * n).min(POPULATION_SIZE_LIMIT))
    }

    /// Total number of population members for a problem with `n` decision variables.
    fn total_population(&self, n: usize) -> usize {
        (self.population_size(n) * n)
            .max(MIN_POPULATION)
            .max(self.strategy.samples() + 1)
    }

    fn validate(&self) -> GibbsResult<()> {
        if !(0.0..=1.0).contains(&self.recombination) {
            return Err(GibbsError::InvalidSettings(format!(
                "recombination {} has to be in [0, 1].",
                self.recombination
            )));
        }
        self.mutation.validate()?;
        if !(self.tol >= 0.0 && self.atol >= 0.0) {
            return Err(GibbsError::InvalidSettings(format!(
                "tolerances have to be non-negative, got tol = {} and atol = {}.",
                self.tol, self.atol
            )));
        }
        if self.workers == 0 || self.workers < -1 {
            return Err(GibbsError::InvalidSettings(format!(
                "workers has to be positive or -1, got {}.",
                self.workers
            )));
        }
        Ok(())
    }

    fn effective_updating(&self) -> Updating {
        if self.workers == 1 {
            self.updating
        } else {
            Updating::Deferred
        }
    }
}

/// Differential evolution solver.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DifferentialEvolution {
    pub settings: DifferentialEvolutionSettings,
}

impl DifferentialEvolution {
    pub fn new(settings: DifferentialEvolutionSettings) -> Self {
        Self { settings }
    }
}

impl Minimizer for DifferentialEvolution {
    fn minimize<A: Sync, F: Fn(&Array1<f64>, &A) -> f64 + Sync>(
        &self,
        objective: F,
        bounds: &[(f64, f64)],
        args: &A,
    ) -> GibbsResult<OptimizationOutcome> {
        validate_bounds(bounds)?;
        let s = &self.settings;
        s.validate()?;

        let n = bounds.len();
        let np = s.total_population(n);
        let updating = s.effective_updating();
        let (base, crossover) = s.strategy.parts();

        // every random number is drawn on this thread; the workers
        // only evaluate the objective function
        let mut rng = match s.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let evaluator = Evaluator::new(s.workers, s.disp)?;
        let energy = |unit: ArrayView1<f64>| {
            let e = objective(&scale(unit, bounds), args);
            if e.is_nan() {
                f64::INFINITY
            } else {
                e
            }
        };

        let mut population = latin_hypercube(np, n, &mut rng);
        let mut energies = evaluator.evaluate(&population, &energy);
        let mut nfev = np;
        let mut best = argmin(&energies);

        log_iter!(s.disp, " iter |    f(best)     |   convergence");
        log_iter!(s.disp, "{:-<46}", "");

        let mut converged = false;
        let mut nit = 0;
        for generation in 1..=s.max_iter {
            nit = generation;
            let f = s.mutation.scale(&mut rng);
            match updating {
                Updating::Immediate => {
                    for candidate in 0..np {
                        let trial = trial_vector(
                            base,
                            crossover,
                            candidate,
                            best,
                            &population,
                            f,
                            s.recombination,
                            &mut rng,
                        );
                        let e = energy(trial.view());
                        nfev += 1;
                        if e <= energies[candidate] {
                            population.row_mut(candidate).assign(&trial);
                            energies[candidate] = e;
                            if e <= energies[best] {
                                best = candidate;
                            }
                        }
                    }
                }
                Updating::Deferred => {
                    let mut trials = Array2::zeros((np, n));
                    for candidate in 0..np {
                        let trial = trial_vector(
                            base,
                            crossover,
                            candidate,
                            best,
                            &population,
                            f,
                            s.recombination,
                            &mut rng,
                        );
                        trials.row_mut(candidate).assign(&trial);
                    }
                    let trial_energies = evaluator.evaluate(&trials, &energy);
                    nfev += np;
                    for candidate in 0..np {
                        if trial_energies[candidate] <= energies[candidate] {
                            population
                                .row_mut(candidate)
                                .assign(&trials.row(candidate));
                            energies[candidate] = trial_energies[candidate];
                        }
                    }
                    best = argmin(&energies);
                }
            }

            let (spread, mean) = spread(&energies);
            log_iter!(
                s.disp,
                " {:4} | {:14.8e} | {:14.8e}",
                generation,
                energies[best],
                spread / (mean.abs() + f64::EPSILON)
            );
            if spread <= s.atol + s.tol * mean.abs() {
                converged = true;
                break;
            }
        }

        let mut x = scale(population.row(best), bounds);
        let mut fun = energies[best];
        if s.polish {
            let (x_polished, fun_polished, evaluations) =
                polish(&x, fun, bounds, &objective, args);
            nfev += evaluations;
            if fun_polished < fun {
                x = x_polished;
                fun = fun_polished;
            }
        }

        let message = if converged {
            "Optimization terminated successfully.".to_string()
        } else {
            "Maximum number of iterations has been exceeded.".to_string()
        };
        log_result!(
            s.disp,
            "differential evolution ({}): {} after {} generation(s) and {} function evaluations, f(x) = {}",
            s.strategy,
            message,
            nit,
            nfev,
            fun
        );
        Ok(OptimizationOutcome {
            x,
            fun,
            converged,
            iterations: nit,
            function_evaluations: nfev,
            message,
        })
    }
}

/// Map a point from the unit box onto the search space.
fn scale(unit: ArrayView1<f64>, bounds: &[(f64, f64)]) -> Array1<f64> {
    Array1::from_shape_fn(unit.len(), |j| {
        let (low, high) = bounds[j];
        low + unit[j] * (high - low)
    })
}

/// Stratified initial population in the unit box.
fn latin_hypercube<R: Rng>(np: usize, n: usize, rng: &mut R) -> Array2<f64> {
    let mut population = Array2::zeros((np, n));
    let mut segments: Vec<usize> = (0..np).collect();
    for mut column in population.columns_mut() {
        segments.shuffle(rng);
        for (value, &k) in column.iter_mut().zip(segments.iter()) {
            *value = (k as f64 + rng.gen::<f64>()) / np as f64;
        }
    }
    population
}

fn trial_vector<R: Rng>(
    base: Base,
    crossover: Crossover,
    candidate: usize,
    best: usize,
    population: &Array2<f64>,
    f: f64,
    recombination: f64,
    rng: &mut R,
) -> Array1<f64> {
    let np = population.nrows();
    let n = population.ncols();
    // distinct members, all different from the candidate
    let p: Vec<_> = sample(rng, np - 1, base.samples())
        .into_iter()
        .map(move |i| population.row(if i >= candidate { i + 1 } else { i }))
        .collect();
    let b = population.row(best);
    let c = population.row(candidate);

    let mutant = match base {
        Base::Best1 => &b + &((&p[0] - &p[1]) * f),
        Base::Rand1 => &p[0] + &((&p[1] - &p[2]) * f),
        Base::RandToBest1 => &p[0] + &((&b - &p[0]) * f) + (&p[1] - &p[2]) * f,
        Base::CurrentToBest1 => &c + &((&b - &c + &p[0] - &p[1]) * f),
        Base::Best2 => &b + &((&p[0] + &p[1] - &p[2] - &p[3]) * f),
        Base::Rand2 => &p[0] + &((&p[1] + &p[2] - &p[3] - &p[4]) * f),
    };

    let mut trial = c.to_owned();
    let fill_point = rng.gen_range(0..n);
    match crossover {
        Crossover::Binomial => {
            for j in 0..n {
                if j == fill_point || rng.gen::<f64>() < recombination {
                    trial[j] = mutant[j];
                }
            }
        }
        Crossover::Exponential => {
            let mut j = fill_point;
            for _ in 0..n {
                trial[j] = mutant[j];
                j = (j + 1) % n;
                if rng.gen::<f64>() >= recombination {
                    break;
                }
            }
        }
    }

    // resample coordinates that left the unit box
    trial.mapv_inplace(|u| {
        if (0.0..=1.0).contains(&u) {
            u
        } else {
            rng.gen::<f64>()
        }
    });
    trial
}

fn argmin(energies: &Array1<f64>) -> usize {
    energies
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(i_min, e_min), (i, &e)| {
            if e < e_min {
                (i, e)
            } else {
                (i_min, e_min)
            }
        })
        .0
}

/// Standard deviation and mean of the population energies.
fn spread(energies: &Array1<f64>) -> (f64, f64) {
    if energies.iter().any(|e| !e.is_finite()) {
        return (f64::INFINITY, f64::INFINITY);
    }
    let mean = energies.mean().unwrap_or(0.0);
    (energies.std(0.0), mean)
}

/// Bounded compass search around the best member.
fn polish<A, F: Fn(&Array1<f64>, &A) -> f64>(
    x0: &Array1<f64>,
    f0: f64,
    bounds: &[(f64, f64)],
    objective: &F,
    args: &A,
) -> (Array1<f64>, f64, usize) {
    let mut x = x0.clone();
    let mut fx = f0;
    let mut step = POLISH_STEP;
    let mut nfev = 0;
    while step > POLISH_TOL && nfev < POLISH_MAX_EVALUATIONS {
        let mut improved = false;
        for (j, &(low, high)) in bounds.iter().enumerate() {
            let width = high - low;
            if width <= 0.0 {
                continue;
            }
            for direction in [1.0, -1.0] {
                let value = (x[j] + direction * step * width).clamp(low, high);
                if value == x[j] {
                    continue;
                }
                let mut trial = x.clone();
                trial[j] = value;
                let e = objective(&trial, args);
                nfev += 1;
                if e < fx {
                    x = trial;
                    fx = e;
                    improved = true;
                    break;
                }
            }
        }
        if !improved {
            step *= 0.5;
        }
    }
    (x, fx, nfev)
}

/// Evaluates the objective function for all members of a population,
/// in parallel if more than one worker is requested.
struct Evaluator {
    #[cfg(feature = "rayon")]
    pool: Option<rayon::ThreadPool>,
}

impl Evaluator {
    #[cfg(feature = "rayon")]
    fn new(workers: i32, _disp: Verbosity) -> GibbsResult<Self> {
        let pool = if workers == 1 {
            None
        } else {
            // zero threads lets rayon use all available cores
            let threads = if workers < 0 { 0 } else { workers as usize };
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?,
            )
        };
        Ok(Self { pool })
    }

    #[cfg(not(feature = "rayon"))]
    fn new(workers: i32, disp: Verbosity) -> GibbsResult<Self> {
        if workers != 1 {
            log_result!(
                disp,
                "differential evolution: parallel evaluation requires the `rayon` feature, evaluating {} worker(s) sequentially.",
                workers
            );
        }
        Ok(Self {})
    }

    fn evaluate<E: Fn(ArrayView1<f64>) -> f64 + Sync>(
        &self,
        population: &Array2<f64>,
        energy: &E,
    ) -> Array1<f64> {
        #[cfg(feature = "rayon")]
        if let Some(pool) = &self.pool {
            use rayon::prelude::*;
            let energies: Vec<f64> = pool.install(|| {
                (0..population.nrows())
                    .into_par_iter()
                    .map(|i| energy(population.row(i)))
                    .collect()
            });
            return Array1::from_vec(energies);
        }
        population.rows().into_iter().map(energy).collect()
    }
}
