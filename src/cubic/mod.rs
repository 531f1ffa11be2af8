//! Peng-Robinson equation of state for multicomponent mixtures.
use gibbs_core::{Components, Fugacity, GibbsError, GibbsResult};
use nalgebra::Matrix3;
use ndarray::{Array1, Array2, Zip};
use std::f64::consts::SQRT_2;
use std::fmt;
use std::sync::Arc;

mod alpha;
mod mixing_rules;
mod parameters;
pub use alpha::{Alpha, AlphaFunction, PengRobinson1976, PengRobinson1978};
pub use parameters::{CubicParameters, CubicRecord};

/// Universal gas constant in J/(mol K)
pub const RGAS: f64 = 8.3144598;
const OMEGA_A: f64 = 0.45724;
const OMEGA_B: f64 = 0.07780;
const CRITICAL_COMPRESSIBILITY: f64 = 0.3074;
/// Complex roots with a smaller imaginary part are treated as real.
const IMAGINARY_TOL: f64 = 1e-5;

/// Constants of the equation of state at the critical point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CriticalConstants {
    /// critical compressibility factor
    pub compressibility_factor: f64,
    /// attraction shape constant
    pub omega_a: f64,
    /// covolume shape constant
    pub omega_b: f64,
}

/// The Peng-Robinson equation of state.
#[derive(Clone, Debug)]
pub struct PengRobinson {
    parameters: Arc<CubicParameters>,
    alpha: Alpha,
}

impl PengRobinson {
    /// Create a new equation of state using the 1978 alpha function.
    pub fn new(parameters: Arc<CubicParameters>) -> Self {
        Self::with_alpha(parameters, Alpha::default())
    }

    /// Create a new equation of state with a specific alpha function.
    pub fn with_alpha(parameters: Arc<CubicParameters>, alpha: Alpha) -> Self {
        Self { parameters, alpha }
    }

    pub fn parameters(&self) -> &Arc<CubicParameters> {
        &self.parameters
    }

    pub fn critical_constants(&self) -> CriticalConstants {
        CriticalConstants {
            compressibility_factor: CRITICAL_COMPRESSIBILITY,
            omega_a: OMEGA_A,
            omega_b: OMEGA_B,
        }
    }

    pub fn reduced_temperature(&self, temperature: f64) -> GibbsResult<Array1<f64>> {
        non_negative("temperature", temperature)?;
        Ok(self.parameters.tc.mapv(|tc| temperature / tc))
    }

    pub fn reduced_pressure(&self, pressure: f64) -> GibbsResult<Array1<f64>> {
        non_negative("pressure", pressure)?;
        Ok(self.parameters.pc.mapv(|pc| pressure / pc))
    }

    /// Shape factor `m` of the alpha function.
    pub fn alpha_shape_factor(&self) -> Array1<f64> {
        self.alpha.shape_factor(&self.parameters.acentric_factor)
    }

    pub fn alpha(&self, temperature: f64) -> GibbsResult<Array1<f64>> {
        let tr = self.reduced_temperature(temperature)?;
        Ok(self.alpha.alpha(&self.parameters.acentric_factor, &tr))
    }

    /// Attractive parameters `a_i` in Pa m^6/mol^2.
    pub fn pure_component_attraction(&self, temperature: f64) -> GibbsResult<Array1<f64>> {
        let p = &self.parameters;
        let alpha = self.alpha(temperature)?;
        Ok(Zip::from(&p.tc)
            .and(&p.pc)
            .and(&alpha)
            .map_collect(|&tc, &pc, &alpha| OMEGA_A * (RGAS * tc).powi(2) / pc * alpha))
    }

    /// Covolumes `b_i` in m^3/mol.
    pub fn pure_component_covolume(&self) -> Array1<f64> {
        let p = &self.parameters;
        Zip::from(&p.tc)
            .and(&p.pc)
            .map_collect(|&tc, &pc| OMEGA_B * RGAS * tc / pc)
    }

    /// `A_i = a_i P / (RT)^2`
    pub fn dimensionless_attraction(
        &self,
        pressure: f64,
        temperature: f64,
    ) -> GibbsResult<Array1<f64>> {
        non_negative("pressure", pressure)?;
        let a = self.pure_component_attraction(temperature)?;
        Ok(a * pressure / (RGAS * temperature).powi(2))
    }

    /// `B_i = b_i P / (RT)`
    pub fn dimensionless_covolume(
        &self,
        pressure: f64,
        temperature: f64,
    ) -> GibbsResult<Array1<f64>> {
        non_negative("pressure", pressure)?;
        non_negative("temperature", temperature)?;
        Ok(self.pure_component_covolume() * pressure / (RGAS * temperature))
    }

    /// `A_ij = (1 - k_ij) sqrt(A_i A_j)`
    pub fn mixture_cross_attraction(
        &self,
        pressure: f64,
        temperature: f64,
    ) -> GibbsResult<Array2<f64>> {
        let a = self.dimensionless_attraction(pressure, temperature)?;
        Ok(mixing_rules::cross_attraction(&a, &self.parameters.k_ij))
    }

    pub fn mixture_attraction(
        &self,
        pressure: f64,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> GibbsResult<f64> {
        self.validate_components(molefracs)?;
        let a_ij = self.mixture_cross_attraction(pressure, temperature)?;
        Ok(mixing_rules::quadratic(molefracs, &a_ij))
    }

    pub fn mixture_covolume(
        &self,
        pressure: f64,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> GibbsResult<f64> {
        self.validate_components(molefracs)?;
        let b = self.dimensionless_covolume(pressure, temperature)?;
        Ok(mixing_rules::linear(molefracs, &b))
    }

    /// All real roots of the cubic in the compressibility factor,
    /// sorted in ascending order.
    pub fn compressibility_factor_roots(
        &self,
        pressure: f64,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> GibbsResult<Array1<f64>> {
        CubicState::new(self, pressure, temperature, molefracs)?.roots()
    }

    /// Compressibility factor of the root with the lowest Gibbs energy.
    pub fn compressibility_factor(
        &self,
        pressure: f64,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> GibbsResult<f64> {
        let (z, _) = CubicState::new(self, pressure, temperature, molefracs)?.stable_root()?;
        Ok(z)
    }
}

impl fmt::Display for PengRobinson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let revision = match self.alpha {
            Alpha::PengRobinson1976(_) => 1976,
            Alpha::PengRobinson1978(_) => 1978,
        };
        write!(f, "Peng Robinson ({revision})")
    }
}

impl Components for PengRobinson {
    fn components(&self) -> usize {
        self.parameters.tc.len()
    }
}

impl Fugacity for PengRobinson {
    fn ln_phi(
        &self,
        pressure: f64,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> GibbsResult<Array1<f64>> {
        let (_, ln_phi) = CubicState::new(self, pressure, temperature, molefracs)?.stable_root()?;
        Ok(ln_phi)
    }
}

fn non_negative(property: &str, value: f64) -> GibbsResult<()> {
    if value.is_nan() || value < 0.0 {
        return Err(GibbsError::InvalidPhysicalProperty(property.into(), value));
    }
    Ok(())
}

fn positive(property: &str, value: f64) -> GibbsResult<()> {
    if value.is_nan() || value <= 0.0 {
        return Err(GibbsError::InvalidPhysicalProperty(property.into(), value));
    }
    Ok(())
}

/// Dimensionless parameters of a mixture at given pressure and temperature.
struct CubicState<'a> {
    molefracs: &'a Array1<f64>,
    b_i: Array1<f64>,
    a_ij: Array2<f64>,
    a: f64,
    b: f64,
}

impl<'a> CubicState<'a> {
    fn new(
        eos: &PengRobinson,
        pressure: f64,
        temperature: f64,
        molefracs: &'a Array1<f64>,
    ) -> GibbsResult<Self> {
        // the fugacity coefficients are singular at zero pressure or temperature
        positive("pressure", pressure)?;
        positive("temperature", temperature)?;
        eos.validate_components(molefracs)?;
        let b_i = eos.dimensionless_covolume(pressure, temperature)?;
        let a_ij = eos.mixture_cross_attraction(pressure, temperature)?;
        let a = mixing_rules::quadratic(molefracs, &a_ij);
        let b = mixing_rules::linear(molefracs, &b_i);
        Ok(Self {
            molefracs,
            b_i,
            a_ij,
            a,
            b,
        })
    }

    fn roots(&self) -> GibbsResult<Array1<f64>> {
        let (a, b) = (self.a, self.b);
        let c1 = -(1.0 - b);
        let c2 = a - 3.0 * b * b - 2.0 * b;
        let c3 = -(a * b - b * b - b * b * b);
        if ![c1, c2, c3].iter().all(|c| c.is_finite()) {
            return Err(GibbsError::IterationFailed(String::from(
                "compressibility factor",
            )));
        }

        // eigenvalues of the companion matrix are the roots of the monic cubic
        let companion = Matrix3::new(-c1, -c2, -c3, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0);
        let mut roots: Vec<f64> = companion
            .complex_eigenvalues()
            .iter()
            .filter(|z| z.im.abs() < IMAGINARY_TOL)
            .map(|z| z.re)
            .collect();
        roots.sort_by(|z1, z2| z1.total_cmp(z2));
        Ok(Array1::from_vec(roots))
    }

    fn ln_phi(&self, z: f64) -> Array1<f64> {
        let (a, b) = (self.a, self.b);
        let ln_z_b = (z - b).ln();
        let log_ratio = ((z + (1.0 + SQRT_2) * b) / (z + (1.0 - SQRT_2) * b)).ln();
        let sum_a = self.a_ij.dot(self.molefracs);
        Zip::from(&self.b_i)
            .and(&sum_a)
            .map_collect(|&b_i, &sum_a| {
                b_i / b * (z - 1.0) - ln_z_b
                    - a / (2.0 * SQRT_2 * b) * (2.0 * sum_a / a - b_i / b) * log_ratio
            })
    }

    /// Among the roots with `Z > B`, the one with the lowest
    /// reduced molar Gibbs energy `sum_i x_i ln(phi_i)`.
    fn stable_root(&self) -> GibbsResult<(f64, Array1<f64>)> {
        self.roots()?
            .iter()
            .filter(|&&z| z > self.b)
            .map(|&z| {
                let ln_phi = self.ln_phi(z);
                let g = self.molefracs.dot(&ln_phi);
                (z, ln_phi, g)
            })
            .filter(|(_, _, g)| g.is_finite())
            .min_by(|(_, _, g1), (_, _, g2)| g1.total_cmp(g2))
            .map(|(z, ln_phi, _)| (z, ln_phi))
            .ok_or_else(|| GibbsError::IterationFailed(String::from("compressibility factor")))
    }
}
