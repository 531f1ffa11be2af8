use crate::{GibbsError, GibbsResult};
use ndarray::{Array1, Zip};

/// Number of components of a model.
pub trait Components {
    /// Return the number of components of the model.
    fn components(&self) -> usize;

    /// Check that a composition vector has one entry per component.
    fn validate_components(&self, molefracs: &Array1<f64>) -> GibbsResult<()> {
        if molefracs.len() != self.components() {
            return Err(GibbsError::IncompatibleComponents(
                self.components(),
                molefracs.len(),
            ));
        }
        Ok(())
    }
}

/// Fugacities of the components of a mixture at given
/// pressure (in Pa), temperature (in K) and composition.
///
/// Implementations have to be pure functions of their arguments,
/// because the stability analysis evaluates them from multiple
/// threads and compares trial phases against a reference phase.
pub trait Fugacity: Components {
    /// Logarithm of the fugacity coefficients.
    fn ln_phi(
        &self,
        pressure: f64,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> GibbsResult<Array1<f64>>;

    /// Logarithm of the fugacities (in Pa).
    ///
    /// Components that are not present yield `-inf`.
    fn ln_fugacity(
        &self,
        pressure: f64,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> GibbsResult<Array1<f64>> {
        let ln_phi = self.ln_phi(pressure, temperature, molefracs)?;
        let ln_p = pressure.ln();
        Ok(Zip::from(molefracs)
            .and(&ln_phi)
            .map_collect(|&x, &ln_phi| x.ln() + ln_phi + ln_p))
    }

    /// Fugacities (in Pa).
    fn fugacity(
        &self,
        pressure: f64,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> GibbsResult<Array1<f64>> {
        Ok(self
            .ln_fugacity(pressure, temperature, molefracs)?
            .mapv(f64::exp))
    }
}

const COMPOSITION_TOL: f64 = 1e-5;

/// Check that a composition vector is non-negative and sums to one.
pub fn validate_composition(molefracs: &Array1<f64>) -> GibbsResult<()> {
    let sum = molefracs.sum();
    if (sum - 1.0).abs() > COMPOSITION_TOL {
        return Err(GibbsError::InvalidComposition(sum));
    }
    if let Some(&x) = molefracs.iter().find(|&&x| x.is_nan() || x < 0.0) {
        return Err(GibbsError::InvalidPhysicalProperty(
            String::from("mole fraction"),
            x,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn composition() {
        assert!(validate_composition(&arr1(&[0.5, 0.42, 0.08])).is_ok());
        assert!(validate_composition(&arr1(&[0.5, 0.5000001])).is_ok());
        assert!(matches!(
            validate_composition(&arr1(&[0.5, 0.6])),
            Err(GibbsError::InvalidComposition(_))
        ));
        assert!(matches!(
            validate_composition(&arr1(&[1.2, -0.2])),
            Err(GibbsError::InvalidPhysicalProperty(_, _))
        ));
    }
}
