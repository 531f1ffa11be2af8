use enum_dispatch::enum_dispatch;
use ndarray::{Array1, Zip};
use serde::{Deserialize, Serialize};

/// Temperature dependence of the attractive parameter.
#[enum_dispatch]
pub trait AlphaFunction {
    /// Shape factor `m` of every component.
    fn shape_factor(&self, acentric_factor: &Array1<f64>) -> Array1<f64>;

    /// `alpha = (1 + m (1 - sqrt(Tr)))^2`
    fn alpha(
        &self,
        acentric_factor: &Array1<f64>,
        reduced_temperature: &Array1<f64>,
    ) -> Array1<f64> {
        Zip::from(&self.shape_factor(acentric_factor))
            .and(reduced_temperature)
            .map_collect(|&m, &tr| (1.0 + m * (1.0 - tr.sqrt())).powi(2))
    }
}

/// Shape factor of the 1976 Peng-Robinson equation of state.
///
/// https://doi.org/10.1021/i160057a011
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PengRobinson1976;

impl AlphaFunction for PengRobinson1976 {
    fn shape_factor(&self, acentric_factor: &Array1<f64>) -> Array1<f64> {
        acentric_factor.mapv(|w| 0.37464 + w * (1.54226 - w * 0.26992))
    }
}

/// Shape factor of the 1978 revision of the Peng-Robinson equation
/// of state with a cubic polynomial for heavy components.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PengRobinson1978;

impl AlphaFunction for PengRobinson1978 {
    fn shape_factor(&self, acentric_factor: &Array1<f64>) -> Array1<f64> {
        acentric_factor.mapv(|w| {
            if w > 0.49 {
                0.3796 + w * (1.485 + w * (-0.1644 + w * 0.01667))
            } else {
                0.37464 + w * (1.54226 - w * 0.26992)
            }
        })
    }
}

/// Available alpha functions.
#[enum_dispatch(AlphaFunction)]
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alpha {
    PengRobinson1976,
    PengRobinson1978,
}

impl Default for Alpha {
    fn default() -> Self {
        PengRobinson1978.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn shape_factor_branches() {
        let w = arr1(&[0.49, 0.4902]);
        let m = Alpha::default().shape_factor(&w);
        // 0.49 belongs to the quadratic branch
        assert_relative_eq!(m[0], 1.065539607999, epsilon = 1e-12);
        assert_relative_eq!(m[1], 1.0700059423145296, epsilon = 1e-12);

        let m76 = Alpha::from(PengRobinson1976).shape_factor(&w);
        assert_eq!(m76[0], m[0]);
        assert!(m76[1] < m[1]);
    }

    #[test]
    fn alpha_at_critical_temperature() {
        let w = arr1(&[0.0115, 0.1928, 0.4902]);
        let alpha = Alpha::default().alpha(&w, &arr1(&[1.0, 1.0, 1.0]));
        assert_eq!(alpha, arr1(&[1.0, 1.0, 1.0]));
        let alpha = Alpha::default().alpha(&w, &arr1(&[0.8, 0.8, 0.8]));
        assert!(alpha.iter().all(|&a| a > 1.0));
    }

    #[test]
    fn serialize() -> Result<(), serde_json::Error> {
        let alpha: Alpha = serde_json::from_str(r#"{"PengRobinson1976":null}"#)?;
        assert_eq!(alpha, PengRobinson1976.into());
        Ok(())
    }
}
