use gibbs_core::{validate_composition, GibbsError, GibbsResult};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cubic parameters for a single substance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct CubicRecord {
    /// critical temperature in Kelvin
    pub tc: f64,
    /// critical pressure in Pascal
    pub pc: f64,
    /// acentric factor
    pub acentric_factor: f64,
}

impl CubicRecord {
    /// Create a new pure substance record for the cubic equation of state.
    pub fn new(tc: f64, pc: f64, acentric_factor: f64) -> Self {
        Self {
            tc,
            pc,
            acentric_factor,
        }
    }
}

impl fmt::Display for CubicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CubicRecord(tc={} K", self.tc)?;
        write!(f, ", pc={} Pa", self.pc)?;
        write!(f, ", acentric factor={})", self.acentric_factor)
    }
}

/// Cubic parameters for one or more substances together with the
/// overall composition of the mixture.
#[derive(Debug, Clone)]
pub struct CubicParameters {
    /// Overall mole fractions
    pub(crate) molefracs: Array1<f64>,
    /// Critical temperature in Kelvin
    pub(crate) tc: Array1<f64>,
    /// Critical pressure in Pascal
    pub(crate) pc: Array1<f64>,
    pub(crate) acentric_factor: Array1<f64>,
    /// Binary interaction parameters
    pub(crate) k_ij: Array2<f64>,
}

impl fmt::Display for CubicParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, record) in self.records().iter().enumerate() {
            writeln!(f, "x={}: {}", self.molefracs[i], record)?;
        }
        write!(f, "\nk_ij:\n{}", self.k_ij)
    }
}

impl CubicParameters {
    /// Create a validated parameter set.
    ///
    /// The checks run in the following order:
    /// consistent number of components, composition summing to one,
    /// non-negative critical properties, square and non-negative binary
    /// interaction parameters.
    pub fn new(
        molefracs: Array1<f64>,
        tc: Array1<f64>,
        pc: Array1<f64>,
        acentric_factor: Array1<f64>,
        k_ij: Array2<f64>,
    ) -> GibbsResult<Self> {
        let n = molefracs.len();
        if [tc.len(), pc.len(), acentric_factor.len(), k_ij.nrows()]
            .iter()
            .any(|&l| l != n)
        {
            return Err(GibbsError::DimensionMismatch(format!(
                "composition has {} components, tc has {}, pc has {}, acentric factor has {} and k_ij has {} rows.",
                n,
                tc.len(),
                pc.len(),
                acentric_factor.len(),
                k_ij.nrows()
            )));
        }
        if n == 0 {
            return Err(GibbsError::DimensionMismatch(String::from(
                "at least one component is required.",
            )));
        }

        validate_composition(&molefracs)?;

        for (name, values) in [("critical temperature", &tc), ("critical pressure", &pc)] {
            if let Some(&v) = values.iter().find(|&&v| v.is_nan() || v < 0.0) {
                return Err(GibbsError::InvalidPhysicalProperty(name.into(), v));
            }
        }

        if k_ij.shape() != [n, n] {
            return Err(GibbsError::DimensionMismatch(format!(
                "k_ij has to be a {n}x{n} matrix, got {:?}.",
                k_ij.shape()
            )));
        }
        if let Some(&k) = k_ij.iter().find(|&&k| k.is_nan() || k < 0.0) {
            return Err(GibbsError::InvalidPhysicalProperty(
                String::from("binary interaction parameter"),
                k,
            ));
        }

        Ok(Self {
            molefracs,
            tc,
            pc,
            acentric_factor,
            k_ij,
        })
    }

    /// Create parameters from pure component records.
    ///
    /// Without binary interaction parameters, `k_ij` is zero.
    pub fn from_records(
        records: &[CubicRecord],
        molefracs: Array1<f64>,
        k_ij: Option<Array2<f64>>,
    ) -> GibbsResult<Self> {
        let n = records.len();
        let tc = records.iter().map(|r| r.tc).collect();
        let pc = records.iter().map(|r| r.pc).collect();
        let acentric_factor = records.iter().map(|r| r.acentric_factor).collect();
        let k_ij = k_ij.unwrap_or_else(|| Array2::zeros([n; 2]));
        Self::new(molefracs, tc, pc, acentric_factor, k_ij)
    }

    pub fn records(&self) -> Vec<CubicRecord> {
        (0..self.tc.len())
            .map(|i| CubicRecord::new(self.tc[i], self.pc[i], self.acentric_factor[i]))
            .collect()
    }

    pub fn molefracs(&self) -> &Array1<f64> {
        &self.molefracs
    }

    pub fn k_ij(&self) -> &Array2<f64> {
        &self.k_ij
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn methane_butane() -> [CubicRecord; 2] {
        [
            CubicRecord::new(190.556, 4.6043189e6, 0.0115),
            CubicRecord::new(425.16667, 3.7969428e6, 0.1928),
        ]
    }

    #[test]
    fn from_json() -> Result<(), serde_json::Error> {
        let records: Vec<CubicRecord> = serde_json::from_str(
            r#"[
                {"tc": 190.556, "pc": 4.6043189e6, "acentric_factor": 0.0115},
                {"tc": 425.16667, "pc": 3.7969428e6, "acentric_factor": 0.1928}
            ]"#,
        )?;
        assert_eq!(records, methane_butane());
        Ok(())
    }

    #[test]
    fn from_records() -> GibbsResult<()> {
        let parameters = CubicParameters::from_records(&methane_butane(), arr1(&[0.3, 0.7]), None)?;
        assert_eq!(parameters.k_ij(), &Array2::<f64>::zeros((2, 2)));
        assert_eq!(parameters.records(), methane_butane());
        assert_eq!(parameters.molefracs(), &arr1(&[0.3, 0.7]));
        Ok(())
    }

    #[test]
    fn validation_order() {
        let k_ij = Array2::zeros((2, 2));
        // dimensions are checked before the composition
        let p = CubicParameters::new(
            arr1(&[0.5, 0.6, 0.1]),
            arr1(&[190.0, 425.0]),
            arr1(&[4.6e6, 3.8e6]),
            arr1(&[0.01, 0.19]),
            k_ij.clone(),
        );
        assert!(matches!(p, Err(GibbsError::DimensionMismatch(_))));

        // composition is checked before critical properties
        let p = CubicParameters::new(
            arr1(&[0.5, 0.6]),
            arr1(&[-190.0, 425.0]),
            arr1(&[4.6e6, 3.8e6]),
            arr1(&[0.01, 0.19]),
            k_ij.clone(),
        );
        assert!(matches!(p, Err(GibbsError::InvalidComposition(_))));

        let p = CubicParameters::new(
            arr1(&[0.5, 0.5]),
            arr1(&[190.0, 425.0]),
            arr1(&[4.6e6, -3.8e6]),
            arr1(&[0.01, 0.19]),
            k_ij,
        );
        assert!(matches!(
            p,
            Err(GibbsError::InvalidPhysicalProperty(_, v)) if v == -3.8e6
        ));
    }

    #[test]
    fn binary_interaction_parameters() {
        let records = methane_butane();
        let z = arr1(&[0.5, 0.5]);
        let p = CubicParameters::from_records(&records, z.clone(), Some(Array2::zeros((2, 3))));
        assert!(matches!(p, Err(GibbsError::DimensionMismatch(_))));
        let p = CubicParameters::from_records(&records, z.clone(), Some(Array2::zeros((3, 3))));
        assert!(matches!(p, Err(GibbsError::DimensionMismatch(_))));
        let p = CubicParameters::from_records(
            &records,
            z.clone(),
            Some(arr2(&[[0.0, -0.1], [-0.1, 0.0]])),
        );
        assert!(matches!(p, Err(GibbsError::InvalidPhysicalProperty(_, _))));
        let p = CubicParameters::from_records(&records, z, Some(arr2(&[[0.0, 0.02], [0.02, 0.0]])));
        assert!(p.is_ok());
    }

    #[test]
    fn composition_tolerance() {
        let records = methane_butane();
        assert!(CubicParameters::from_records(&records, arr1(&[0.5, 0.500005]), None).is_ok());
        assert!(matches!(
            CubicParameters::from_records(&records, arr1(&[0.5, 0.5001]), None),
            Err(GibbsError::InvalidComposition(_))
        ));
    }
}
