use approx::assert_relative_eq;
use gibbs::cubic::{Alpha, CubicParameters, CubicRecord, PengRobinson, PengRobinson1976};
use gibbs::{Fugacity, GibbsError};
use ndarray::{arr1, Array1, Array2};
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

const PRESSURE: f64 = 3.447e6;
const TEMPERATURE: f64 = 410.928;

fn records(names: &[&str]) -> Result<Vec<CubicRecord>, Box<dyn Error>> {
    let file = std::fs::read_to_string("tests/test_parameters.json")?;
    let mut records: HashMap<String, CubicRecord> = serde_json::from_str(&file)?;
    names
        .iter()
        .map(|&name| {
            records
                .remove(name)
                .ok_or_else(|| format!("no parameters for {name}").into())
        })
        .collect()
}

fn methane_butane_decane(z: Array1<f64>) -> Result<PengRobinson, Box<dyn Error>> {
    let records = records(&["methane", "n-butane", "n-decane"])?;
    let parameters = CubicParameters::from_records(&records, z, None)?;
    Ok(PengRobinson::new(Arc::new(parameters)))
}

#[test]
fn test_roots_liquid_like_trial() -> Result<(), Box<dyn Error>> {
    let eos = methane_butane_decane(arr1(&[0.5, 0.42, 0.08]))?;
    let x = arr1(&[0.0237, 0.46695, 0.50935]);
    let roots = eos.compressibility_factor_roots(PRESSURE, TEMPERATURE, &x)?;
    assert!(roots.len() == 1 || roots.len() == 3);
    assert!(roots.iter().any(|&z| z > 0.0 && z < 1.0));
    Ok(())
}

#[test]
fn test_roots_vapor_like_trial() -> Result<(), Box<dyn Error>> {
    let eos = methane_butane_decane(arr1(&[0.5, 0.42, 0.08]))?;
    let x = arr1(&[0.58262, 0.41186, 0.00553]);
    let roots = eos.compressibility_factor_roots(PRESSURE, TEMPERATURE, &x)?;
    assert!(roots.len() == 1 || roots.len() == 3);
    assert!(roots.windows(2).into_iter().all(|w| w[0] <= w[1]));
    let b = eos.mixture_covolume(PRESSURE, TEMPERATURE, &x)?;
    let z = eos.compressibility_factor(PRESSURE, TEMPERATURE, &x)?;
    assert!(z > b);
    Ok(())
}

#[test]
fn test_fugacity_is_deterministic() -> Result<(), Box<dyn Error>> {
    let z = arr1(&[0.5, 0.42, 0.08]);
    let eos = methane_butane_decane(z.clone())?;
    let f1 = eos.fugacity(PRESSURE, TEMPERATURE, &z)?;
    let f2 = eos.fugacity(PRESSURE, TEMPERATURE, &z)?;
    assert_eq!(f1, f2);
    assert_relative_eq!(f1[0], 1899833.374, max_relative = 1e-6);

    let ln_f = eos.ln_fugacity(PRESSURE, TEMPERATURE, &z)?;
    assert_relative_eq!(ln_f.mapv(f64::exp), f1, max_relative = 1e-12);
    Ok(())
}

#[test]
fn test_ideal_gas_limit() -> Result<(), Box<dyn Error>> {
    let z = arr1(&[0.5, 0.42, 0.08]);
    let eos = methane_butane_decane(z.clone())?;
    let ln_phi = eos.ln_phi(1.0, 1000.0, &z)?;
    assert_relative_eq!(ln_phi, Array1::<f64>::zeros(3), epsilon = 1e-5);
    let z_ig = eos.compressibility_factor(1.0, 1000.0, &z)?;
    assert_relative_eq!(z_ig, 1.0, epsilon = 1e-5);
    Ok(())
}

#[test]
fn test_alpha_functions() -> Result<(), Box<dyn Error>> {
    let records = [CubicRecord::new(617.666667, 2.096e6, 0.49)];
    let parameters = Arc::new(CubicParameters::from_records(&records, arr1(&[1.0]), None)?);
    let pr78 = PengRobinson::new(parameters.clone());
    let pr76 = PengRobinson::with_alpha(parameters, Alpha::from(PengRobinson1976));
    assert_eq!(pr78.alpha_shape_factor(), pr76.alpha_shape_factor());
    assert_relative_eq!(pr78.alpha_shape_factor()[0], 1.065539608, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_invalid_parameters() -> Result<(), Box<dyn Error>> {
    let records = records(&["methane", "n-butane"])?;
    let result = CubicParameters::from_records(&records, arr1(&[0.5, 0.42, 0.08]), None);
    assert!(matches!(result, Err(GibbsError::DimensionMismatch(_))));
    let result = CubicParameters::from_records(&records, arr1(&[0.5, 0.4]), None);
    assert!(matches!(result, Err(GibbsError::InvalidComposition(_))));
    let result = CubicParameters::from_records(
        &records,
        arr1(&[0.5, 0.5]),
        Some(Array2::from_elem((2, 2), -0.01)),
    );
    assert!(matches!(
        result,
        Err(GibbsError::InvalidPhysicalProperty(_, _))
    ));
    Ok(())
}
