//! Classical van der Waals one-fluid mixing rules.
use ndarray::{Array1, Array2};

/// `A_ij = (1 - k_ij) sqrt(A_i A_j)`
pub(super) fn cross_attraction(attraction: &Array1<f64>, k_ij: &Array2<f64>) -> Array2<f64> {
    let n = attraction.len();
    Array2::from_shape_fn((n, n), |(i, j)| {
        (1.0 - k_ij[(i, j)]) * (attraction[i] * attraction[j]).sqrt()
    })
}

/// `x^T A x`
pub(super) fn quadratic(molefracs: &Array1<f64>, cross_attraction: &Array2<f64>) -> f64 {
    molefracs.dot(&cross_attraction.dot(molefracs))
}

/// `x^T B`
pub(super) fn linear(molefracs: &Array1<f64>, covolume: &Array1<f64>) -> f64 {
    molefracs.dot(covolume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    #[test]
    fn pure_component_limit() {
        let a = arr1(&[0.4, 0.9]);
        let a_ij = cross_attraction(&a, &Array2::zeros((2, 2)));
        assert_relative_eq!(quadratic(&arr1(&[1.0, 0.0]), &a_ij), 0.4);
        assert_relative_eq!(quadratic(&arr1(&[0.0, 1.0]), &a_ij), 0.9);
        assert_relative_eq!(linear(&arr1(&[0.25, 0.75]), &arr1(&[0.1, 0.2])), 0.175);
    }

    #[test]
    fn binary_interaction() {
        let a = arr1(&[0.4, 0.9]);
        let a_ij = cross_attraction(&a, &arr2(&[[0.0, 0.1], [0.1, 0.0]]));
        assert_relative_eq!(a_ij[(0, 1)], 0.9 * 0.6, epsilon = 1e-15);
        assert_eq!(a_ij[(0, 1)], a_ij[(1, 0)]);
        assert_relative_eq!(a_ij[(1, 1)], 0.9, epsilon = 1e-15);
    }
}
