//! Haigh principal stress criterion.
//!
//! The largest principal stress over the load history fixes a reference
//! direction. Every load step is projected on that direction and the
//! effective stress is the amplitude plus the mean stress sensitivity times
//! the mean of the projected history.

use nalgebra::Vector3;

use crate::error::{FatigueError, Result};
use crate::stress::{StressHistory, StressTensor};

const TIE_TOLERANCE: f64 = 1e-9;

struct PrincipalState {
    tensor: StressTensor,
    values: Vector3<f64>,
    directions: [Vector3<f64>; 3],
}

impl PrincipalState {
    fn new(tensor: StressTensor) -> Self {
        let eigen = tensor.principal_stresses();
        let directions = [
            eigen.eigenvectors.column(0).into_owned(),
            eigen.eigenvectors.column(1).into_owned(),
            eigen.eigenvectors.column(2).into_owned(),
        ];
        PrincipalState {
            tensor,
            values: eigen.eigenvalues,
            directions,
        }
    }

    fn max_value(&self) -> f64 {
        self.values.max()
    }
}

fn effective_stress(states: &[PrincipalState], n: &Vector3<f64>, s_max: f64, k: f64) -> f64 {
    let s_min = states
        .iter()
        .map(|s| s.tensor.normal_stress(n))
        .fold(f64::INFINITY, f64::min);
    (s_max - s_min) / 2.0 + k * (s_max + s_min) / 2.0
}

/// Haigh effective stress of one point history.
///
/// When the largest principal stress is reached at several load steps, or is
/// a repeated eigenvalue, the reference direction is not unique. Every
/// principal direction of the history that carries the largest principal
/// stress at one of those load steps is then tried and the largest effective
/// stress is kept. A history with a NaN component gives NaN.
fn haigh_point<'a>(history: impl Iterator<Item = &'a nalgebra::Vector6<f64>>, k: f64) -> f64 {
    let history: Vec<&nalgebra::Vector6<f64>> = history.collect();
    if history.iter().any(|s| s.iter().any(|c| c.is_nan())) {
        return f64::NAN;
    }
    let states: Vec<PrincipalState> = history
        .into_iter()
        .map(|s| PrincipalState::new(StressTensor::from_voigt(*s)))
        .collect();
    let s_max = states
        .iter()
        .map(|s| s.max_value())
        .fold(f64::NEG_INFINITY, f64::max);
    if !s_max.is_finite() {
        return f64::NAN;
    }
    let scale = states
        .iter()
        .map(|s| s.values.amax())
        .fold(0.0, f64::max);
    let tolerance = TIE_TOLERANCE * scale;

    let mut result = f64::NEG_INFINITY;
    for peak in states.iter().filter(|s| s.max_value() >= s_max - tolerance) {
        for state in states.iter() {
            for n in state.directions.iter() {
                if peak.tensor.normal_stress(n) < s_max - tolerance {
                    continue;
                }
                let value = effective_stress(&states, n, s_max, k);
                if value > result {
                    result = value;
                }
            }
        }
    }
    if result == f64::NEG_INFINITY {
        return f64::NAN;
    }
    result
}

/// Haigh effective stress of every point of `history`.
///
/// `mean_stress_sensitivity` holds one value per point.
pub fn haigh(history: &StressHistory, mean_stress_sensitivity: &[f64]) -> Result<Vec<f64>> {
    if mean_stress_sensitivity.len() != history.points() {
        return Err(FatigueError::shape(
            "mean stress sensitivity",
            history.points(),
            mean_stress_sensitivity.len(),
        ));
    }
    Ok(mean_stress_sensitivity
        .iter()
        .enumerate()
        .map(|(point, &k)| haigh_point(history.point_history(point), k))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector6;

    fn voigt(s: [f64; 6]) -> Vector6<f64> {
        Vector6::from_column_slice(&s[..])
    }

    // static, pulsating tension, pulsating compression, alternating tension,
    // pulsating shear, alternating shear
    fn load_cases() -> StressHistory {
        let first = vec![
            voigt([1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            voigt([1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            voigt([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            voigt([1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            voigt([0.0, 0.0, 0.0, 1000.0, 0.0, 0.0]),
            voigt([0.0, 0.0, 0.0, 1000.0, 0.0, 0.0]),
        ];
        let second = vec![
            voigt([1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            voigt([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            voigt([-1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            voigt([-1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            voigt([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            voigt([0.0, 0.0, 0.0, -1000.0, 0.0, 0.0]),
        ];
        StressHistory::new(vec![first, second]).unwrap()
    }

    #[test]
    fn test_load_cases() {
        let result = haigh(&load_cases(), &[0.0; 6]).unwrap();
        let expected = [0.0, 500.0, 500.0, 1000.0, 500.0, 1000.0];
        for (value, expected) in result.iter().zip(expected.iter()) {
            assert_relative_eq!(*value, *expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mean_stress_sensitivity() {
        let result = haigh(&load_cases(), &[0.3; 6]).unwrap();
        // static tension: amplitude 0, mean 1000
        assert_relative_eq!(result[0], 300.0, epsilon = 1e-6);
        // pulsating tension: amplitude 500, mean 500
        assert_relative_eq!(result[1], 650.0, epsilon = 1e-6);
        // pulsating compression about the tension free direction: amplitude 500, mean -500
        assert_relative_eq!(result[2], 350.0, epsilon = 1e-6);
        assert_relative_eq!(result[3], 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_reference_direction_is_fixed() {
        // the second step is larger in y but smaller along the x direction of the peak
        let history = StressHistory::new(vec![
            vec![voigt([800.0, 0.0, 0.0, 0.0, 0.0, 0.0])],
            vec![voigt([-200.0, 600.0, 0.0, 0.0, 0.0, 0.0])],
        ])
        .unwrap();
        let result = haigh(&history, &[0.0]).unwrap();
        assert_relative_eq!(result[0], 500.0, epsilon = 1e-6);
    }

    #[test]
    fn test_single_load_step_has_no_amplitude() {
        let history = StressHistory::new(vec![vec![voigt([100.0, 20.0, 0.0, 0.0, 0.0, 0.0])]]).unwrap();
        let result = haigh(&history, &[0.5]).unwrap();
        assert_relative_eq!(result[0], 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nan_stress_gives_nan() {
        let history = StressHistory::new(vec![
            vec![voigt([f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0]), voigt([f64::NAN; 6])],
            vec![voigt([100.0, 0.0, 0.0, 0.0, 0.0, 0.0]), voigt([f64::NAN; 6])],
        ])
        .unwrap();
        let result = haigh(&history, &[0.0, 0.0]).unwrap();
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
    }

    #[test]
    fn test_sensitivity_length_must_match_points() {
        assert!(matches!(
            haigh(&load_cases(), &[0.0; 5]),
            Err(FatigueError::ShapeMismatch { expected: 6, actual: 5, .. })
        ));
    }
}
