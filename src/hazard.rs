//! Hazard functions of the weakest-link model.

use crate::error::{FatigueError, Result};
use crate::material::Material;
use crate::steel_data::SteelData;

/// Cycle count used when none is given.
pub const DEFAULT_CYCLES: f64 = 2e6;

/// Weibull hazard density `(s / sw)^m` of every point at `cycles`.
///
/// Stresses below the fatigue threshold and negative stresses give no
/// hazard. `stress` is left untouched.
pub fn weibull(stress: &[f64], steel_data: &SteelData, material: &Material, cycles: f64) -> Result<Vec<f64>> {
    if stress.len() != steel_data.len() {
        return Err(FatigueError::shape("stress state", steel_data.len(), stress.len()));
    }
    let m = material.m(steel_data, cycles)?;
    let sw = material.sw(steel_data, cycles)?;
    let sth = material.sth(steel_data)?;
    let mut clamped = stress.to_vec();
    for (s, threshold) in clamped.iter_mut().zip(sth.iter()) {
        if *s < *threshold || *s < 0.0 {
            *s = 0.0;
        }
    }
    Ok(clamped
        .iter()
        .zip(sw.iter().zip(m.iter()))
        .map(|(s, (sw, m))| (s / sw).powf(*m))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Law;
    use approx::assert_relative_eq;

    #[test]
    fn test_weibull_ss2506() {
        let material = Material::ss2506();
        let steel = SteelData::from_hardness(vec![700.0, 700.0]);
        let stress = vec![600.0, -100.0];
        let hazard = weibull(&stress, &steel, &material, 1e5).unwrap();
        let m: f64 = 11.5719e6 / (700.0 * 700.0);
        let sw: f64 = 158.7 + 0.481538 * 700.0;
        assert_relative_eq!(hazard[0], (600.0 / sw).powf(m), max_relative = 1e-12);
        assert_relative_eq!(hazard[1], 0.0);
        assert_eq!(stress, vec![600.0, -100.0]);
    }

    #[test]
    fn test_threshold_clamp() {
        let mut material = Material::ss2506();
        material.fatigue.threshold = Law::Constant { value: 300.0 };
        let steel = SteelData::from_hardness(vec![750.0; 3]);
        let stress = [250.0, 300.0, 450.0];
        let hazard = weibull(&stress, &steel, &material, DEFAULT_CYCLES).unwrap();
        assert_eq!(hazard[0], 0.0);
        assert!(hazard[1] > 0.0);
        assert!(hazard[2] > hazard[1]);
        assert_eq!(stress, [250.0, 300.0, 450.0]);
    }

    #[test]
    fn test_hazard_grows_with_cycles() {
        let material = Material::ss2506();
        let steel = SteelData::from_hardness(vec![750.0]);
        let mut previous = 0.0;
        for cycles in [1e4, 1e5, 1e6, 1e7] {
            let h = weibull(&[550.0], &steel, &material, cycles).unwrap()[0];
            assert!(h > previous, "{} at {} cycles", h, cycles);
            previous = h;
        }
    }

    #[test]
    fn test_length_mismatch() {
        let steel = SteelData::from_hardness(vec![750.0; 2]);
        let err = weibull(&[1.0], &steel, &Material::ss2506(), DEFAULT_CYCLES).unwrap_err();
        assert!(matches!(err, FatigueError::ShapeMismatch { expected: 2, actual: 1, .. }));
    }
}
