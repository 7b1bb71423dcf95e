//! Stress tensors, stress fields and stress histories.
//!
//! Stress components use the Voigt order σxx, σyy, σzz, τxy, τxz, τyz
//! throughout the crate.

use std::ops::Range;

use log::debug;
use na::{Const, Matrix3, SymmetricEigen, Vector3, Vector6};
use nalgebra as na;

use crate::config::FieldSource;
use crate::error::{FatigueError, Result};
use crate::io::read_field_file;

#[derive(Debug, Clone, PartialEq)]
pub struct StressTensor {
    matrix: Matrix3<f64>,
    vector: Vector6<f64>,
}

impl StressTensor {
    pub fn new(matrix: Matrix3<f64>) -> Self {
        let vector = Self::matrix_to_vector(&matrix);
        StressTensor { matrix, vector }
    }

    pub fn from_voigt(vector: Vector6<f64>) -> Self {
        let matrix = Self::vector_to_matrix(&vector);
        StressTensor { matrix, vector }
    }

    // Converts a Matrix3 to a Vector6 following Voigt notation
    fn matrix_to_vector(matrix: &Matrix3<f64>) -> Vector6<f64> {
        Vector6::new(
            matrix[(0, 0)], // σxx
            matrix[(1, 1)], // σyy
            matrix[(2, 2)], // σzz
            matrix[(0, 1)], // τxy
            matrix[(0, 2)], // τxz
            matrix[(1, 2)], // τyz
        )
    }

    fn vector_to_matrix(vector: &Vector6<f64>) -> Matrix3<f64> {
        Matrix3::new(
            vector[0], vector[3], vector[4], // Row 1: σxx, τxy, τxz
            vector[3], vector[1], vector[5], // Row 2: τxy, σyy, τyz
            vector[4], vector[5], vector[2], // Row 3: τxz, τyz, σzz
        )
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn voigt(&self) -> &Vector6<f64> {
        &self.vector
    }

    // Principal stresses and directions, eigenvectors are the columns
    pub fn principal_stresses(&self) -> SymmetricEigen<f64, Const<3>> {
        self.matrix.symmetric_eigen()
    }

    pub fn max_principal_stress(&self) -> f64 {
        self.principal_stresses().eigenvalues.max()
    }

    /// Normal stress n·σ·n on the plane with unit normal `n`.
    pub fn normal_stress(&self, n: &Vector3<f64>) -> f64 {
        n.dot(&(self.matrix * n))
    }
}

/// One stress field read from a result file: a label and a stress vector per point.
#[derive(Debug, Clone, PartialEq)]
pub struct StressField {
    pub labels: Vec<u64>,
    pub stresses: Vec<Vector6<f64>>,
}

impl StressField {
    pub fn len(&self) -> usize {
        self.stresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stresses.is_empty()
    }
}

/// Reads a stress field, `label σxx σyy σzz τxy τxz τyz` per row, scaled by the source factor.
pub fn read_stress_field(source: &FieldSource) -> Result<StressField> {
    let data = read_field_file(&source.path, &source.parse_config)?;
    let mut stresses = Vec::with_capacity(data.values.len());
    for row in data.values.iter() {
        if row.len() != 6 {
            return Err(FatigueError::shape(
                format!("stress components in {}", source.path),
                6,
                row.len(),
            ));
        }
        stresses.push(Vector6::from_column_slice(row.as_slice()) * source.scale);
    }
    debug!("Read {} stress tensors from {}", stresses.len(), source.path);
    Ok(StressField {
        labels: data.labels,
        stresses,
    })
}

/// Stress history with `load_steps` × `points` stress vectors, stored step major.
#[derive(Debug, Clone, PartialEq)]
pub struct StressHistory {
    load_steps: usize,
    points: usize,
    data: Vec<Vector6<f64>>,
}

impl StressHistory {
    /// Builds a history from one vector of point stresses per load step.
    pub fn new(steps: Vec<Vec<Vector6<f64>>>) -> Result<Self> {
        let load_steps = steps.len();
        let points = steps.first().map(|s| s.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(load_steps * points);
        for (i, step) in steps.into_iter().enumerate() {
            if step.len() != points {
                return Err(FatigueError::shape(
                    format!("points of load step {}", i + 1),
                    points,
                    step.len(),
                ));
            }
            data.extend(step);
        }
        Ok(StressHistory {
            load_steps,
            points,
            data,
        })
    }

    pub fn zeros(load_steps: usize, points: usize) -> Self {
        StressHistory {
            load_steps,
            points,
            data: vec![Vector6::zeros(); load_steps * points],
        }
    }

    /// One load step per cyclic field, with every static field added to every step.
    pub fn assemble(cyclic: &[StressField], static_fields: &[StressField]) -> Result<Self> {
        let points = cyclic.first().map(|f| f.len()).unwrap_or(0);
        let mut steps = Vec::with_capacity(cyclic.len());
        for (i, field) in cyclic.iter().enumerate() {
            if field.len() != points {
                return Err(FatigueError::shape(
                    format!("cyclic stress {}", i + 1),
                    points,
                    field.len(),
                ));
            }
            steps.push(field.stresses.clone());
        }
        for (k, field) in static_fields.iter().enumerate() {
            if field.len() != points {
                return Err(FatigueError::shape(
                    format!("static stress {}", k + 1),
                    points,
                    field.len(),
                ));
            }
            for step in steps.iter_mut() {
                for (s, s_static) in step.iter_mut().zip(field.stresses.iter()) {
                    *s += s_static;
                }
            }
        }
        Self::new(steps)
    }

    pub fn load_steps(&self) -> usize {
        self.load_steps
    }

    pub fn points(&self) -> usize {
        self.points
    }

    pub fn get(&self, step: usize, point: usize) -> &Vector6<f64> {
        &self.data[step * self.points + point]
    }

    /// The stress vectors of one point over all load steps.
    pub fn point_history(&self, point: usize) -> impl Iterator<Item = &Vector6<f64>> + '_ {
        (0..self.load_steps).map(move |step| self.get(step, point))
    }

    /// The history of the points in `range`, every load step sliced identically.
    pub fn slice_points(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.points {
            return Err(FatigueError::InvalidArgument(format!(
                "point range {:?} outside stress history with {} points",
                range, self.points
            )));
        }
        let mut data = Vec::with_capacity(self.load_steps * range.len());
        for step in 0..self.load_steps {
            let start = step * self.points;
            data.extend_from_slice(&self.data[start + range.start..start + range.end]);
        }
        Ok(StressHistory {
            load_steps: self.load_steps,
            points: range.len(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stress_tensor() {
        let matrix = Matrix3::new(
            1.0, 0.0, 2.0,
            0.0, 0.0, 0.0,
            2.0, 0.0, 3.0,
        );
        let stress = StressTensor::new(matrix);
        let max_principal_stress = stress.max_principal_stress();
        assert_relative_eq!(max_principal_stress, 4.2360679774997898, epsilon = 1e-6);
        let n = Vector3::new(0.0, 0.0, 1.0);
        assert_relative_eq!(stress.normal_stress(&n), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vector_matrix_conversion() {
        let vector = Vector6::new(1.0, 5.0, 9.0, 2.0, 3.0, 6.0);
        let expected_matrix = Matrix3::new(1.0, 2.0, 3.0, 2.0, 5.0, 6.0, 3.0, 6.0, 9.0);
        let stress = StressTensor::from_voigt(vector);
        assert_eq!(*stress.matrix(), expected_matrix);
        assert_eq!(*StressTensor::new(expected_matrix).voigt(), vector);
    }

    fn field(values: &[[f64; 6]]) -> StressField {
        StressField {
            labels: (1..=values.len() as u64).collect(),
            stresses: values.iter().map(|v| Vector6::from_column_slice(&v[..])).collect(),
        }
    }

    #[test]
    fn test_assemble_adds_static_stress_to_every_step() {
        let cyclic = vec![
            field(&[[100.0, 0.0, 0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 10.0, 0.0, 0.0]]),
            field(&[[-100.0, 0.0, 0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, -10.0, 0.0, 0.0]]),
        ];
        let residual = vec![field(&[[-50.0, -50.0, 0.0, 0.0, 0.0, 0.0], [0.0; 6]])];
        let history = StressHistory::assemble(&cyclic, &residual).unwrap();
        assert_eq!(history.load_steps(), 2);
        assert_eq!(history.points(), 2);
        assert_relative_eq!(history.get(0, 0)[0], 50.0);
        assert_relative_eq!(history.get(1, 0)[0], -150.0);
        assert_relative_eq!(history.get(1, 0)[1], -50.0);
        assert_relative_eq!(history.get(1, 1)[3], -10.0);
    }

    #[test]
    fn test_assemble_rejects_mismatched_fields() {
        let cyclic = vec![field(&[[1.0; 6], [1.0; 6]])];
        let static_fields = vec![field(&[[1.0; 6]])];
        let err = StressHistory::assemble(&cyclic, &static_fields).unwrap_err();
        assert!(err.to_string().contains("static stress 1"), "{}", err);
    }

    #[test]
    fn test_slice_points() {
        let steps = (0..3)
            .map(|s| {
                (0..5)
                    .map(|p| Vector6::repeat((10 * s + p) as f64))
                    .collect::<Vec<_>>()
            })
            .collect();
        let history = StressHistory::new(steps).unwrap();
        let part = history.slice_points(2..4).unwrap();
        assert_eq!(part.points(), 2);
        assert_eq!(part.load_steps(), 3);
        assert_relative_eq!(part.get(2, 1)[0], 23.0);
        let values: Vec<f64> = part.point_history(0).map(|s| s[5]).collect();
        assert_eq!(values, vec![2.0, 12.0, 22.0]);
    }
}
