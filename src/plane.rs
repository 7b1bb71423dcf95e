//! Material planes and the rotation of stress vectors onto them.

use nalgebra::{Matrix3, Matrix6};

/// A candidate plane of the critical plane search.
///
/// `theta` is the angle of the plane normal in the x-y plane and `phi` its
/// angle from the z axis, both in degrees. Local axis 1 is the plane normal,
/// axes 2 and 3 span the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalPlane {
    pub theta: f64,
    pub phi: f64,
    pub transform: Matrix6<f64>,
}

impl CriticalPlane {
    pub fn new(theta: f64, phi: f64) -> Self {
        CriticalPlane {
            theta,
            phi,
            transform: transform_matrix(theta, phi),
        }
    }
}

/// Direction cosines of the local plane axes, one axis per row.
pub fn direction_cosines(theta_deg: f64, phi_deg: f64) -> Matrix3<f64> {
    let (sin_theta, cos_theta) = theta_deg.to_radians().sin_cos();
    let (sin_phi, cos_phi) = phi_deg.to_radians().sin_cos();
    Matrix3::new(
        cos_theta * sin_phi, sin_theta * sin_phi, cos_phi,
        -sin_theta, cos_theta, 0.0,
        -cos_theta * cos_phi, -sin_theta * cos_phi, sin_phi,
    )
}

/// 6×6 matrix taking a global Voigt stress vector to the frame whose axes are the rows of `a`.
///
/// Both vectors use the order σ11, σ22, σ33, τ12, τ13, τ23.
pub fn stress_transform(a: &Matrix3<f64>) -> Matrix6<f64> {
    // global components (i, j) in Voigt order
    const PAIRS: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (0, 2), (1, 2)];
    let mut q = Matrix6::zeros();
    for (row, &(k, l)) in PAIRS.iter().enumerate() {
        for (col, &(i, j)) in PAIRS.iter().enumerate() {
            q[(row, col)] = if i == j {
                a[(k, i)] * a[(l, i)]
            } else {
                a[(k, i)] * a[(l, j)] + a[(k, j)] * a[(l, i)]
            };
        }
    }
    q
}

/// Stress transformation onto the plane given by `theta_deg` and `phi_deg`.
pub fn transform_matrix(theta_deg: f64, phi_deg: f64) -> Matrix6<f64> {
    stress_transform(&direction_cosines(theta_deg, phi_deg))
}
