//! Findley critical plane criterion.
//!
//! The Findley stress of a point is the largest value over all material planes
//! of the shear stress amplitude on the plane plus `k` times the largest normal
//! stress on the plane, both taken over the load history.

use nalgebra::Point2;

use crate::error::{FatigueError, Result};
use crate::geometry::smallest_enclosing_circle;
use crate::plane::CriticalPlane;
use crate::stress::StressHistory;

pub const DEFAULT_SEARCH_GRID: f64 = 10.0;

const THETA_RANGE: f64 = 180.0;
const PHI_RANGE: f64 = 90.0;
const GRID_TOLERANCE: f64 = 1e-9;

/// The Findley stress of a point and the plane it was found on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FindleyStress {
    pub value: f64,
    pub theta: f64,
    pub phi: f64,
}

fn check_search_grid(search_grid: f64) -> Result<()> {
    if !(search_grid > 0.0 && search_grid <= THETA_RANGE) {
        return Err(FatigueError::InvalidArgument(format!(
            "search grid must be in (0, 180] degrees, got {}",
            search_grid
        )));
    }
    Ok(())
}

fn grid(start: f64, end: f64, step: f64) -> Vec<f64> {
    (0..)
        .map(|i| start + i as f64 * step)
        .take_while(|v| *v <= end + GRID_TOLERANCE)
        .collect()
}

/// The searched planes, theta major and phi minor.
///
/// theta runs from 0 to 180 degrees and phi from -90 to 90 degrees, both ends
/// included when they fall on the grid.
pub fn search_planes(search_grid: f64) -> Result<Vec<CriticalPlane>> {
    check_search_grid(search_grid)?;
    let phis = grid(-PHI_RANGE, PHI_RANGE, search_grid);
    let planes = grid(0.0, THETA_RANGE, search_grid)
        .into_iter()
        .flat_map(|theta| phis.iter().map(move |&phi| CriticalPlane::new(theta, phi)))
        .collect();
    Ok(planes)
}

fn critical_plane(
    history: &StressHistory,
    point: usize,
    k: f64,
    planes: &[CriticalPlane],
    shear_path: &mut Vec<Point2<f64>>,
) -> FindleyStress {
    let mut result = FindleyStress {
        value: f64::NEG_INFINITY,
        theta: 0.0,
        phi: 0.0,
    };
    for plane in planes {
        shear_path.clear();
        let mut max_normal = f64::NEG_INFINITY;
        for stress in history.point_history(point) {
            let local = plane.transform * stress;
            shear_path.push(Point2::new(local[3], local[4]));
            max_normal = max_normal.max(local[0]);
        }
        let amplitude = smallest_enclosing_circle(shear_path).radius;
        let value = amplitude + k * max_normal;
        // first plane wins ties
        if value > result.value {
            result = FindleyStress {
                value,
                theta: plane.theta,
                phi: plane.phi,
            };
        }
    }
    result
}

/// Findley stress and critical plane of every point of `history`.
pub fn findley_planes(history: &StressHistory, k: &[f64], search_grid: f64) -> Result<Vec<FindleyStress>> {
    if k.len() != history.points() {
        return Err(FatigueError::shape("findley k", history.points(), k.len()));
    }
    let planes = search_planes(search_grid)?;
    let mut shear_path = Vec::with_capacity(history.load_steps());
    Ok((0..history.points())
        .map(|point| critical_plane(history, point, k[point], &planes, &mut shear_path))
        .collect())
}

/// Findley stress of every point of `history`.
///
/// `k` is the normal stress sensitivity per point and `search_grid` the angle
/// increment of the plane search in degrees.
pub fn findley(history: &StressHistory, k: &[f64], search_grid: f64) -> Result<Vec<f64>> {
    Ok(findley_planes(history, k, search_grid)?
        .into_iter()
        .map(|f| f.value)
        .collect())
}
