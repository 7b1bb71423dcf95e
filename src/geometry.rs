//! Smallest enclosing circle of a planar point set.
//!
//! The radius of the circle enclosing the shear stress path on a plane is
//! the shear stress amplitude on that plane.

use nalgebra::Point2;

const RELATIVE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point2<f64>,
    pub radius: f64,
}

impl Circle {
    fn from_point(a: Point2<f64>) -> Self {
        Circle {
            center: a,
            radius: 0.0,
        }
    }

    fn from_pair(a: Point2<f64>, b: Point2<f64>) -> Self {
        let center = nalgebra::center(&a, &b);
        Circle {
            center,
            radius: nalgebra::distance(&center, &a),
        }
    }

    /// Circumcircle of three points. Collinear points give the circle spanned by the farthest pair.
    fn from_triple(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> Self {
        let ab = b - a;
        let ac = c - a;
        let d = 2.0 * (ab.x * ac.y - ab.y * ac.x);
        let scale = ab.norm_squared().max(ac.norm_squared());
        if d.abs() <= RELATIVE_TOLERANCE * scale {
            let pairs = [(a, b), (a, c), (b, c)];
            let (p, q) = pairs
                .iter()
                .copied()
                .fold(pairs[0], |best, pair| {
                    if nalgebra::distance_squared(&pair.0, &pair.1)
                        > nalgebra::distance_squared(&best.0, &best.1)
                    {
                        pair
                    } else {
                        best
                    }
                });
            return Self::from_pair(p, q);
        }
        let ab2 = ab.norm_squared();
        let ac2 = ac.norm_squared();
        let ux = (ac.y * ab2 - ab.y * ac2) / d;
        let uy = (ab.x * ac2 - ac.x * ab2) / d;
        let center = Point2::new(a.x + ux, a.y + uy);
        Circle {
            center,
            radius: nalgebra::distance(&center, &a)
                .max(nalgebra::distance(&center, &b))
                .max(nalgebra::distance(&center, &c)),
        }
    }

    pub fn contains(&self, p: &Point2<f64>) -> bool {
        let tolerance = RELATIVE_TOLERANCE * 1e3 * (1.0 + self.radius + self.center.coords.amax());
        nalgebra::distance(&self.center, p) <= self.radius + tolerance
    }
}

/// Smallest circle enclosing all `points`.
///
/// Iterative form of Welzl's algorithm: a point outside the current circle is
/// on the boundary of the circle of all points seen so far, which fixes one
/// support point at a time. Worst case cubic, linear in practice for load
/// histories. An empty input gives a zero circle at the origin.
pub fn smallest_enclosing_circle(points: &[Point2<f64>]) -> Circle {
    let mut circle = match points.first() {
        Some(p) => Circle::from_point(*p),
        None => return Circle::from_point(Point2::origin()),
    };
    for i in 1..points.len() {
        if circle.contains(&points[i]) {
            continue;
        }
        circle = Circle::from_point(points[i]);
        for j in 0..i {
            if circle.contains(&points[j]) {
                continue;
            }
            circle = Circle::from_pair(points[i], points[j]);
            for k in 0..j {
                if !circle.contains(&points[k]) {
                    circle = Circle::from_triple(points[i], points[j], points[k]);
                }
            }
        }
    }
    circle
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn points(coordinates: &[(f64, f64)]) -> Vec<Point2<f64>> {
        coordinates.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    fn brute_force(points: &[Point2<f64>]) -> f64 {
        let encloses = |c: &Circle| points.iter().all(|p| nalgebra::distance(&c.center, p) <= c.radius + 1e-9);
        let mut best = f64::INFINITY;
        for i in 0..points.len() {
            for j in i..points.len() {
                let c = Circle::from_pair(points[i], points[j]);
                if encloses(&c) {
                    best = best.min(c.radius);
                }
                for k in j + 1..points.len() {
                    let c = Circle::from_triple(points[i], points[j], points[k]);
                    if encloses(&c) {
                        best = best.min(c.radius);
                    }
                }
            }
        }
        best
    }

    #[test]
    fn test_simple_configurations() {
        let c = smallest_enclosing_circle(&points(&[(1.0, 2.0)]));
        assert_relative_eq!(c.radius, 0.0);
        assert_relative_eq!(c.center, Point2::new(1.0, 2.0));

        let c = smallest_enclosing_circle(&points(&[(-1.0, 0.0), (1.0, 0.0)]));
        assert_relative_eq!(c.radius, 1.0, epsilon = 1e-12);

        // right triangle, hypotenuse is the diameter
        let c = smallest_enclosing_circle(&points(&[(0.0, 0.0), (4.0, 0.0), (0.0, 3.0)]));
        assert_relative_eq!(c.radius, 2.5, epsilon = 1e-12);
        assert_relative_eq!(c.center, Point2::new(2.0, 1.5), epsilon = 1e-12);

        // equilateral triangle
        let h = 3f64.sqrt();
        let c = smallest_enclosing_circle(&points(&[(-1.0, 0.0), (1.0, 0.0), (0.0, h)]));
        assert_relative_eq!(c.radius, 2.0 / h, epsilon = 1e-12);

        let c = smallest_enclosing_circle(&[]);
        assert_relative_eq!(c.radius, 0.0);
    }

    #[test]
    fn test_collinear_and_duplicate_points() {
        let line = points(&[(0.0, 0.0), (1.0, 1.0), (3.0, 3.0), (2.0, 2.0), (-1.0, -1.0)]);
        let c = smallest_enclosing_circle(&line);
        assert_relative_eq!(c.radius, 2.0 * 2f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(c.center, Point2::new(1.0, 1.0), epsilon = 1e-12);

        let c = Circle::from_triple(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(1.0, 0.0));
        assert_relative_eq!(c.radius, 1.0, epsilon = 1e-12);

        let repeated = points(&[(1.0, 0.0), (1.0, 0.0), (-1.0, 0.0), (-1.0, 0.0), (1.0, 0.0)]);
        let c = smallest_enclosing_circle(&repeated);
        assert_relative_eq!(c.radius, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_minimal_and_enclosing_against_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let n = rng.gen_range(1..=8);
            let cloud: Vec<Point2<f64>> = (0..n)
                .map(|_| Point2::new(rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0)))
                .collect();
            let c = smallest_enclosing_circle(&cloud);
            for p in cloud.iter() {
                assert!(nalgebra::distance(&c.center, p) <= c.radius + 1e-9);
            }
            if n > 1 {
                assert_relative_eq!(c.radius, brute_force(&cloud), epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn test_invariant_under_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let n = rng.gen_range(2..40);
            let mut cloud: Vec<Point2<f64>> = (0..n)
                .map(|_| Point2::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)))
                .collect();
            let reference = smallest_enclosing_circle(&cloud);
            for _ in 0..5 {
                cloud.shuffle(&mut rng);
                let c = smallest_enclosing_circle(&cloud);
                assert_relative_eq!(c.radius, reference.radius, epsilon = 1e-9);
                assert_relative_eq!(c.center, reference.center, epsilon = 1e-7);
            }
        }
    }
}
