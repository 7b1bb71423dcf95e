//! Eight node hexahedral elements used for volume integration.
//!
//! Nodes follow the usual brick numbering: nodes 1 to 4 on the bottom face
//! ζ = -1 counter clockwise seen from above, nodes 5 to 8 above them.

use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;
use log::info;
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use crate::config::ParseConfig;
use crate::error::{FatigueError, Result};
use crate::io::{parse_error, parse_label, parse_value, read_records};

pub type NodalCoordinates = SMatrix<f64, 8, 3>;
pub type ShapeFunctions = SVector<f64, 8>;
pub type ShapeDerivatives = SMatrix<f64, 3, 8>;
pub type StrainDisplacement = SMatrix<f64, 6, 24>;

const NATURAL_NODES: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Full integration, 8 Gauss points.
    C3D8,
    /// Reduced integration, 1 Gauss point.
    C3D8R,
}

impl ElementType {
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::C3D8 => "C3D8",
            ElementType::C3D8R => "C3D8R",
        }
    }

    /// Natural coordinates and weights of the integration points.
    pub fn integration_points(&self) -> Vec<(Vector3<f64>, f64)> {
        match self {
            ElementType::C3D8 => full_integration_points(),
            ElementType::C3D8R => vec![(Vector3::zeros(), 8.0)],
        }
    }
}

impl FromStr for ElementType {
    type Err = FatigueError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "C3D8" => Ok(ElementType::C3D8),
            "C3D8R" => Ok(ElementType::C3D8R),
            _ => Err(FatigueError::UnknownElementType(s.to_string())),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// 2x2x2 Gauss points, ξ running fastest
fn full_integration_points() -> Vec<(Vector3<f64>, f64)> {
    let g = 1.0 / 3f64.sqrt();
    let mut points = Vec::with_capacity(8);
    for zeta in [-g, g] {
        for eta in [-g, g] {
            for xi in [-g, g] {
                points.push((Vector3::new(xi, eta, zeta), 1.0));
            }
        }
    }
    points
}

/// Trilinear shape functions at the natural coordinates `xi`.
pub fn shape_functions(xi: &Vector3<f64>) -> ShapeFunctions {
    ShapeFunctions::from_fn(|i, _| {
        let n = NATURAL_NODES[i];
        (1.0 + n[0] * xi.x) * (1.0 + n[1] * xi.y) * (1.0 + n[2] * xi.z) / 8.0
    })
}

/// Derivatives of the shape functions with respect to ξ, η and ζ, one row per direction.
pub fn shape_derivatives(xi: &Vector3<f64>) -> ShapeDerivatives {
    ShapeDerivatives::from_fn(|direction, i| {
        let n = NATURAL_NODES[i];
        let factor = |d: usize| if d == direction { n[d] } else { 1.0 + n[d] * xi[d] };
        factor(0) * factor(1) * factor(2) / 8.0
    })
}

/// An integration point with its cached Jacobian determinant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussPoint {
    pub coordinates: Vector3<f64>,
    pub weight: f64,
    pub jacobian_determinant: f64,
}

impl GaussPoint {
    /// Physical volume the point stands for.
    pub fn volume(&self) -> f64 {
        self.jacobian_determinant * self.weight
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HexElement {
    element_type: ElementType,
    nodes: NodalCoordinates,
    gauss_points: Vec<GaussPoint>,
}

fn check_determinant(determinant: f64, point: usize) -> Result<()> {
    if !(determinant > 0.0 && determinant.is_finite()) {
        return Err(FatigueError::InvalidGeometry(format!(
            "Jacobian determinant {} at integration point {}",
            determinant,
            point + 1
        )));
    }
    Ok(())
}

impl HexElement {
    /// Builds an element from its nodal coordinates, one node per row.
    ///
    /// Fails with [`FatigueError::InvalidGeometry`] when the element is
    /// inverted or degenerate at one of its integration points.
    pub fn new(element_type: ElementType, nodes: NodalCoordinates) -> Result<Self> {
        let mut gauss_points = Vec::with_capacity(8);
        for (i, (coordinates, weight)) in element_type.integration_points().into_iter().enumerate() {
            let jacobian_determinant = (shape_derivatives(&coordinates) * nodes).determinant();
            check_determinant(jacobian_determinant, i)?;
            gauss_points.push(GaussPoint {
                coordinates,
                weight,
                jacobian_determinant,
            });
        }
        Ok(HexElement {
            element_type,
            nodes,
            gauss_points,
        })
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn nodes(&self) -> &NodalCoordinates {
        &self.nodes
    }

    pub fn gauss_points(&self) -> &[GaussPoint] {
        &self.gauss_points
    }

    pub fn jacobian(&self, xi: &Vector3<f64>) -> Matrix3<f64> {
        shape_derivatives(xi) * self.nodes
    }

    pub fn volume(&self) -> f64 {
        self.gauss_points.iter().map(|gp| gp.volume()).sum()
    }

    pub fn gauss_point_volume(&self, i: usize) -> f64 {
        self.gauss_points[i].volume()
    }

    /// Physical coordinates of Gauss point `i`.
    pub fn gauss_point_coordinates(&self, i: usize) -> Vector3<f64> {
        (shape_functions(&self.gauss_points[i].coordinates).transpose() * self.nodes).transpose()
    }

    // Shape function derivatives with respect to x, y and z
    fn spatial_derivatives(&self, xi: &Vector3<f64>) -> Result<(ShapeDerivatives, f64)> {
        let jacobian = self.jacobian(xi);
        let determinant = jacobian.determinant();
        let inverse = jacobian.try_inverse().ok_or_else(|| {
            FatigueError::InvalidGeometry(format!("singular Jacobian at {:?}", xi.as_slice()))
        })?;
        Ok((inverse * shape_derivatives(xi), determinant))
    }

    /// Strain-displacement matrix at `xi` with a volume averaged dilatational part.
    ///
    /// Strains are in Voigt order with engineering shear strains, displacements
    /// are ordered node by node. The dilatational part is averaged over the
    /// 2x2x2 Gauss points, the deviatoric part is taken at `xi`.
    pub fn b_matrix(&self, xi: &Vector3<f64>) -> Result<StrainDisplacement> {
        let mut average = ShapeDerivatives::zeros();
        let mut volume = 0.0;
        for (i, (point, weight)) in full_integration_points().into_iter().enumerate() {
            let (dx, determinant) = self.spatial_derivatives(&point)?;
            check_determinant(determinant, i)?;
            average += dx * (determinant * weight);
            volume += determinant * weight;
        }
        average /= volume;

        let (dx, _) = self.spatial_derivatives(xi)?;
        let mut b = StrainDisplacement::zeros();
        for i in 0..8 {
            for row in 0..3 {
                for k in 0..3 {
                    let deviatoric = if row == k { 2.0 / 3.0 } else { -1.0 / 3.0 };
                    b[(row, 3 * i + k)] = average[(k, i)] / 3.0 + deviatoric * dx[(k, i)];
                }
            }
            b[(3, 3 * i)] = dx[(1, i)];
            b[(3, 3 * i + 1)] = dx[(0, i)];
            b[(4, 3 * i)] = dx[(2, i)];
            b[(4, 3 * i + 2)] = dx[(0, i)];
            b[(5, 3 * i + 1)] = dx[(2, i)];
            b[(5, 3 * i + 2)] = dx[(1, i)];
        }
        Ok(b)
    }
}

/// Reads elements, `label type x1 y1 z1 ... x8 y8 z8` per row.
pub fn read_elements(path: &str, parse_config: &ParseConfig) -> Result<HashMap<u64, HexElement>> {
    let mut elements = HashMap::new();
    for (line, row) in read_records(path, parse_config)? {
        if row.len() != 26 {
            return Err(parse_error(
                path,
                line,
                format!("expected label, type and 24 coordinates, got {} columns", row.len()),
            ));
        }
        let label = parse_label(path, line, &row[0])?;
        let element_type: ElementType = row[1].parse()?;
        let coordinates = row[2..]
            .iter()
            .map(|f| parse_value(path, line, f))
            .collect::<Result<Vec<f64>>>()?;
        let element = HexElement::new(element_type, NodalCoordinates::from_row_slice(&coordinates))
            .map_err(|e| match e {
                FatigueError::InvalidGeometry(message) => {
                    FatigueError::InvalidGeometry(format!("element {}: {}", label, message))
                }
                other => other,
            })?;
        if elements.insert(label, element).is_some() {
            return Err(parse_error(path, line, format!("element {} is defined twice", label)));
        }
    }
    info!("Read {} elements from {}", elements.len(), path);
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn box_nodes() -> NodalCoordinates {
        NodalCoordinates::from_row_slice(&[
            0.0, 0.0, 0.0,
            2.0, 0.0, 0.0,
            2.0, 2.0, 0.0,
            0.0, 2.0, 0.0,
            0.0, 0.0, 1.0,
            2.0, 0.0, 1.0,
            2.0, 2.0, 1.0,
            0.0, 2.0, 1.0,
        ])
    }

    fn displacements(u: impl Fn(&Vector3<f64>) -> Vector3<f64>, nodes: &NodalCoordinates) -> SVector<f64, 24> {
        let mut d = SVector::<f64, 24>::zeros();
        for i in 0..8 {
            let x: Vector3<f64> = nodes.row(i).transpose();
            let ui = u(&x);
            d.fixed_rows_mut::<3>(3 * i).copy_from(&ui);
        }
        d
    }

    #[test]
    fn test_partition_of_unity() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let xi = Vector3::from_fn(|_, _| rng.gen_range(-1.0..1.0));
            assert_relative_eq!(shape_functions(&xi).sum(), 1.0, epsilon = 1e-12);
            let d = shape_derivatives(&xi);
            for direction in 0..3 {
                assert_relative_eq!(d.row(direction).sum(), 0.0, epsilon = 1e-12);
            }
        }
        let at_node = shape_functions(&Vector3::new(1.0, 1.0, -1.0));
        assert_relative_eq!(at_node[2], 1.0);
        assert_relative_eq!(at_node.sum(), 1.0);
    }

    #[test]
    fn test_box_volumes() {
        let full = HexElement::new(ElementType::C3D8, box_nodes()).unwrap();
        assert_eq!(full.gauss_points().len(), 8);
        assert_relative_eq!(full.volume(), 4.0, epsilon = 1e-12);
        for i in 0..8 {
            assert_relative_eq!(full.gauss_point_volume(i), 0.5, epsilon = 1e-12);
        }

        let reduced = HexElement::new(ElementType::C3D8R, box_nodes()).unwrap();
        assert_eq!(reduced.gauss_points().len(), 1);
        assert_relative_eq!(reduced.gauss_point_volume(0), 4.0, epsilon = 1e-12);
        assert_relative_eq!(reduced.gauss_point_coordinates(0), Vector3::new(1.0, 1.0, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_gauss_point_order() {
        let element = HexElement::new(ElementType::C3D8, box_nodes()).unwrap();
        let g = 1.0 / 3f64.sqrt();
        let first = element.gauss_point_coordinates(0);
        assert_relative_eq!(first, Vector3::new(1.0 - g, 1.0 - g, 0.5 * (1.0 - g)), epsilon = 1e-12);
        // ξ runs fastest
        let second = element.gauss_point_coordinates(1);
        assert_relative_eq!(second, Vector3::new(1.0 + g, 1.0 - g, 0.5 * (1.0 - g)), epsilon = 1e-12);
    }

    #[test]
    fn test_sheared_element_keeps_volume() {
        let mut nodes = box_nodes();
        for i in 0..8 {
            let z = nodes[(i, 2)];
            nodes[(i, 0)] += 0.5 * z;
        }
        let element = HexElement::new(ElementType::C3D8, nodes).unwrap();
        assert_relative_eq!(element.volume(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverted_element_is_rejected() {
        let mut nodes = box_nodes();
        for i in 0..4 {
            nodes.swap_rows(i, i + 4);
        }
        assert!(matches!(
            HexElement::new(ElementType::C3D8R, nodes),
            Err(FatigueError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_b_matrix() {
        let nodes = box_nodes();
        let element = HexElement::new(ElementType::C3D8, nodes).unwrap();
        let xi = Vector3::new(0.2, -0.3, 0.5);
        let b = element.b_matrix(&xi).unwrap();

        let translation = displacements(|_| Vector3::new(0.1, -0.2, 0.3), &nodes);
        assert_relative_eq!((b * translation).norm(), 0.0, epsilon = 1e-12);

        let stretch = displacements(|x| Vector3::new(0.01 * x.x, 0.0, 0.0), &nodes);
        let strain = b * stretch;
        assert_relative_eq!(strain[0], 0.01, epsilon = 1e-12);
        for i in 1..6 {
            assert_relative_eq!(strain[i], 0.0, epsilon = 1e-12);
        }

        let shear = displacements(|x| Vector3::new(0.02 * x.y, 0.0, 0.0), &nodes);
        let strain = b * shear;
        assert_relative_eq!(strain[3], 0.02, epsilon = 1e-12);
        assert_relative_eq!(strain[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_element_type_names() {
        assert_eq!("C3D8R".parse::<ElementType>().unwrap(), ElementType::C3D8R);
        assert_eq!(ElementType::C3D8.to_string(), "C3D8");
        assert!(matches!(
            "C3D20".parse::<ElementType>(),
            Err(FatigueError::UnknownElementType(_))
        ));
    }
}
