//! Weakest-link probability of failure.
//!
//! The hazard density of every sample point is integrated over the volume of
//! the Gauss point it belongs to. The integral is the expected number of
//! critical defects, which gives the probability of failure of the model as
//! `1 - exp(-integral)`.

use hashbrown::HashMap;
use log::{debug, warn};

use crate::element::HexElement;
use crate::error::{FatigueError, Result};
use crate::hazard::weibull;
use crate::material::Material;
use crate::steel_data::SteelData;

/// Anything that maps a stress state and a cycle count to a probability of failure.
pub trait FailureProbability {
    fn probability_of_failure(&self, stress_state: &[f64], cycles: f64) -> Result<f64>;
}

impl<F> FailureProbability for F
where
    F: Fn(&[f64], f64) -> Result<f64>,
{
    fn probability_of_failure(&self, stress_state: &[f64], cycles: f64) -> Result<f64> {
        self(stress_state, cycles)
    }
}

/// Weakest-link evaluator of one geometry and heat treatment.
///
/// Sample `i` of a stress state belongs to element `element_labels[i]`. The
/// k-th sample of an element is taken at its k-th Gauss point.
#[derive(Debug, Clone)]
pub struct WeakestLinkEvaluator {
    elements: HashMap<u64, HexElement>,
    element_labels: Vec<u64>,
    sample_volumes: Vec<f64>,
    steel_data: SteelData,
    material: Material,
    symmetry_factor: f64,
}

impl WeakestLinkEvaluator {
    /// Sets up the evaluator.
    ///
    /// `symmetry_factor` is the number of identical copies of the modelled
    /// part in the full component, 2 for a half model and 1 for a full model.
    pub fn new(
        elements: HashMap<u64, HexElement>,
        element_labels: Vec<u64>,
        steel_data: SteelData,
        material: Material,
        symmetry_factor: f64,
    ) -> Result<Self> {
        if !(symmetry_factor > 0.0 && symmetry_factor.is_finite()) {
            return Err(FatigueError::InvalidArgument(format!(
                "symmetry factor must be a positive number, got {}",
                symmetry_factor
            )));
        }
        if steel_data.len() != element_labels.len() {
            return Err(FatigueError::shape("steel data", element_labels.len(), steel_data.len()));
        }

        let mut samples: HashMap<u64, usize> = HashMap::new();
        let mut sample_volumes = Vec::with_capacity(element_labels.len());
        for label in element_labels.iter() {
            let element = elements.get(label).ok_or(FatigueError::UnknownElement(*label))?;
            let count = samples.entry(*label).or_insert(0);
            if *count < element.gauss_points().len() {
                sample_volumes.push(element.gauss_point_volume(*count));
            }
            *count += 1;
        }
        for (label, count) in samples.iter() {
            let expected = elements[label].gauss_points().len();
            if *count != expected {
                return Err(FatigueError::shape(
                    format!("samples of element {}", label),
                    expected,
                    *count,
                ));
            }
        }
        debug!(
            "Weakest-link evaluator with {} samples in {} of {} elements",
            element_labels.len(),
            samples.len(),
            elements.len()
        );

        Ok(WeakestLinkEvaluator {
            elements,
            element_labels,
            sample_volumes,
            steel_data,
            material,
            symmetry_factor,
        })
    }

    pub fn elements(&self) -> &HashMap<u64, HexElement> {
        &self.elements
    }

    pub fn element_labels(&self) -> &[u64] {
        &self.element_labels
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn symmetry_factor(&self) -> f64 {
        self.symmetry_factor
    }

    /// Volume of the sampled part of the geometry.
    pub fn volume(&self) -> f64 {
        self.sample_volumes.iter().sum()
    }

    /// Hazard density integrated over the modelled volume.
    ///
    /// Each sample contributes its hazard times `detJ * w` of its Gauss point,
    /// so the integration weight enters once.
    pub fn integral(&self, stress_state: &[f64], cycles: f64) -> Result<f64> {
        if stress_state.len() != self.element_labels.len() {
            return Err(FatigueError::shape(
                "stress state",
                self.element_labels.len(),
                stress_state.len(),
            ));
        }
        let hazard = weibull(stress_state, &self.steel_data, &self.material, cycles)?;
        let integral: f64 = hazard
            .iter()
            .zip(self.sample_volumes.iter())
            .map(|(h, v)| h * v)
            .sum();
        if !integral.is_finite() {
            warn!("Hazard integral at {} cycles is {}", cycles, integral);
        }
        Ok(integral)
    }

    /// Probability of failure of the full component at `cycles`.
    pub fn evaluate(&self, stress_state: &[f64], cycles: f64) -> Result<f64> {
        let integral = self.integral(stress_state, cycles)?;
        let pf_model = -(-integral).exp_m1();
        Ok(1.0 - (1.0 - pf_model).powf(self.symmetry_factor))
    }
}

impl FailureProbability for WeakestLinkEvaluator {
    fn probability_of_failure(&self, stress_state: &[f64], cycles: f64) -> Result<f64> {
        self.evaluate(stress_state, cycles)
    }
}
