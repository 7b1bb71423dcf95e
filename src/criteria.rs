//! Effective stress criteria and the fields they produce.

use crate::error::{FatigueError, Result};
use crate::findley::{findley, DEFAULT_SEARCH_GRID};
use crate::haigh::haigh;
use crate::material::{Capability, Material};
use crate::steel_data::SteelData;
use crate::stress::StressHistory;

/// A named field of an effective stress result, one value per point.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub description: String,
    pub values: Vec<f64>,
}

impl Variable {
    fn new(name: &str, description: &str, values: Vec<f64>) -> Self {
        Variable {
            name: name.to_string(),
            description: description.to_string(),
            values,
        }
    }
}

/// Result of a criterion: the effective stress and any derived ratios.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EffectiveStress {
    pub variables: Vec<Variable>,
}

impl EffectiveStress {
    pub fn points(&self) -> usize {
        self.variables.first().map(|v| v.values.len()).unwrap_or(0)
    }

    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Appends the points of `other`, which must carry the same variables.
    pub fn extend(&mut self, other: EffectiveStress) -> Result<()> {
        if self.variables.is_empty() {
            self.variables = other.variables;
            return Ok(());
        }
        if self.names() != other.names() {
            return Err(FatigueError::InvalidArgument(format!(
                "cannot join results with variables {:?} and {:?}",
                self.names(),
                other.names()
            )));
        }
        for (variable, part) in self.variables.iter_mut().zip(other.variables) {
            variable.values.extend(part.values);
        }
        Ok(())
    }
}

fn ratio(values: &[f64], reference: &[f64]) -> Vec<f64> {
    values.iter().zip(reference).map(|(v, r)| v / r).collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    Haigh,
    Findley { search_grid: f64 },
}

impl Default for Criterion {
    fn default() -> Self {
        Criterion::Findley {
            search_grid: DEFAULT_SEARCH_GRID,
        }
    }
}

impl Criterion {
    pub fn name(&self) -> &'static str {
        match self {
            Criterion::Haigh => "Haigh",
            Criterion::Findley { .. } => "Findley",
        }
    }

    /// Names of the variables the criterion produces for `material`.
    pub fn variables(&self, material: &Material) -> Vec<&'static str> {
        match self {
            Criterion::Haigh if material.has(Capability::UniaxialFatigueLimit) => vec!["SH", "SHI"],
            Criterion::Haigh => vec!["SH"],
            Criterion::Findley { .. } if material.has(Capability::CriticalFindleyStress) => {
                vec!["SF", "SFI"]
            }
            Criterion::Findley { .. } => vec!["SF"],
        }
    }

    /// Evaluates the criterion at every point of `history`.
    ///
    /// `steel_data` must hold one value per point of the history.
    pub fn evaluate(
        &self,
        history: &StressHistory,
        steel_data: &SteelData,
        material: &Material,
    ) -> Result<EffectiveStress> {
        if steel_data.len() != history.points() {
            return Err(FatigueError::shape("steel data", history.points(), steel_data.len()));
        }
        let mut variables = Vec::with_capacity(2);
        match self {
            Criterion::Haigh => {
                let k = material.require(Capability::MeanStressSensitivity, self.name(), steel_data)?;
                let sh = haigh(history, &k)?;
                if let Some(limit) = material.capability(Capability::UniaxialFatigueLimit, steel_data)? {
                    variables.push(Variable::new(
                        "SHI",
                        "Haigh stress over uniaxial fatigue limit",
                        ratio(&sh, &limit),
                    ));
                }
                variables.insert(0, Variable::new("SH", "Haigh effective stress", sh));
            }
            Criterion::Findley { search_grid } => {
                let k = material.require(Capability::FindleyK, self.name(), steel_data)?;
                let sf = findley(history, &k, *search_grid)?;
                if let Some(critical) = material.capability(Capability::CriticalFindleyStress, steel_data)? {
                    variables.push(Variable::new(
                        "SFI",
                        "Findley stress over critical Findley stress",
                        ratio(&sf, &critical),
                    ));
                }
                variables.insert(0, Variable::new("SF", "Findley effective stress", sf));
            }
        }
        Ok(EffectiveStress { variables })
    }
}
