//! A module for the fatigue properties of hardened steels.
//!
//! Every property is a [`Law`] of the steel data at a point, usually of the
//! Vickers hardness. Properties that only some criteria need are optional
//! capabilities; a criterion asks for them through [`Material::require`] and
//! gets a [`FatigueError::MissingCapability`] when the material lacks them.

use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Node, Value};
use hashbrown::HashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ValidationError;
use crate::error::{FatigueError, Result};
use crate::steel_data::SteelData;

/// A material property as a function of the steel data at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum Law {
    /// The same value everywhere.
    Constant { value: f64 },
    /// `intercept + slope * HV`
    Linear { intercept: f64, slope: f64 },
    /// `coefficient / HV^2`
    InverseSquare { coefficient: f64 },
    /// A formula over the steel data fields, e.g. `158.7 + 0.48 * HV - 200 * RA`.
    Expression { formula: String },
}

impl Law {
    /// Evaluates the law at every point of `steel_data`.
    pub fn evaluate(&self, steel_data: &SteelData) -> Result<Vec<f64>> {
        match self {
            Law::Constant { value } => Ok(vec![*value; steel_data.len()]),
            Law::Linear { intercept, slope } => Ok(steel_data
                .hardness()?
                .iter()
                .map(|hv| intercept + slope * hv)
                .collect()),
            Law::InverseSquare { coefficient } => Ok(steel_data
                .hardness()?
                .iter()
                .map(|hv| coefficient / (hv * hv))
                .collect()),
            Law::Expression { formula } => evaluate_formula(formula, steel_data),
        }
    }

    fn validate(&self, property: &str) -> std::result::Result<(), ValidationError> {
        match self {
            Law::Expression { formula } => {
                build_operator_tree(formula).map_err(|e| {
                    ValidationError::new(&format!(
                        "{} formula '{}' does not parse: {}",
                        property, formula, e
                    ))
                })?;
                Ok(())
            }
            Law::InverseSquare { coefficient } if !coefficient.is_finite() => Err(
                ValidationError::new(&format!("{} coefficient must be finite", property)),
            ),
            _ => Ok(()),
        }
    }
}

fn evaluate_formula(formula: &str, steel_data: &SteelData) -> Result<Vec<f64>> {
    let expression_error = |message: String| FatigueError::Expression {
        formula: formula.to_string(),
        message,
    };
    let tree: Node = build_operator_tree(formula).map_err(|e| expression_error(e.to_string()))?;
    let mut context = HashMapContext::new();
    let mut values = Vec::with_capacity(steel_data.len());
    for point in 0..steel_data.len() {
        for (name, field) in steel_data.fields() {
            context
                .set_value(name.to_string(), Value::Float(field[point]))
                .map_err(|e| expression_error(e.to_string()))?;
        }
        let value = tree
            .eval_number_with_context(&context)
            .map_err(|e| expression_error(e.to_string()))?;
        values.push(value);
    }
    Ok(values)
}

fn default_threshold() -> Law {
    Law::Constant { value: 0.0 }
}

fn default_knee_cycles() -> f64 {
    1e5
}

fn default_exponent_below_knee() -> f64 {
    5.0
}

fn default_exponent_above_knee() -> f64 {
    28.0
}

/// S-N model used by the Weibull hazard function.
///
/// `slope` and `strength` give the Weibull slope and the fatigue strength at
/// the knee. At other lives the strength is scaled by
/// `(N / knee_cycles)^(-1/b)` with `b` taken below or above the knee; the
/// slope gets the same factor when `scale_slope_with_life` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnModel {
    pub slope: Law,
    pub strength: Law,
    #[serde(default = "default_threshold")]
    pub threshold: Law,
    #[serde(default = "default_knee_cycles")]
    pub knee_cycles: f64,
    #[serde(default = "default_exponent_below_knee")]
    pub exponent_below_knee: f64,
    #[serde(default = "default_exponent_above_knee")]
    pub exponent_above_knee: f64,
    #[serde(default)]
    pub scale_slope_with_life: bool,
}

impl SnModel {
    /// Factor applied to knee values to get the value at `cycles`.
    pub fn life_factor(&self, cycles: f64) -> f64 {
        let b = if cycles < self.knee_cycles {
            self.exponent_below_knee
        } else {
            self.exponent_above_knee
        };
        (cycles / self.knee_cycles).powf(-1.0 / b)
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if !(self.knee_cycles > 0.0) {
            return Err(ValidationError::new(&format!(
                "knee_cycles must be greater than 0.0, got {}",
                self.knee_cycles
            )));
        }
        if !(self.exponent_below_knee > 0.0) {
            return Err(ValidationError::new(&format!(
                "exponent_below_knee must be greater than 0.0, got {}",
                self.exponent_below_knee
            )));
        }
        if !(self.exponent_above_knee > 0.0) {
            return Err(ValidationError::new(&format!(
                "exponent_above_knee must be greater than 0.0, got {}",
                self.exponent_above_knee
            )));
        }
        self.slope.validate("slope")?;
        self.strength.validate("strength")?;
        self.threshold.validate("threshold")?;
        Ok(())
    }
}

/// Optional material properties that specific criteria depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    MeanStressSensitivity,
    FindleyK,
    CriticalFindleyStress,
    UniaxialFatigueLimit,
}

impl Capability {
    pub fn name(&self) -> &'static str {
        match self {
            Capability::MeanStressSensitivity => "mean_stress_sensitivity",
            Capability::FindleyK => "findley_k",
            Capability::CriticalFindleyStress => "critical_findley_stress",
            Capability::UniaxialFatigueLimit => "uniaxial_fatigue_limit",
        }
    }
}

/// Fatigue properties of a steel grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Name the material is looked up by.
    pub name: String,
    /// Weibull S-N model for weakest-link evaluations.
    pub fatigue: SnModel,
    /// Mean stress sensitivity used by the Haigh criterion.
    #[serde(default)]
    pub mean_stress_sensitivity: Option<Law>,
    /// Normal stress sensitivity of the Findley criterion.
    #[serde(default)]
    pub findley_k: Option<Law>,
    /// Findley stress at the fatigue limit, used to normalise the Findley stress.
    #[serde(default)]
    pub critical_findley_stress: Option<Law>,
    /// Uniaxial fatigue limit, used to normalise the Haigh stress.
    #[serde(default)]
    pub uniaxial_fatigue_limit: Option<Law>,
}

impl Material {
    /// Case hardened SS2506 with hardness dependent properties.
    pub fn ss2506() -> Self {
        Material {
            name: "SS2506".to_string(),
            fatigue: SnModel {
                slope: Law::InverseSquare {
                    coefficient: 11.5719e6,
                },
                strength: Law::Linear {
                    intercept: 158.7,
                    slope: 0.481538,
                },
                threshold: default_threshold(),
                knee_cycles: default_knee_cycles(),
                exponent_below_knee: default_exponent_below_knee(),
                exponent_above_knee: default_exponent_above_knee(),
                scale_slope_with_life: true,
            },
            mean_stress_sensitivity: Some(Law::Linear {
                intercept: 0.0,
                slope: 1e-3,
            }),
            findley_k: Some(Law::Linear {
                intercept: 0.017,
                slope: 8.27e-4,
            }),
            critical_findley_stress: Some(Law::Linear {
                intercept: 197.75,
                slope: 0.56833,
            }),
            uniaxial_fatigue_limit: None,
        }
    }

    fn property(&self, capability: Capability) -> Option<&Law> {
        match capability {
            Capability::MeanStressSensitivity => self.mean_stress_sensitivity.as_ref(),
            Capability::FindleyK => self.findley_k.as_ref(),
            Capability::CriticalFindleyStress => self.critical_findley_stress.as_ref(),
            Capability::UniaxialFatigueLimit => self.uniaxial_fatigue_limit.as_ref(),
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.property(capability).is_some()
    }

    /// Evaluates an optional property, `None` when the material does not define it.
    pub fn capability(&self, capability: Capability, steel_data: &SteelData) -> Result<Option<Vec<f64>>> {
        self.property(capability)
            .map(|law| law.evaluate(steel_data))
            .transpose()
    }

    /// Evaluates a property that `criterion` cannot do without.
    pub fn require(
        &self,
        capability: Capability,
        criterion: &str,
        steel_data: &SteelData,
    ) -> Result<Vec<f64>> {
        self.capability(capability, steel_data)?
            .ok_or_else(|| FatigueError::MissingCapability {
                material: self.name.clone(),
                criterion: criterion.to_string(),
                capability: capability.name().to_string(),
            })
    }

    /// Fatigue threshold, stresses below it do not contribute to the hazard.
    pub fn sth(&self, steel_data: &SteelData) -> Result<Vec<f64>> {
        self.fatigue.threshold.evaluate(steel_data)
    }

    /// Weibull slope at `cycles`.
    pub fn m(&self, steel_data: &SteelData, cycles: f64) -> Result<Vec<f64>> {
        let mut m = self.fatigue.slope.evaluate(steel_data)?;
        if self.fatigue.scale_slope_with_life {
            let factor = self.fatigue.life_factor(cycles);
            m.iter_mut().for_each(|v| *v *= factor);
        }
        Ok(m)
    }

    /// Characteristic fatigue strength at `cycles`.
    pub fn sw(&self, steel_data: &SteelData, cycles: f64) -> Result<Vec<f64>> {
        let factor = self.fatigue.life_factor(cycles);
        let mut sw = self.fatigue.strength.evaluate(steel_data)?;
        sw.iter_mut().for_each(|v| *v *= factor);
        Ok(sw)
    }

    /// Validates the material definition.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let re = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").map_err(|e| ValidationError::new(&e.to_string()))?;
        if !re.is_match(&self.name) {
            return Err(ValidationError::new(&format!(
                "material name must be an identifier, got '{}'",
                self.name
            )));
        }
        self.fatigue.validate()?;
        for capability in [
            Capability::MeanStressSensitivity,
            Capability::FindleyK,
            Capability::CriticalFindleyStress,
            Capability::UniaxialFatigueLimit,
        ] {
            if let Some(law) = self.property(capability) {
                law.validate(capability.name())?;
            }
        }
        Ok(())
    }
}

/// Materials by name. Built once and only read afterwards.
#[derive(Debug, Clone)]
pub struct MaterialRegistry {
    materials: HashMap<String, Material>,
}

impl MaterialRegistry {
    /// Registry with the built-in materials only.
    pub fn builtin() -> Self {
        let mut materials = HashMap::new();
        let ss2506 = Material::ss2506();
        materials.insert(ss2506.name.clone(), ss2506);
        MaterialRegistry { materials }
    }

    /// Built-in materials plus user defined ones. Names must be unique.
    pub fn with_materials<I>(extra: I) -> std::result::Result<Self, ValidationError>
    where
        I: IntoIterator<Item = Material>,
    {
        let mut registry = Self::builtin();
        for material in extra {
            material.validate()?;
            if registry.materials.contains_key(&material.name) {
                return Err(ValidationError::new(&format!(
                    "material '{}' is defined more than once",
                    material.name
                )));
            }
            registry.materials.insert(material.name.clone(), material);
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Result<&Material> {
        self.materials
            .get(name)
            .ok_or_else(|| FatigueError::UnknownMaterial(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.materials.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ss2506_properties() {
        let material = Material::ss2506();
        let steel = SteelData::from_hardness(vec![750.0]);
        let k = material.require(Capability::FindleyK, "Findley", &steel).unwrap();
        assert_relative_eq!(k[0], 0.017 + 8.27e-4 * 750.0, epsilon = 1e-12);
        let sf = material
            .capability(Capability::CriticalFindleyStress, &steel)
            .unwrap()
            .unwrap();
        assert_relative_eq!(sf[0], 197.75 + 0.56833 * 750.0, epsilon = 1e-9);
        let k_mean = material
            .require(Capability::MeanStressSensitivity, "Haigh", &steel)
            .unwrap();
        assert_relative_eq!(k_mean[0], 0.75, epsilon = 1e-12);
        assert!(material
            .capability(Capability::UniaxialFatigueLimit, &steel)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_life_scaling() {
        let material = Material::ss2506();
        let steel = SteelData::from_hardness(vec![700.0]);
        let sw_knee = material.sw(&steel, 1e5).unwrap()[0];
        assert_relative_eq!(sw_knee, 158.7 + 0.481538 * 700.0, epsilon = 1e-9);
        let sw_long = material.sw(&steel, 2e6).unwrap()[0];
        assert_relative_eq!(sw_long, sw_knee * 20f64.powf(-1.0 / 28.0), epsilon = 1e-9);
        let sw_short = material.sw(&steel, 1e4).unwrap()[0];
        assert_relative_eq!(sw_short, sw_knee * 0.1f64.powf(-1.0 / 5.0), epsilon = 1e-9);
        let m_long = material.m(&steel, 2e6).unwrap()[0];
        assert_relative_eq!(
            m_long,
            11.5719e6 / 700.0f64.powi(2) * 20f64.powf(-1.0 / 28.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_missing_capability_names_material_and_criterion() {
        let mut material = Material::ss2506();
        material.findley_k = None;
        let steel = SteelData::from_hardness(vec![700.0]);
        let err = material
            .require(Capability::FindleyK, "Findley", &steel)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("SS2506"), "{}", message);
        assert!(message.contains("Findley"), "{}", message);
    }

    #[test]
    fn test_expression_law() {
        let steel = SteelData::new(vec![("HV", vec![700.0, 800.0]), ("RA", vec![0.1, 0.2])]).unwrap();
        let law = Law::Expression {
            formula: "100 + 0.5 * HV - 200 * RA".to_string(),
        };
        let values = law.evaluate(&steel).unwrap();
        assert_relative_eq!(values[0], 430.0, epsilon = 1e-9);
        assert_relative_eq!(values[1], 460.0, epsilon = 1e-9);

        let bad = Law::Expression {
            formula: "HV + missing".to_string(),
        };
        assert!(matches!(bad.evaluate(&steel), Err(FatigueError::Expression { .. })));
    }

    #[test]
    fn test_material_from_yaml() {
        let yaml = r#"
name: Custom
fatigue:
  slope: { law: constant, value: 10.0 }
  strength: { law: linear, intercept: 100.0, slope: 0.5 }
findley_k: { law: expression, formula: "0.001 * HV" }
"#;
        let material: Material = serde_yaml::from_str(yaml).unwrap();
        assert!(material.validate().is_ok());
        assert_eq!(material.fatigue.threshold, Law::Constant { value: 0.0 });
        assert_relative_eq!(material.fatigue.knee_cycles, 1e5);
        assert!(!material.fatigue.scale_slope_with_life);
        assert!(material.has(Capability::FindleyK));
        assert!(!material.has(Capability::MeanStressSensitivity));
    }

    #[test]
    fn test_registry() {
        let registry = MaterialRegistry::builtin();
        assert_eq!(registry.get("SS2506").unwrap().name, "SS2506");
        assert!(matches!(
            registry.get("SS0000"),
            Err(FatigueError::UnknownMaterial(_))
        ));
        assert!(MaterialRegistry::with_materials(vec![Material::ss2506()]).is_err());
        let mut renamed = Material::ss2506();
        renamed.name = "bad name".to_string();
        assert!(MaterialRegistry::with_materials(vec![renamed]).is_err());
    }
}
