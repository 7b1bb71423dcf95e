//! A module for validating and managing the configurations of fatigue evaluations.
//!
//! Two documents exist, one per analysis: [`EffectiveStressConfig`] and
//! [`WeakestLinkConfig`]. Both are read from YAML, or from TOML when the file
//! name ends in `.toml`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::criteria::Criterion;
use crate::material::Material;

/// Represents an error that can occur during validation of configuration data.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a given message.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error.
    pub fn new(message: &str) -> ValidationError {
        ValidationError {
            message: message.to_owned(),
        }
    }
}

fn non_empty(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(&format!("{} must not be empty", name)));
    }
    Ok(())
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_scale() -> f64 {
    1.0
}

/// How to read a delimited field file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ParseConfig {
    /// Number of leading lines to skip.
    #[serde(default)]
    pub header: usize,
    /// Column delimiter, only the first character is used.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            header: 0,
            delimiter: default_delimiter(),
        }
    }
}

impl ParseConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.delimiter.is_empty() {
            return Err(ValidationError::new("delimiter must not be empty"));
        }
        Ok(())
    }
}

/// A field file and the factor its values are multiplied with.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FieldSource {
    pub path: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Value column of scalar fields, counted after the label column.
    #[serde(default)]
    pub column: usize,
    #[serde(default)]
    pub parse_config: ParseConfig,
}

impl FieldSource {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_empty("path", &self.path)?;
        if !self.scale.is_finite() {
            return Err(ValidationError::new(&format!(
                "scale must be a finite number, got {}",
                self.scale
            )));
        }
        self.parse_config.validate()?;
        Ok(())
    }
}

/// A steel data file, `label,HV,...` with a header row.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SteelSource {
    pub path: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl SteelSource {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_empty("heat_treatment path", &self.path)?;
        non_empty("heat_treatment delimiter", &self.delimiter)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    Csv,
    Json,
}

/// Destination of derived fields.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Output {
    pub path: String,
    pub format: OutputFormat,
}

/// Represents the criterion used for evaluating the effective stress.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StressCriteria {
    /// The criterion. Valid methods are "HAIGH" and "FINDLEY".
    pub method: String,
    /// Angle increment of the Findley critical plane search in degrees, 10 if omitted.
    pub search_grid: Option<f64>,
}

impl StressCriteria {
    /// Validates the `StressCriteria` to ensure the method and its associated parameters are correctly defined.
    ///
    /// # Examples
    ///
    /// ```
    /// use steel_fatigue::config::StressCriteria;
    ///
    /// let haigh = StressCriteria { method: String::from("HAIGH"), search_grid: None };
    /// assert!(haigh.validate().is_ok());
    ///
    /// let findley = StressCriteria { method: String::from("FINDLEY"), search_grid: Some(0.0) };
    /// assert!(findley.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.method.as_str() {
            "HAIGH" | "FINDLEY" => Ok(()),
            _ => Err(ValidationError::new(&format!(
                "method must be HAIGH or FINDLEY, got {}",
                self.method
            ))),
        }?;
        if let Some(grid) = self.search_grid {
            if !(grid > 0.0 && grid <= 180.0) {
                return Err(ValidationError::new(&format!(
                    "search_grid must be in (0, 180], got {}",
                    grid
                )));
            }
        }
        Ok(())
    }

    pub fn criterion(&self) -> Result<Criterion, ValidationError> {
        self.validate()?;
        match self.method.as_str() {
            "FINDLEY" => Ok(Criterion::Findley {
                search_grid: self.search_grid.unwrap_or(10.0),
            }),
            _ => Ok(Criterion::Haigh),
        }
    }
}

/// Configuration of an effective stress evaluation.
#[derive(Debug, Clone, Deserialize)]
pub struct EffectiveStressConfig {
    pub criterion: StressCriteria,
    /// Name of the material in the registry.
    pub material: String,
    /// Material definitions added to the built-in ones.
    #[serde(default)]
    pub materials: Vec<Material>,
    /// One load step per cyclic stress field.
    pub cyclic_stress: Vec<FieldSource>,
    /// Stress fields added to every load step, e.g. residual stresses.
    #[serde(default)]
    pub static_stress: Vec<FieldSource>,
    pub heat_treatment: SteelSource,
    pub output: Vec<Output>,
}

impl EffectiveStressConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.criterion.validate()?;
        non_empty("material", &self.material)?;
        for material in self.materials.iter() {
            material.validate()?;
        }
        if self.cyclic_stress.is_empty() {
            return Err(ValidationError::new("cyclic_stress must not be empty"));
        }
        for source in self.cyclic_stress.iter().chain(self.static_stress.iter()) {
            source.validate()?;
        }
        self.heat_treatment.validate()?;
        if self.output.is_empty() {
            return Err(ValidationError::new("output must not be empty"));
        }
        for output in self.output.iter() {
            non_empty("output path", &output.path)?;
        }
        Ok(())
    }
}

/// Probabilities of failure of one stress state at a list of cycle counts.
#[derive(Debug, Clone, Deserialize)]
pub struct FailureProbabilityCase {
    pub stress: FieldSource,
    pub cycles: Vec<f64>,
}

impl FailureProbabilityCase {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.stress.validate()?;
        if self.cycles.is_empty() {
            return Err(ValidationError::new("cycles must not be empty"));
        }
        if let Some(n) = self.cycles.iter().find(|n| !(**n > 0.0)) {
            return Err(ValidationError::new(&format!(
                "cycles must be greater than 0, got {}",
                n
            )));
        }
        Ok(())
    }
}

/// A load level of a probabilistic S-N curve and its stress state.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadCase {
    pub load: f64,
    pub stress: FieldSource,
}

/// A probabilistic S-N curve: lives at given failure probabilities for each load case.
#[derive(Debug, Clone, Deserialize)]
pub struct SnCurveConfig {
    pub pf_levels: Vec<f64>,
    /// Bracket `[low, high]` of the cycles to failure.
    pub span: [f64; 2],
    pub load_cases: Vec<LoadCase>,
}

impl SnCurveConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pf_levels.is_empty() {
            return Err(ValidationError::new("pf_levels must not be empty"));
        }
        if let Some(pf) = self.pf_levels.iter().find(|pf| !(**pf > 0.0 && **pf < 1.0)) {
            return Err(ValidationError::new(&format!(
                "pf_levels must be between 0.0 and 1.0, got {}",
                pf
            )));
        }
        let [low, high] = self.span;
        if !(low > 0.0 && high > low) {
            return Err(ValidationError::new(&format!(
                "span must satisfy 0 < low < high, got [{}, {}]",
                low, high
            )));
        }
        if self.load_cases.is_empty() {
            return Err(ValidationError::new("load_cases must not be empty"));
        }
        for load_case in self.load_cases.iter() {
            load_case.stress.validate()?;
        }
        Ok(())
    }
}

/// Configuration of a weakest-link evaluation.
#[derive(Debug, Clone, Deserialize)]
pub struct WeakestLinkConfig {
    pub material: String,
    #[serde(default)]
    pub materials: Vec<Material>,
    /// Element file, `label type x1 y1 z1 ... x8 y8 z8` per row.
    pub geometry: String,
    #[serde(default)]
    pub geometry_parse_config: ParseConfig,
    pub heat_treatment: SteelSource,
    /// Number of identical copies of the modelled part in the full component.
    pub symmetry_factor: f64,
    #[serde(default)]
    pub probability_of_failure: Vec<FailureProbabilityCase>,
    #[serde(default)]
    pub sn_curves: Vec<SnCurveConfig>,
    /// Report file.
    pub output: String,
}

impl WeakestLinkConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_empty("material", &self.material)?;
        for material in self.materials.iter() {
            material.validate()?;
        }
        non_empty("geometry", &self.geometry)?;
        self.geometry_parse_config.validate()?;
        self.heat_treatment.validate()?;
        if !(self.symmetry_factor > 0.0 && self.symmetry_factor.is_finite()) {
            return Err(ValidationError::new(&format!(
                "symmetry_factor must be greater than 0.0, got {}",
                self.symmetry_factor
            )));
        }
        if self.probability_of_failure.is_empty() && self.sn_curves.is_empty() {
            return Err(ValidationError::new(
                "at least one of probability_of_failure and sn_curves must be given",
            ));
        }
        for case in self.probability_of_failure.iter() {
            case.validate()?;
        }
        for curve in self.sn_curves.iter() {
            curve.validate()?;
        }
        non_empty("output", &self.output)?;
        Ok(())
    }
}

/// Loads a configuration from a YAML file, or a TOML file when the extension is `.toml`.
///
/// # Errors
///
/// This function will return an error if reading or parsing the configuration file fails.
pub fn load_config<T, P>(config_path: P) -> crate::error::Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = config_path.as_ref();
    let content = fs::read_to_string(path)?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    Ok(config)
}
