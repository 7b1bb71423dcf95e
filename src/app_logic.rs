//! A module for the main application logic of the fatigue post-processor.
//!
//! Each analysis reads its configuration, reads every input file, checks that
//! the inputs describe the same points and only then starts computing.

use anyhow::{anyhow, Context, Result};
use log::info;

use crate::config::{load_config, EffectiveStressConfig, FieldSource, WeakestLinkConfig};
use crate::criteria::EffectiveStress;
use crate::element::read_elements;
use crate::evaluation::evaluate_effective_stress;
use crate::io::{check_labels, read_scalar_field, read_steel_data, write_fields, write_report};
use crate::life::{probabilistic_sn_curve, probability_table};
use crate::material::MaterialRegistry;
use crate::stress::{read_stress_field, StressField, StressHistory};
use crate::weakest_link::WeakestLinkEvaluator;

fn read_fields(sources: &[FieldSource], kind: &str) -> Result<Vec<StressField>> {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            read_stress_field(source)
                .with_context(|| format!("Failed to read {} {} from {}", kind, i + 1, source.path))
        })
        .collect()
}

/// Reads the inputs of an effective stress evaluation and evaluates it.
///
/// Returns the labels of the points together with the result.
pub fn evaluate_effective_stress_job(
    config: &EffectiveStressConfig,
    cpus: usize,
) -> Result<(Vec<u64>, EffectiveStress)> {
    let registry = MaterialRegistry::with_materials(config.materials.iter().cloned())?;
    let material = registry.get(&config.material)?;
    let criterion = config.criterion.criterion()?;

    let cyclic = read_fields(&config.cyclic_stress, "cyclic stress")?;
    let static_fields = read_fields(&config.static_stress, "static stress")?;
    let labels = cyclic
        .first()
        .map(|f| f.labels.clone())
        .ok_or_else(|| anyhow!("No cyclic stress given"))?;
    for (i, field) in cyclic.iter().enumerate().skip(1) {
        check_labels(&format!("cyclic stress {}", i + 1), &labels, &field.labels)?;
    }
    for (i, field) in static_fields.iter().enumerate() {
        check_labels(&format!("static stress {}", i + 1), &labels, &field.labels)?;
    }
    let (steel_labels, steel_data) = read_steel_data(&config.heat_treatment)
        .with_context(|| format!("Failed to read steel data from {}", config.heat_treatment.path))?;
    check_labels("steel data", &labels, &steel_labels)?;

    let history = StressHistory::assemble(&cyclic, &static_fields)?;
    let result = evaluate_effective_stress(&history, material, &criterion, &steel_data, cpus)?;
    Ok((labels, result))
}

/// Runs the effective stress evaluation described by the configuration file.
pub fn run_effective_stress(config_path: &str, cpus: usize) -> Result<()> {
    info!("Running effective stress evaluation with configuration: {}", config_path);
    let config: EffectiveStressConfig =
        load_config(config_path).with_context(|| format!("Failed to load {}", config_path))?;
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration {}: {}", config_path, e))?;

    let (labels, result) = evaluate_effective_stress_job(&config, cpus)?;
    for output in config.output.iter() {
        write_fields(output, &labels, &result)
            .with_context(|| format!("Failed to write {}", output.path))?;
    }
    Ok(())
}

/// Builds the weakest-link evaluator of the geometry and heat treatment in `config`.
///
/// The labels of the steel data give the element of every sample point.
pub fn setup_weakest_link_evaluator(
    config: &WeakestLinkConfig,
    registry: &MaterialRegistry,
) -> Result<WeakestLinkEvaluator> {
    info!("Setting up weakest-link evaluation");
    let material = registry.get(&config.material)?.clone();
    let elements = read_elements(&config.geometry, &config.geometry_parse_config)
        .with_context(|| format!("Failed to read elements from {}", config.geometry))?;
    let (labels, steel_data) = read_steel_data(&config.heat_treatment)
        .with_context(|| format!("Failed to read steel data from {}", config.heat_treatment.path))?;
    let evaluator = WeakestLinkEvaluator::new(elements, labels, steel_data, material, config.symmetry_factor)?;
    info!(
        "Weakest-link model with {} samples and volume {}",
        evaluator.element_labels().len(),
        evaluator.volume()
    );
    Ok(evaluator)
}

fn read_stress_state(source: &FieldSource, evaluator: &WeakestLinkEvaluator) -> Result<Vec<f64>> {
    let (labels, values) = read_scalar_field(&source.path, &source.parse_config, source.column, source.scale)
        .with_context(|| format!("Failed to read stress state from {}", source.path))?;
    check_labels(&source.path, evaluator.element_labels(), &labels)?;
    Ok(values)
}

/// Evaluates the failure probabilities and S-N curves of a weakest-link configuration.
///
/// Returns the report lines.
pub fn weakest_link_report(config: &WeakestLinkConfig, cpus: usize) -> Result<Vec<String>> {
    let registry = MaterialRegistry::with_materials(config.materials.iter().cloned())?;
    let evaluator = setup_weakest_link_evaluator(config, &registry)?;

    let mut lines = Vec::new();
    for case in config.probability_of_failure.iter() {
        let stress_state = read_stress_state(&case.stress, &evaluator)?;
        let probabilities = probability_table(&evaluator, &stress_state, &case.cycles)?;
        lines.push(format!("The probability of failure for the stress state in {} is", case.stress.path));
        for (cycles, pf) in case.cycles.iter().zip(probabilities.iter()) {
            lines.push(format!("\tAt {} cycles pf = {}", cycles, pf));
        }
    }

    for curve in config.sn_curves.iter() {
        info!("Reading stress states");
        let load_cases = curve
            .load_cases
            .iter()
            .map(|case| -> Result<(f64, Vec<f64>)> {
                Ok((case.load, read_stress_state(&case.stress, &evaluator)?))
            })
            .collect::<Result<Vec<_>>>()?;
        let sn_curve = probabilistic_sn_curve(&evaluator, &load_cases, &curve.pf_levels, curve.span, cpus)?;
        lines.extend(sn_curve.report_lines());
    }
    Ok(lines)
}

/// Runs the weakest-link evaluation described by the configuration file.
pub fn run_weakest_link(config_path: &str, cpus: usize) -> Result<()> {
    info!("Running weakest-link evaluation with configuration: {}", config_path);
    let config: WeakestLinkConfig =
        load_config(config_path).with_context(|| format!("Failed to load {}", config_path))?;
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration {}: {}", config_path, e))?;

    let lines = weakest_link_report(&config, cpus)?;
    for line in lines.iter() {
        info!("{}", line);
    }
    write_report(&config.output, &lines).with_context(|| format!("Failed to write {}", config.output))?;
    Ok(())
}
