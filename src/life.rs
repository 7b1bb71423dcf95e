//! Cycles to failure at a given probability of failure.

use std::fmt;

use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::{FatigueError, Result};
use crate::weakest_link::FailureProbability;

/// Width of the final bracket in ln(cycles).
pub const LOG_CYCLES_TOLERANCE: f64 = 1e-3;

fn check_span(span: [f64; 2]) -> Result<()> {
    let [low, high] = span;
    if !(low > 0.0 && high > low && high.is_finite()) {
        return Err(FatigueError::InvalidArgument(format!(
            "cycle span must satisfy 0 < low < high, got [{}, {}]",
            low, high
        )));
    }
    Ok(())
}

/// Number of cycles at which the probability of failure of `stress_state` reaches `pf`.
///
/// Bisection on ln(cycles) within `span`, assuming the probability of failure
/// grows with the number of cycles. Fails with
/// [`FatigueError::RootNotBracketed`] when `pf` is not reached within `span`.
pub fn calculate_life<E>(stress_state: &[f64], evaluator: &E, pf: f64, span: [f64; 2]) -> Result<f64>
where
    E: FailureProbability + ?Sized,
{
    if !(pf > 0.0 && pf < 1.0) {
        return Err(FatigueError::InvalidArgument(format!(
            "probability of failure must be between 0 and 1, got {}",
            pf
        )));
    }
    check_span(span)?;
    let residual = |log_cycles: f64| -> Result<f64> {
        Ok(evaluator.probability_of_failure(stress_state, log_cycles.exp())? - pf)
    };

    let mut low = span[0].ln();
    let mut high = span[1].ln();
    let mut f_low = residual(low)?;
    let f_high = residual(high)?;
    if f_low * f_high > 0.0 {
        return Err(FatigueError::RootNotBracketed {
            low: span[0],
            high: span[1],
        });
    }

    let mut mid = (low + high) / 2.0;
    while high - low > LOG_CYCLES_TOLERANCE {
        let f_mid = residual(mid)?;
        if f_mid == 0.0 {
            break;
        }
        if f_low * f_mid < 0.0 {
            high = mid;
        } else {
            low = mid;
            f_low = f_mid;
        }
        mid = (low + high) / 2.0;
    }
    Ok(mid.exp())
}

/// Probability of failure of `stress_state` at each of `cycles`.
pub fn probability_table<E>(evaluator: &E, stress_state: &[f64], cycles: &[f64]) -> Result<Vec<f64>>
where
    E: FailureProbability + ?Sized,
{
    cycles
        .iter()
        .map(|n| evaluator.probability_of_failure(stress_state, *n))
        .collect()
}

/// Lives of a set of load levels at a set of failure probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct SnCurve {
    pub pf_levels: Vec<f64>,
    /// Load and the lives at every level of `pf_levels`, per load case.
    pub rows: Vec<(f64, Vec<f64>)>,
}

fn percent(pf: f64) -> f64 {
    (pf * 100.0 * 1e6).round() / 1e6
}

impl SnCurve {
    /// Report lines: a title, a header and one line per load case with whole cycles.
    ///
    /// Header percentages are rounded to six decimals, so a level of 0.999
    /// reads `99.9 %`. Lives are truncated to whole cycles.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec!["Probabilistic SN-curve".to_string()];
        let mut header = vec!["Load".to_string()];
        header.extend(self.pf_levels.iter().map(|pf| format!("N at pf = {} %", percent(*pf))));
        lines.push(header.join(", "));
        for (load, lives) in self.rows.iter() {
            let mut line = vec![load.to_string()];
            line.extend(lives.iter().map(|n| format!("{}", n.trunc() as u64)));
            lines.push(line.join(", "));
        }
        lines
    }
}

impl fmt::Display for SnCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report_lines().join("\n"))
    }
}

/// Probabilistic S-N curve of `load_cases`, pairs of a load and its stress state.
///
/// Every load case and failure probability is solved independently on a pool
/// of `cpus` threads.
pub fn probabilistic_sn_curve<E>(
    evaluator: &E,
    load_cases: &[(f64, Vec<f64>)],
    pf_levels: &[f64],
    span: [f64; 2],
    cpus: usize,
) -> Result<SnCurve>
where
    E: FailureProbability + Sync + ?Sized,
{
    if cpus == 0 {
        return Err(FatigueError::InvalidArgument("cpus must be at least 1".to_string()));
    }
    check_span(span)?;
    let jobs: Vec<(usize, f64)> = (0..load_cases.len())
        .flat_map(|case| pf_levels.iter().map(move |pf| (case, *pf)))
        .collect();
    info!(
        "Evaluating SN-curve with {} load cases at {} failure probabilities",
        load_cases.len(),
        pf_levels.len()
    );

    let pool = ThreadPoolBuilder::new().num_threads(cpus.min(jobs.len().max(1))).build()?;
    let lives: Vec<Result<f64>> = pool.install(|| {
        jobs.par_iter()
            .map(|(case, pf)| -> Result<f64> {
                let (load, stress_state) = &load_cases[*case];
                let life = calculate_life(stress_state, evaluator, *pf, span)?;
                debug!("Load {}: N = {} at pf = {}", load, life, pf);
                Ok(life)
            })
            .collect()
    });
    let lives = lives.into_iter().collect::<Result<Vec<f64>>>()?;

    let rows = load_cases
        .iter()
        .zip(lives.chunks(pf_levels.len().max(1)))
        .map(|((load, _), lives)| (*load, lives.to_vec()))
        .collect();
    Ok(SnCurve {
        pf_levels: pf_levels.to_vec(),
        rows,
    })
}
