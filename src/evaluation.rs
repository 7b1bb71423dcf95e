//! Parallel evaluation of effective stresses.
//!
//! The points are split into contiguous chunks, each chunk is evaluated on
//! its own slice of the stress history and the steel data, and the chunk
//! results are joined in order.

use std::ops::Range;

use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::criteria::{Criterion, EffectiveStress};
use crate::error::{FatigueError, Result};
use crate::material::Material;
use crate::steel_data::SteelData;
use crate::stress::StressHistory;

/// Splits `0..len` into `parts` contiguous ranges whose sizes differ by at most one,
/// the larger ones first.
pub fn chunk_ranges(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let base = len / parts;
    let extra = len % parts;
    let mut start = 0;
    (0..parts)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

fn evaluate_chunk(
    history: &StressHistory,
    material: &Material,
    criterion: &Criterion,
    steel_data: &SteelData,
    range: Range<usize>,
) -> Result<EffectiveStress> {
    debug!("Evaluating points {:?}", range);
    let history = history.slice_points(range.clone())?;
    let steel_data = steel_data.slice(range)?;
    criterion.evaluate(&history, &steel_data, material)
}

/// Effective stress of every point of `history` using `cpus` threads.
///
/// The result does not depend on `cpus`.
pub fn evaluate_effective_stress(
    history: &StressHistory,
    material: &Material,
    criterion: &Criterion,
    steel_data: &SteelData,
    cpus: usize,
) -> Result<EffectiveStress> {
    if steel_data.len() != history.points() {
        return Err(FatigueError::shape("steel data", history.points(), steel_data.len()));
    }
    if cpus == 0 {
        return Err(FatigueError::InvalidArgument("cpus must be at least 1".to_string()));
    }
    info!(
        "Evaluating {} criterion at {} points over {} load steps using {} cpus",
        criterion.name(),
        history.points(),
        history.load_steps(),
        cpus
    );

    let chunks: Vec<Range<usize>> = chunk_ranges(history.points(), cpus)
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect();
    if chunks.len() <= 1 {
        return criterion.evaluate(history, steel_data, material);
    }

    let pool = ThreadPoolBuilder::new().num_threads(cpus).build()?;
    let parts: Vec<Result<EffectiveStress>> = pool.install(|| {
        chunks
            .into_par_iter()
            .map(|range| evaluate_chunk(history, material, criterion, steel_data, range))
            .collect()
    });

    let mut result = EffectiveStress::default();
    for part in parts {
        result.extend(part?)?;
    }
    Ok(result)
}
