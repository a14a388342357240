// Same scenario, several temperatures, a few seeds each. Runs share nothing,
// so they go through rayon.

use super::{SimConfig, Simulation};
use crate::error::Result;
use crate::metrics::analyzer::{self, AnalysisReport};
use rayon::prelude::*;
use tracing::info;

/// One averaged report per temperature, in the order given.
pub fn sweep(base: &SimConfig, temperatures: &[f64], repetitions: u32) -> Result<Vec<AnalysisReport>> {
    let repetitions = repetitions.max(1) as usize;

    let configs: Vec<SimConfig> = temperatures
        .iter()
        .flat_map(|&t| {
            (0..repetitions).map(move |rep| {
                base.clone()
                    .with_name(format!("T{}", t))
                    .with_temperature(t)
                    .with_seed(base.seed.wrapping_add(rep as u64))
                    .with_progress(false)
            })
        })
        .collect();

    // Fail on the first bad temperature before spending time on any runs.
    for config in &configs {
        config.validate()?;
    }

    info!(
        "Sweeping {} temperatures x {} repetitions ({} runs)",
        temperatures.len(),
        repetitions,
        configs.len()
    );

    let reports: Vec<AnalysisReport> = configs
        .into_par_iter()
        .map(|config| -> Result<AnalysisReport> {
            let mut sim = Simulation::new(config)?;
            sim.run();
            Ok(sim.analysis())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(reports
        .chunks(repetitions)
        .filter_map(analyzer::average_reports)
        .collect())
}
