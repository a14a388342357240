use super::MetricsCollector;
use crate::network::ServerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub name: String,
    pub temperature: f64,
    pub requests: u64,
    pub avg_latency: f64,
    pub min_latency: f64,
    pub max_latency: f64,
    pub selection_share: Vec<f64>,
    pub final_estimates: Vec<f64>,
    /// Server with the lowest final estimated latency.
    pub best_server: ServerId,
}

pub fn analyze(
    metrics: &MetricsCollector,
    name: &str,
    temperature: f64,
    final_estimates: &[f64],
) -> AnalysisReport {
    let (min_latency, max_latency) = metrics.latency_range().unwrap_or((0.0, 0.0));

    AnalysisReport {
        name: name.to_string(),
        temperature,
        requests: metrics.requests(),
        avg_latency: metrics.average_latency(),
        min_latency,
        max_latency,
        selection_share: metrics.selection_share(),
        final_estimates: final_estimates.to_vec(),
        best_server: argmin(final_estimates),
    }
}

fn argmin(values: &[f64]) -> ServerId {
    values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn mean_columns(rows: impl Iterator<Item = Vec<f64>>, n: f64) -> Vec<f64> {
    let mut acc: Vec<f64> = Vec::new();
    for row in rows {
        if acc.len() < row.len() {
            acc.resize(row.len(), 0.0);
        }
        for (sum, v) in acc.iter_mut().zip(row) {
            *sum += v;
        }
    }
    acc.into_iter().map(|sum| sum / n).collect()
}

/// Collapse repeated runs of one configuration into a single report.
/// Returns `None` for an empty slice.
pub fn average_reports(reports: &[AnalysisReport]) -> Option<AnalysisReport> {
    let first = reports.first()?;
    let n = reports.len() as f64;

    let final_estimates = mean_columns(reports.iter().map(|r| r.final_estimates.clone()), n);
    let best_server = argmin(&final_estimates);

    Some(AnalysisReport {
        name: first.name.clone(),
        temperature: first.temperature,
        requests: reports.iter().map(|r| r.requests).sum::<u64>() / reports.len() as u64,
        avg_latency: reports.iter().map(|r| r.avg_latency).sum::<f64>() / n,
        min_latency: reports.iter().map(|r| r.min_latency).fold(f64::INFINITY, f64::min),
        max_latency: reports.iter().map(|r| r.max_latency).fold(f64::NEG_INFINITY, f64::max),
        selection_share: mean_columns(reports.iter().map(|r| r.selection_share.clone()), n),
        final_estimates,
        best_server,
    })
}

pub fn comparison_table(reports: &[AnalysisReport]) {
    println!("\n╔═══════════════════════════════════════════════════════════════════════════╗");
    println!("║                         TEMPERATURE COMPARISON                            ║");
    println!("╠════════════════╦═════════════╦═══════════╦═══════════╦═══════════╦════════╣");
    println!("║ Run            ║ Temperature ║ Avg (ms)  ║ Min (ms)  ║ Max (ms)  ║ Best   ║");
    println!("╠════════════════╬═════════════╬═══════════╬═══════════╬═══════════╬════════╣");

    for report in reports {
        let share = report
            .selection_share
            .get(report.best_server)
            .copied()
            .unwrap_or(0.0);
        println!(
            "║ {:<14} ║ {:>11.2} ║ {:>9.2} ║ {:>9.2} ║ {:>9.2} ║ S{:<2}{:>3.0}% ║",
            report.name,
            report.temperature,
            report.avg_latency,
            report.min_latency,
            report.max_latency,
            report.best_server,
            share * 100.0,
        );
    }

    println!("╚════════════════╩═════════════╩═══════════╩═══════════╩═══════════╩════════╝\n");

    if let Some(best) = reports
        .iter()
        .min_by(|a, b| a.avg_latency.total_cmp(&b.avg_latency))
    {
        println!(
            "Lowest Latency: {} (T = {:.2}, {:.2} ms)",
            best.name, best.temperature, best.avg_latency
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::RequestResult;

    fn report(avg: f64, estimates: Vec<f64>) -> AnalysisReport {
        AnalysisReport {
            name: "t15".to_string(),
            temperature: 15.0,
            requests: 100,
            avg_latency: avg,
            min_latency: avg - 10.0,
            max_latency: avg + 10.0,
            selection_share: vec![0.5, 0.5],
            final_estimates: estimates,
            best_server: 0,
        }
    }

    #[test]
    fn analyze_picks_lowest_estimate() {
        let mut metrics = MetricsCollector::new(3);
        metrics.record(&RequestResult::new(1, 30.0));
        metrics.record(&RequestResult::new(1, 50.0));

        let r = analyze(&metrics, "run", 15.0, &[70.0, 40.0, 90.0]);
        assert_eq!(r.best_server, 1);
        assert_eq!(r.avg_latency, 40.0);
        assert_eq!((r.min_latency, r.max_latency), (30.0, 50.0));
        assert_eq!(r.selection_share, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn analyze_empty_run() {
        let metrics = MetricsCollector::new(2);
        let r = analyze(&metrics, "empty", 1.0, &[0.0, 0.0]);
        assert_eq!(r.requests, 0);
        assert_eq!(r.min_latency, 0.0);
    }

    #[test]
    fn averaging_reports() {
        let merged = average_reports(&[
            report(40.0, vec![60.0, 50.0]),
            report(60.0, vec![40.0, 70.0]),
        ])
        .unwrap();

        assert_eq!(merged.avg_latency, 50.0);
        assert_eq!(merged.min_latency, 30.0);
        assert_eq!(merged.max_latency, 70.0);
        assert_eq!(merged.final_estimates, vec![50.0, 60.0]);
        assert_eq!(merged.best_server, 0);
    }

    #[test]
    fn averaging_nothing() {
        assert!(average_reports(&[]).is_none());
    }
}
