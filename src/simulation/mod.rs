pub mod config;
pub mod sweep;

pub use config::SimConfig;
pub use sweep::sweep;

use crate::agent::SoftmaxAgent;
use crate::error::Result;
use crate::metrics::analyzer::{self, AnalysisReport};
use crate::metrics::logger::MetricsLogger;
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::network::RequestResult;
use crate::server::Server;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// What a finished run looks like from the outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub requests: u64,
    pub avg_latency: f64,
    pub selections: Vec<u64>,
    pub estimated_latencies: Vec<f64>,
    pub true_means: Vec<f64>,
}

pub struct Simulation {
    config: SimConfig,
    servers: Vec<Server>,
    agent: SoftmaxAgent,
    pub metrics: MetricsCollector,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        // Every component gets its own stream, all derived from the one seed.
        let mut master = StdRng::seed_from_u64(config.seed);

        let servers: Vec<Server> = config
            .initial_means()
            .into_iter()
            .enumerate()
            .map(|(id, mean)| Server::new(id, mean, config.latency_model, master.r#gen()))
            .collect();

        let agent = SoftmaxAgent::new(
            config.server_count,
            config.temperature,
            config.learning_rate,
            master.r#gen(),
        )?;

        Ok(Self {
            metrics: MetricsCollector::new(config.server_count),
            config,
            servers,
            agent,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn agent(&self) -> &SoftmaxAgent {
        &self.agent
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// One select -> serve -> update round.
    pub fn step(&mut self) -> RequestResult {
        let idx = self.agent.select_server();
        let result = self.servers[idx].serve_request();
        self.agent.update(result.server_id, result.latency);
        self.metrics.record(&result);

        debug!("Request #{} -> S{} ({:.2}ms)", self.metrics.requests(), idx, result.latency);

        if self.metrics.requests() % self.config.report_interval == 0 {
            let snapshot = self
                .metrics
                .snapshot(&result, self.agent.estimated_latencies());
            report(&snapshot);
            self.metrics.save_snapshot(snapshot);
        }

        result
    }

    /// Runs whatever is left of `total_requests`.
    pub fn run(&mut self) -> RunSummary {
        info!("Starting simulation: {}", self.config.name);
        info!(
            "Servers: {}, Requests: {}, Temperature: {}, Learning rate: {}",
            self.config.server_count,
            self.config.total_requests,
            self.config.temperature,
            self.config.learning_rate
        );

        let remaining = self
            .config
            .total_requests
            .saturating_sub(self.metrics.requests());

        let pb = if self.config.progress {
            let pb = ProgressBar::new(remaining);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("█▓░"));
            }
            Some(pb)
        } else {
            None
        };

        for _ in 0..remaining {
            self.step();
            if let Some(pb) = &pb {
                pb.inc(1);
                pb.set_message(format!("Avg: {:.1}ms", self.metrics.average_latency()));
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("Simulation complete");
        }

        let summary = self.summary();
        info!(
            "Finished {} requests, average latency {:.2}ms",
            summary.requests, summary.avg_latency
        );
        summary
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            requests: self.metrics.requests(),
            avg_latency: self.metrics.average_latency(),
            selections: self.metrics.selections().to_vec(),
            estimated_latencies: self.agent.estimated_latencies(),
            true_means: self.servers.iter().map(Server::mean_latency).collect(),
        }
    }

    pub fn analysis(&self) -> AnalysisReport {
        analyzer::analyze(
            &self.metrics,
            &self.config.name,
            self.config.temperature,
            &self.agent.estimated_latencies(),
        )
    }

    pub fn save_results(&self, dir: impl AsRef<Path>) -> anyhow::Result<AnalysisReport> {
        let dir = dir.as_ref();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

        std::fs::create_dir_all(dir)?;

        let csv_path = dir.join(format!("{}_{}.csv", self.config.name, timestamp));
        let mut logger = MetricsLogger::new(&csv_path)?;
        logger.log_batch(self.metrics.get_snapshots())?;
        info!("Results saved to: {}", csv_path.display());

        let report = self.analysis();

        let json_path = dir.join(format!("{}_{}_analysis.json", self.config.name, timestamp));
        std::fs::write(&json_path, serde_json::to_string_pretty(&report)?)?;
        info!("Analysis saved to: {}", json_path.display());

        Ok(report)
    }
}

fn report(snapshot: &MetricsSnapshot) {
    info!("");
    info!("--- Report (request #{}) ---", snapshot.request);
    info!("Chosen server  : S{}", snapshot.chosen_server);
    info!("Latency        : {:.1} ms", snapshot.latency);
    info!("Overall average: {:.1} ms", snapshot.avg_latency);
    info!("Estimated latencies:");
    for (i, estimate) in snapshot.estimated_latencies.iter().enumerate() {
        info!("   S{}: {:.1} ms", i, estimate);
    }
}
