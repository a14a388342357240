pub mod logger;
pub mod analyzer;

use crate::network::{RequestResult, ServerId};
use serde::{Deserialize, Serialize};

/// One periodic report, as printed every `report_interval` requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub request: u64,
    pub chosen_server: ServerId,
    pub latency: f64,
    pub avg_latency: f64,
    pub estimated_latencies: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    requests: u64,
    total_latency: f64,
    min_latency: f64,
    max_latency: f64,
    selections: Vec<u64>,
    snapshots: Vec<MetricsSnapshot>,
}

impl MetricsCollector {
    pub fn new(server_count: usize) -> Self {
        Self {
            requests: 0,
            total_latency: 0.0,
            min_latency: f64::INFINITY,
            max_latency: f64::NEG_INFINITY,
            selections: vec![0; server_count],
            snapshots: Vec::new(),
        }
    }

    pub fn record(&mut self, result: &RequestResult) {
        self.requests += 1;
        self.total_latency += result.latency;
        self.min_latency = self.min_latency.min(result.latency);
        self.max_latency = self.max_latency.max(result.latency);

        if let Some(count) = self.selections.get_mut(result.server_id) {
            *count += 1;
        }
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn total_latency(&self) -> f64 {
        self.total_latency
    }

    pub fn average_latency(&self) -> f64 {
        if self.requests > 0 {
            self.total_latency / self.requests as f64
        } else {
            0.0
        }
    }

    /// `None` until the first request is recorded.
    pub fn latency_range(&self) -> Option<(f64, f64)> {
        (self.requests > 0).then_some((self.min_latency, self.max_latency))
    }

    pub fn selections(&self) -> &[u64] {
        &self.selections
    }

    pub fn selection_share(&self) -> Vec<f64> {
        self.selections
            .iter()
            .map(|&n| {
                if self.requests > 0 {
                    n as f64 / self.requests as f64
                } else {
                    0.0
                }
            })
            .collect()
    }

    pub fn snapshot(&self, last: &RequestResult, estimated_latencies: Vec<f64>) -> MetricsSnapshot {
        MetricsSnapshot {
            request: self.requests,
            chosen_server: last.server_id,
            latency: last.latency,
            avg_latency: self.average_latency(),
            estimated_latencies,
        }
    }

    pub fn save_snapshot(&mut self, snapshot: MetricsSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn get_snapshots(&self) -> &[MetricsSnapshot] {
        &self.snapshots
    }
}
