// Simulated backend. No sockets here, a server is just a latency generator
// whose mean wanders a little every time it gets used.

use crate::error::{ConfigError, Result};
use crate::network::{RequestResult, ServerId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyModel {
    /// Std-dev of the per-request noise around the current mean.
    pub noise_std: f64,
    /// Std-dev of the random walk applied to the mean after each request.
    pub drift_std: f64,
    /// Lower bound on any observed latency.
    pub floor: f64,
}

impl Default for LatencyModel {
    fn default() -> Self {
        Self {
            noise_std: 5.0,
            drift_std: 2.0,
            floor: 10.0,
        }
    }
}

impl LatencyModel {
    pub fn without_drift(mut self) -> Self {
        self.drift_std = 0.0;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(ConfigError::InvalidLatencyModel(format!(
                "noise_std must be finite and >= 0, got {}",
                self.noise_std
            )));
        }
        if !self.drift_std.is_finite() || self.drift_std < 0.0 {
            return Err(ConfigError::InvalidLatencyModel(format!(
                "drift_std must be finite and >= 0, got {}",
                self.drift_std
            )));
        }
        if !self.floor.is_finite() {
            return Err(ConfigError::InvalidLatencyModel(format!(
                "floor must be finite, got {}",
                self.floor
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Server {
    id: ServerId,
    mean_latency: f64,
    model: LatencyModel,
    rng: StdRng,
}

impl Server {
    pub fn new(id: ServerId, start_latency: f64, model: LatencyModel, seed: u64) -> Self {
        Self {
            id,
            mean_latency: start_latency,
            model,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    pub fn mean_latency(&self) -> f64 {
        self.mean_latency
    }

    pub fn serve_request(&mut self) -> RequestResult {
        let noise: f64 = self.rng.sample::<f64, _>(StandardNormal) * self.model.noise_std;
        let latency = (self.mean_latency + noise).max(self.model.floor);

        // Drift only moves the baseline for the *next* request.
        let drift: f64 = self.rng.sample::<f64, _>(StandardNormal) * self.model.drift_std;
        self.mean_latency += drift;

        trace!(
            "Server {} served in {:.2}ms, mean now {:.2}ms",
            self.id, latency, self.mean_latency
        );

        RequestResult::new(self.id, latency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_never_below_floor() {
        let mut server = Server::new(0, -500.0, LatencyModel::default(), 7);
        for _ in 0..5_000 {
            let result = server.serve_request();
            assert!(result.latency >= 10.0, "latency {} under floor", result.latency);
        }
    }

    #[test]
    fn same_seed_same_samples() {
        let mut a = Server::new(3, 80.0, LatencyModel::default(), 99);
        let mut b = Server::new(3, 80.0, LatencyModel::default(), 99);
        for _ in 0..100 {
            assert_eq!(a.serve_request(), b.serve_request());
        }
        assert_eq!(a.mean_latency(), b.mean_latency());
    }

    #[test]
    fn result_carries_server_id() {
        let mut server = Server::new(4, 60.0, LatencyModel::default(), 1);
        assert_eq!(server.serve_request().server_id, 4);
    }

    #[test]
    fn no_drift_keeps_mean_fixed() {
        let mut server = Server::new(0, 60.0, LatencyModel::default().without_drift(), 5);
        for _ in 0..50 {
            server.serve_request();
        }
        assert_eq!(server.mean_latency(), 60.0);
    }

    #[test]
    fn drift_applies_after_sampling() {
        // No noise: the first sample must sit exactly on the starting mean.
        let model = LatencyModel { noise_std: 0.0, drift_std: 2.0, floor: 10.0 };
        let mut server = Server::new(0, 60.0, model, 11);
        let first = server.serve_request();
        assert_eq!(first.latency, 60.0);
        let moved = server.mean_latency();
        let second = server.serve_request();
        assert_eq!(second.latency, moved.max(10.0));
    }

    #[test]
    fn rejects_bad_model() {
        let model = LatencyModel { noise_std: -1.0, ..Default::default() };
        assert!(matches!(model.validate(), Err(ConfigError::InvalidLatencyModel(_))));
        let model = LatencyModel { floor: f64::NAN, ..Default::default() };
        assert!(model.validate().is_err());
        assert!(LatencyModel::default().validate().is_ok());
    }
}
