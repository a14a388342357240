use crate::error::{ConfigError, Result};
use crate::server::LatencyModel;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    pub server_count: usize,
    pub total_requests: u64,
    pub initial_latency_base: f64,
    pub initial_latency_step: f64,
    pub temperature: f64,
    pub learning_rate: f64,
    pub report_interval: u64,
    pub seed: u64,
    pub latency_model: LatencyModel,
    #[serde(skip)]
    pub progress: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "softmax_lb".to_string(),
            server_count: 5,
            total_requests: 2000,
            initial_latency_base: 60.0,
            initial_latency_step: 20.0,
            temperature: 15.0,
            learning_rate: 0.1,
            report_interval: 200,
            seed: 42,
            latency_model: LatencyModel::default(),
            progress: false,
        }
    }
}

impl SimConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_count == 0 {
            return Err(ConfigError::NoServers);
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.report_interval == 0 {
            return Err(ConfigError::InvalidReportInterval);
        }
        self.latency_model.validate()
    }

    /// Server `i` starts at `base + i * step`.
    pub fn initial_means(&self) -> Vec<f64> {
        (0..self.server_count)
            .map(|i| self.initial_latency_base + i as f64 * self.initial_latency_step)
            .collect()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_servers(mut self, count: usize) -> Self {
        self.server_count = count;
        self
    }

    pub fn with_requests(mut self, total: u64) -> Self {
        self.total_requests = total;
        self
    }

    pub fn with_initial_latency(mut self, base: f64, step: f64) -> Self {
        self.initial_latency_base = base;
        self.initial_latency_step = step;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_report_interval(mut self, interval: u64) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_latency_model(mut self, model: LatencyModel) -> Self {
        self.latency_model = model;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}
