//! Softmax bandit that decides which server gets the next request.
//!
//! Each server has a value estimate (the negated latency it is expected to
//! deliver). Selection samples from `softmax(values / temperature)`, learning is
//! an exponential moving average toward the latest reward.

use crate::error::{ConfigError, Result};
use crate::network::ServerId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SoftmaxAgent {
    values: Vec<f64>,
    temperature: f64,
    learning_rate: f64,
    rng: StdRng,
}

impl SoftmaxAgent {
    /// `k` servers, `temperature > 0`, `learning_rate` in `(0, 1]`.
    pub fn new(k: usize, temperature: f64, learning_rate: f64, seed: u64) -> Result<Self> {
        if k == 0 {
            return Err(ConfigError::NoServers);
        }
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(ConfigError::InvalidTemperature(temperature));
        }
        // NaN fails both comparisons, so spell the range out positively
        if !(learning_rate > 0.0 && learning_rate <= 1.0) {
            return Err(ConfigError::InvalidLearningRate(learning_rate));
        }

        debug!(
            "Softmax agent: {} servers, temperature {}, learning rate {}",
            k, temperature, learning_rate
        );

        Ok(Self {
            values: vec![0.0; k],
            temperature,
            learning_rate,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Overwrite the estimates. Mostly useful for tests and warm starts.
    pub fn with_values(mut self, values: &[f64]) -> Self {
        let n = self.values.len().min(values.len());
        self.values[..n].copy_from_slice(&values[..n]);
        self
    }

    pub fn k(&self) -> usize {
        self.values.len()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Values flipped back into latency units.
    pub fn estimated_latencies(&self) -> Vec<f64> {
        self.values.iter().map(|v| -v).collect()
    }

    // Shifted by the max so the largest weight is exactly 1.0, exp() can't overflow.
    fn weights(&self) -> Vec<f64> {
        let max_v = self
            .values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        self.values
            .iter()
            .map(|v| ((v - max_v) / self.temperature).exp())
            .collect()
    }

    /// The distribution the next `select_server` call samples from.
    pub fn probabilities(&self) -> Vec<f64> {
        let weights = self.weights();
        let total: f64 = weights.iter().sum();
        weights.into_iter().map(|w| w / total).collect()
    }

    pub fn select_server(&mut self) -> ServerId {
        let weights = self.weights();
        let total: f64 = weights.iter().sum();
        let r = self.rng.r#gen::<f64>() * total;

        let mut cumulative = 0.0;
        for (i, w) in weights.iter().enumerate() {
            cumulative += w;
            if cumulative >= r {
                return i;
            }
        }

        // Rounding can leave the running sum a hair short of r
        weights.len() - 1
    }

    pub fn update(&mut self, index: ServerId, latency: f64) {
        let Some(value) = self.values.get_mut(index) else {
            warn!("Ignoring update for unknown server {} (k = {})", index, self.values.len());
            return;
        };

        let reward = -latency;
        *value += self.learning_rate * (reward - *value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(k: usize, temperature: f64) -> SoftmaxAgent {
        SoftmaxAgent::new(k, temperature, 0.1, 42).unwrap()
    }

    fn counts(agent: &mut SoftmaxAgent, draws: usize) -> Vec<usize> {
        let mut counts = vec![0; agent.k()];
        for _ in 0..draws {
            counts[agent.select_server()] += 1;
        }
        counts
    }

    #[test]
    fn starts_at_zero() {
        let a = agent(4, 15.0);
        assert_eq!(a.values(), &[0.0; 4]);
        assert_eq!(a.estimated_latencies().len(), 4);
    }

    #[test]
    fn rejects_invalid_construction() {
        assert_eq!(SoftmaxAgent::new(0, 1.0, 0.1, 0).unwrap_err(), ConfigError::NoServers);
        assert!(matches!(
            SoftmaxAgent::new(2, 0.0, 0.1, 0),
            Err(ConfigError::InvalidTemperature(_))
        ));
        assert!(matches!(
            SoftmaxAgent::new(2, -3.0, 0.1, 0),
            Err(ConfigError::InvalidTemperature(_))
        ));
        assert!(matches!(
            SoftmaxAgent::new(2, f64::INFINITY, 0.1, 0),
            Err(ConfigError::InvalidTemperature(_))
        ));
        assert!(matches!(
            SoftmaxAgent::new(2, 1.0, 0.0, 0),
            Err(ConfigError::InvalidLearningRate(_))
        ));
        assert!(matches!(
            SoftmaxAgent::new(2, 1.0, 1.5, 0),
            Err(ConfigError::InvalidLearningRate(_))
        ));
        assert!(matches!(
            SoftmaxAgent::new(2, 1.0, f64::NAN, 0),
            Err(ConfigError::InvalidLearningRate(_))
        ));
        assert!(SoftmaxAgent::new(1, 1.0, 1.0, 0).is_ok());
    }

    #[test]
    fn single_server_always_chosen() {
        let mut a = agent(1, 15.0);
        for _ in 0..100 {
            assert_eq!(a.select_server(), 0);
        }
    }

    #[test]
    fn huge_magnitudes_stay_finite() {
        let mut a = agent(2, 15.0).with_values(&[1e6, -1e6]);
        let probs = a.probabilities();
        assert!(probs.iter().all(|p| p.is_finite()));
        for _ in 0..1_000 {
            assert_eq!(a.select_server(), 0);
        }
    }

    #[test]
    fn higher_value_chosen_more_often() {
        let mut a = agent(3, 15.0).with_values(&[-60.0, -80.0, -70.0]);
        let c = counts(&mut a, 10_000);
        assert!(c[0] > c[2], "{:?}", c);
        assert!(c[2] > c[1], "{:?}", c);
    }

    #[test]
    fn hot_temperature_is_near_uniform() {
        let mut a = agent(4, 1e9).with_values(&[-10.0, -50.0, -90.0, -200.0]);
        for p in a.probabilities() {
            assert!((p - 0.25).abs() < 1e-6);
        }
        let c = counts(&mut a, 20_000);
        for n in c {
            assert!((4_000..6_000).contains(&n), "count {} far from uniform", n);
        }
    }

    #[test]
    fn cold_temperature_is_greedy() {
        let mut a = agent(4, 1e-3).with_values(&[-50.0, -49.0, -90.0, -200.0]);
        assert!(a.probabilities()[1] > 0.999_999);
        let c = counts(&mut a, 5_000);
        assert_eq!(c[1], 5_000);
    }

    #[test]
    fn update_is_ema_toward_negated_latency() {
        let mut a = SoftmaxAgent::new(2, 15.0, 0.5, 0).unwrap();
        a.update(1, 40.0);
        assert_eq!(a.values(), &[0.0, -20.0]);
        a.update(1, 40.0);
        assert_eq!(a.values(), &[0.0, -30.0]);
    }

    #[test]
    fn update_converges() {
        let mut a = agent(3, 15.0);
        for _ in 0..500 {
            a.update(2, 73.0);
        }
        assert!((a.values()[2] + 73.0).abs() < 1e-6);
        assert_eq!(a.values()[0], 0.0);
    }

    #[test]
    fn full_learning_rate_jumps_to_reward() {
        let mut a = SoftmaxAgent::new(2, 15.0, 1.0, 0).unwrap();
        a.update(0, 12.5);
        assert_eq!(a.values()[0], -12.5);
    }

    #[test]
    fn out_of_range_update_is_ignored() {
        let mut a = agent(2, 15.0);
        a.update(9, 10.0);
        assert_eq!(a.values(), &[0.0, 0.0]);
    }
}
