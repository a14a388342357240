use serde::{Deserialize, Serialize};

/// Dense server index, `0..server_count`. Doubles as the agent's value slot.
pub type ServerId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequestResult {
    pub server_id: ServerId,
    pub latency: f64,
}

impl RequestResult {
    pub fn new(server_id: ServerId, latency: f64) -> Self {
        Self { server_id, latency }
    }
}
