pub mod agent;
pub mod error;
pub mod server;
pub mod network;
pub mod metrics;
pub mod simulation;

pub use agent::SoftmaxAgent;
pub use error::ConfigError;
pub use server::{LatencyModel, Server};
pub use simulation::{Simulation, SimConfig};
pub use metrics::MetricsCollector;

pub mod prelude {
    pub use crate::agent::SoftmaxAgent;
    pub use crate::error::ConfigError;
    pub use crate::server::{LatencyModel, Server};
    pub use crate::simulation::{Simulation, SimConfig, RunSummary};
    pub use crate::network::RequestResult;
    pub use crate::metrics::MetricsSnapshot;
}
