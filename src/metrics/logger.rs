use super::MetricsSnapshot;
use anyhow::Result;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

// csv can't write a Vec inside a record, so the estimates get joined into one column
#[derive(Serialize)]
struct SnapshotRow {
    request: u64,
    chosen_server: usize,
    latency: f64,
    avg_latency: f64,
    estimated_latencies: String,
}

impl From<&MetricsSnapshot> for SnapshotRow {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        let estimated_latencies = snapshot
            .estimated_latencies
            .iter()
            .map(|v| format!("{:.3}", v))
            .collect::<Vec<_>>()
            .join(";");

        Self {
            request: snapshot.request,
            chosen_server: snapshot.chosen_server,
            latency: snapshot.latency,
            avg_latency: snapshot.avg_latency,
            estimated_latencies,
        }
    }
}

pub struct MetricsLogger {
    writer: Writer<File>,
}

impl MetricsLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log(&mut self, snapshot: &MetricsSnapshot) -> Result<()> {
        self.writer.serialize(SnapshotRow::from(snapshot))?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn log_batch(&mut self, snapshots: &[MetricsSnapshot]) -> Result<()> {
        for snapshot in snapshots {
            self.writer.serialize(SnapshotRow::from(snapshot))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
