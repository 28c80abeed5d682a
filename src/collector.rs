use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::error::CollectError;
use crate::fetcher::Fetcher;
use crate::mapper;
use crate::models::snapshot::Snapshot;
use crate::sink::{Batch, MetricSink};
use crate::util::now_secs;

/// Outcome of a successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub instances: usize,
    pub points: usize,
    pub timestamp: i64,
}

/// Runs the fetch → decode → map → write pipeline.
pub struct Collector {
    fetcher: Fetcher,
    sink: Arc<dyn MetricSink>,
    database: String,
    // Held for the duration of a cycle; a second caller is turned away.
    running: Mutex<()>,
}

impl Collector {
    pub fn new(fetcher: Fetcher, sink: Arc<dyn MetricSink>, database: impl Into<String>) -> Self {
        Self {
            fetcher,
            sink,
            database: database.into(),
            running: Mutex::new(()),
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, CollectError> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| CollectError::CycleInProgress)?;

        let body = self.fetcher.fetch().await?;
        tracing::debug!(bytes = body.len(), "cycle: payload fetched");

        let snapshot = Snapshot::from_slice(&body)?;
        tracing::debug!(
            instances = snapshot.instances.len(),
            total_users = snapshot.total_users,
            "cycle: snapshot decoded"
        );

        let points = mapper::map_snapshot(&snapshot, self.fetcher.url());

        let mut batch = Batch::new(self.database.as_str(), now_secs());
        batch.add_points(points);
        self.sink.write(&batch).await?;

        Ok(CycleReport {
            instances: snapshot.instances.len(),
            points: batch.len(),
            timestamp: batch.timestamp,
        })
    }
}

/// Background job: collect immediately, then once per `period`. Failed
/// cycles are logged and the schedule carries on.
pub async fn collection_job(collector: Arc<Collector>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let started = Instant::now();
        match collector.run_cycle().await {
            Ok(report) => tracing::info!(
                instances = report.instances,
                points = report.points,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Collection cycle complete"
            ),
            Err(e) => tracing::error!(
                error_type = e.kind(),
                error = %e,
                "Collection cycle failed, waiting for next tick"
            ),
        }
    }
}
