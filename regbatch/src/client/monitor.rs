use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::engine::BatchReadEngine;
use crate::error::MonitorError;
use crate::types::{BatchReadResult, ReadItem};

/// Lifecycle of a [`RealtimeMonitor`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MonitorState {
    /// created, not started yet
    Idle,
    /// polling
    Running,
    /// stopped, cannot be restarted
    Stopped,
}

/// Result of one polling cycle
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// cycle number, starting at 1
    pub cycle: u64,
    /// wall clock time taken when the cycle started
    pub timestamp: DateTime<Utc>,
    /// result of the batch read performed during the cycle
    pub result: BatchReadResult,
}

/// Repeatedly reads a fixed list of items at a fixed interval
///
/// Cycles are strictly sequential: the interval is measured from the end of one read to
/// the start of the next, so there is never more than one outstanding request. Transport
/// failures are reported in that cycle's snapshot and polling continues.
#[derive(Debug)]
pub struct RealtimeMonitor {
    engine: BatchReadEngine,
    items: Vec<ReadItem>,
    interval: Duration,
    state: MonitorState,
}

impl RealtimeMonitor {
    /// create an idle monitor
    pub fn new(engine: BatchReadEngine, items: Vec<ReadItem>, interval: Duration) -> Self {
        Self {
            engine,
            items,
            interval,
            state: MonitorState::Idle,
        }
    }

    /// current lifecycle state
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Run the polling loop on the current task until `token` is cancelled or the
    /// receiving half of `snapshots` is dropped
    ///
    /// Cancellation is only observed between cycles; a read that is in flight always
    /// completes. Returns the number of cycles performed.
    pub async fn run(
        &mut self,
        token: CancellationToken,
        snapshots: mpsc::Sender<Snapshot>,
    ) -> Result<u64, MonitorError> {
        if self.state != MonitorState::Idle {
            return Err(MonitorError::NotIdle(self.state));
        }

        self.state = MonitorState::Running;
        tracing::info!(
            "monitor started - {} item(s) every {:?}",
            self.items.len(),
            self.interval
        );

        let mut cycle: u64 = 0;
        while !token.is_cancelled() {
            cycle += 1;
            let timestamp = Utc::now();
            let result = self.engine.read(&self.items).await;

            if !result.is_success() {
                tracing::warn!("monitor cycle {} failed: {}", cycle, result.message);
            }

            let snapshot = Snapshot {
                cycle,
                timestamp,
                result,
            };

            if snapshots.send(snapshot).await.is_err() {
                tracing::info!("snapshot receiver dropped");
                break;
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.state = MonitorState::Stopped;
        tracing::info!("monitor stopped after {} cycle(s)", cycle);
        Ok(cycle)
    }

    /// Spawn the polling loop onto the runtime
    ///
    /// `buffer` is the number of snapshots that may be queued before the loop waits
    /// for the consumer.
    pub fn spawn(mut self, buffer: usize) -> MonitorHandle {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            self.run(task_token, tx).await?;
            Ok::<_, MonitorError>(self)
        });

        MonitorHandle {
            token,
            snapshots: rx,
            task,
        }
    }
}

/// Handle to a spawned [`RealtimeMonitor`]
///
/// Dropping the handle stops the monitor at its next cycle boundary.
#[derive(Debug)]
pub struct MonitorHandle {
    token: CancellationToken,
    snapshots: mpsc::Receiver<Snapshot>,
    task: tokio::task::JoinHandle<Result<RealtimeMonitor, MonitorError>>,
}

impl MonitorHandle {
    /// wait for the next snapshot, `None` once the monitor has stopped
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.snapshots.recv().await
    }

    /// request a stop, observed at the next cycle boundary
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// token that stops the monitor when cancelled
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// stop the monitor and wait for the loop to finish
    ///
    /// Returns the stopped monitor, or `None` if the task panicked or was aborted.
    pub async fn join(mut self) -> Option<RealtimeMonitor> {
        self.token.cancel();
        // release any send the loop is blocked on
        self.snapshots.close();
        while self.snapshots.try_recv().is_ok() {}
        match (&mut self.task).await {
            Ok(Ok(monitor)) => Some(monitor),
            Ok(Err(err)) => {
                tracing::warn!("{}", err);
                None
            }
            Err(err) => {
                tracing::warn!("monitor task failed: {}", err);
                None
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
