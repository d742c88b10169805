use std::time::Duration;

use log::{error, info};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::error::TickError;
use crate::metrics::{Sampler, SystemProbe};
use crate::store::RollingStore;

use super::registry::{StreamId, StreamRegistry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Running,
    Terminated,
}

/// One message for the subscriber. Both variants carry a JSON document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    Sample(String),
    Error(String),
}

impl StreamEvent {
    pub fn internal_error() -> Self {
        StreamEvent::Error(serde_json::json!({ "error": "Internal server error" }).to_string())
    }

    pub fn payload(&self) -> &str {
        match self {
            StreamEvent::Sample(payload) | StreamEvent::Error(payload) => payload,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StopReason {
    Cancelled,
    Disconnected,
}

/// Per-subscriber loop: sample, persist, push, sleep.
pub struct LiveStream {
    id: StreamId,
    sampler: Sampler,
    store: RollingStore,
    interval: Duration,
    cancel: CancellationToken,
    state: StreamState,
    ticks: u64,
}

impl LiveStream {
    pub fn new(
        id: StreamId,
        sampler: Sampler,
        store: RollingStore,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        LiveStream {
            id,
            sampler,
            store,
            interval,
            cancel,
            state: StreamState::Running,
            ticks: 0,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Runs until the receiver is dropped or the stream is cancelled.
    /// Returns the number of events delivered.
    pub async fn run(mut self, events: mpsc::Sender<StreamEvent>) -> u64 {
        let cancel = self.cancel.clone();

        while self.state == StreamState::Running {
            let outcome = select! {
                biased;
                _ = cancel.cancelled() => Err(StopReason::Cancelled),
                _ = events.closed() => Err(StopReason::Disconnected),
                outcome = self.tick() => Ok(outcome),
            };
            let event = match outcome {
                Ok(Ok(payload)) => StreamEvent::Sample(payload),
                Ok(Err(err)) => {
                    error!("Error generating metrics: {}", err);
                    StreamEvent::internal_error()
                }
                Err(reason) => {
                    self.terminate(reason);
                    break;
                }
            };

            let delivered = select! {
                biased;
                _ = cancel.cancelled() => Err(StopReason::Cancelled),
                sent = events.send(event) => sent.map_err(|_| StopReason::Disconnected),
            };
            if let Err(reason) = delivered {
                self.terminate(reason);
                break;
            }
            self.ticks += 1;

            let paused = select! {
                biased;
                _ = cancel.cancelled() => Err(StopReason::Cancelled),
                _ = events.closed() => Err(StopReason::Disconnected),
                _ = sleep(self.interval) => Ok(()),
            };
            if let Err(reason) = paused {
                self.terminate(reason);
            }
        }

        self.ticks
    }

    /// The sampler's CPU window paces the tick; a storage failure is logged
    /// and does not hold back delivery.
    async fn tick(&mut self) -> Result<String, TickError> {
        let sample = self.sampler.sample(self.interval).await?;
        let payload = serde_json::to_string(&sample)?;
        if let Err(err) = self.store.append(&payload).await {
            error!("Error storing metrics: {}", err);
        }
        Ok(payload)
    }

    fn terminate(&mut self, reason: StopReason) {
        self.state = StreamState::Terminated;
        info!(
            "metrics stream {} terminated after {} events ({:?})",
            self.id, self.ticks, reason
        );
    }
}

/// Starts a live stream on the runtime and returns its event receiver.
/// Dropping the receiver stops the stream.
pub fn spawn_live_stream(
    store: RollingStore,
    registry: StreamRegistry,
    probe: Box<dyn SystemProbe>,
    interval_secs: u64,
) -> mpsc::Receiver<StreamEvent> {
    let (id, cancel) = registry.register(interval_secs);
    let (tx, rx) = mpsc::channel(1);
    let stream = LiveStream::new(
        id.clone(),
        Sampler::new(probe),
        store,
        Duration::from_secs(interval_secs),
        cancel,
    );

    info!(
        "Real-time metrics stream {} started with interval {} seconds.",
        id, interval_secs
    );
    tokio::spawn(async move {
        let delivered = stream.run(tx).await;
        registry.finish(&id, delivered);
    });

    rx
}
