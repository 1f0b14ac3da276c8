use hoplink_core::{ClickQueue, ShortCode, UrlStore};
use jiff::Timestamp;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

#[derive(Debug)]
enum Job {
    Click(ShortCode),
    Shutdown,
}

/// The enqueue side of a [`ClickRecorder`].
///
/// Cheap to clone; hand one to every service that dispatches clicks.
/// `enqueue` never blocks and never fails the caller: a closed channel
/// is logged and the event dropped.
#[derive(Debug, Clone)]
pub struct RecorderQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl ClickQueue for RecorderQueue {
    fn enqueue(&self, code: &ShortCode) {
        trace!(code = %code, "enqueueing click event");
        if self.sender.send(Job::Click(code.clone())).is_err() {
            warn!(code = %code, "click queue closed, dropping click event");
        }
    }
}

/// Background worker that applies click events to the durable store.
///
/// Each job appends a [`ClickEvent`](hoplink_core::ClickEvent) row and
/// then bumps the record's best-effort counter. Store failures are
/// logged and the worker moves on; they never reach the request path.
pub struct ClickRecorder {
    queue: RecorderQueue,
    worker: JoinHandle<()>,
}

impl ClickRecorder {
    /// Spawns the worker task on the current Tokio runtime.
    pub fn spawn<S: UrlStore>(store: Arc<S>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(store, receiver));
        Self {
            queue: RecorderQueue { sender },
            worker,
        }
    }

    /// Returns a cloneable enqueue handle.
    pub fn queue(&self) -> RecorderQueue {
        self.queue.clone()
    }

    /// Drains every event enqueued so far, then stops the worker.
    ///
    /// Events enqueued after shutdown begins are dropped (and logged by
    /// their [`RecorderQueue`]).
    pub async fn shutdown(self) {
        // The channel is FIFO, so the marker sits behind all pending clicks.
        let _ = self.queue.sender.send(Job::Shutdown);
        if let Err(e) = self.worker.await {
            warn!(error = %e, "click worker did not shut down cleanly");
        }
    }
}

async fn run_worker<S: UrlStore>(store: Arc<S>, mut receiver: mpsc::UnboundedReceiver<Job>) {
    debug!("click worker started");
    while let Some(job) = receiver.recv().await {
        match job {
            Job::Click(code) => record_click(store.as_ref(), &code).await,
            Job::Shutdown => break,
        }
    }
    debug!("click worker stopped");
}

async fn record_click<S: UrlStore>(store: &S, code: &ShortCode) {
    let now = Timestamp::now();

    if let Err(e) = store.insert_click_event(code, now).await {
        warn!(code = %code, error = %e, "failed to record click event");
        return;
    }

    if let Err(e) = store.increment_click_counter(code, now).await {
        warn!(code = %code, error = %e, "failed to bump click counter");
    }

    trace!(code = %code, "recorded click");
}
