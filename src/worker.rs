//! Offloaded runs.
//!
//! A run is started on its own thread from a single [`Request`]; progress
//! comes back over a channel as [`Response`] messages, the last of which has
//! `finished = true`. Intermediate reports are sampled (every
//! `report_every`-th pass) so a slow consumer is not flooded. The consumer
//! may cancel between passes, or simply drop the handle.

use crate::algorithm::{KMeansRun, Progress};
use crate::config::KMeansConfig;
use crate::error::Result;
use crate::kmeans::seeded_rng;
use crate::vector::batch_from_rows;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Inbound message: the batch to cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Rows of features followed by an identifier tag
    pub input: Vec<Vec<f64>>,
    pub k: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration_limit: Option<usize>,
}

/// Outbound message: one progress report with cluster members resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub centroids: Vec<Vec<f64>>,
    pub clusters: Vec<Vec<Vec<f64>>>,
    pub iteration: usize,
    pub finished: bool,
    pub converged: bool,
}

impl Response {
    /// Copy a report into wire form, resolving member indices against `data`
    pub fn from_progress(progress: &Progress, data: &ArrayView2<f64>) -> Self {
        let centroids = progress
            .centroids
            .outer_iter()
            .map(|row| row.to_vec())
            .collect();

        let clusters = (0..progress.clusters.len())
            .map(|c| progress.members(*data, c).map(|row| row.to_vec()).collect())
            .collect();

        Self {
            centroids,
            clusters,
            iteration: progress.iteration,
            finished: progress.finished,
            converged: progress.converged,
        }
    }
}

/// One message on the progress channel
pub type Message = Result<Response>;

/// Worker settings that are not part of the request
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Forward an intermediate report only when its iteration is a multiple
    /// of this. The final report is always forwarded.
    pub report_every: usize,

    /// Seed for centroid initialization, `None` for OS entropy
    pub seed: Option<u64>,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            report_every: 10,
            seed: None,
        }
    }
}

impl WorkerOptions {
    /// Set the sampling interval for intermediate reports
    pub fn with_report_every(mut self, report_every: usize) -> Self {
        self.report_every = report_every;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Consumer side of an offloaded run
pub struct WorkerHandle {
    receiver: Receiver<Message>,
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Block for the next message. `None` once the worker is done.
    pub fn recv(&self) -> Option<Message> {
        self.receiver.recv().ok()
    }

    /// Block for the next message, up to `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> std::result::Result<Message, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Iterate over messages until the worker is done
    pub fn iter(&self) -> mpsc::Iter<'_, Message> {
        self.receiver.iter()
    }

    /// Ask the worker to stop before its next pass.
    /// A cancelled run sends no further messages, not even a final one.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Whether [`WorkerHandle::cancel`] has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Wait for the worker thread to exit
    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}

impl IntoIterator for WorkerHandle {
    type Item = Message;
    type IntoIter = mpsc::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.receiver.into_iter()
    }
}

/// Start a run on a new thread
pub fn spawn(request: Request, options: WorkerOptions) -> WorkerHandle {
    let (sender, receiver) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);

    let thread = thread::spawn(move || {
        if let Err(e) = serve(&request, &options, &flag, &sender) {
            warn!(error = %e, "k-means worker failed");
            let _ = sender.send(Err(e));
        }
    });

    WorkerHandle {
        receiver,
        cancel,
        thread,
    }
}

fn serve(
    request: &Request,
    options: &WorkerOptions,
    cancel: &AtomicBool,
    sender: &Sender<Message>,
) -> Result<()> {
    let data = batch_from_rows(&request.input)?;

    let mut config = KMeansConfig::new(request.k);
    if let Some(limit) = request.iteration_limit {
        config = config.with_max_iters(limit);
    }
    config.seed = options.seed;

    let mut rng = seeded_rng(config.seed);
    let mut run = KMeansRun::new(data.view(), &config, &mut rng)?;
    let report_every = options.report_every.max(1);

    while !cancel.load(Ordering::Relaxed) {
        let Some(report) = run.next() else {
            return Ok(());
        };
        let report = report?;

        if !report.finished && report.iteration % report_every != 0 {
            continue;
        }

        if sender
            .send(Ok(Response::from_progress(&report, &data.view())))
            .is_err()
        {
            debug!(iteration = report.iteration, "consumer went away, stopping run");
            return Ok(());
        }
    }

    debug!(passes = run.passes(), "k-means run cancelled");
    Ok(())
}
