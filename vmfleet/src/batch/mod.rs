//! Batch coordinator.
//!
//! Provisions a whole fleet with a bounded pool of workers. Each worker
//! takes the next server from a shared queue and runs its pipeline to
//! completion before taking another. One server's failure never stops the
//! others; every outcome is collected before the report is finalized.
//!
//! Cancellation stops dispatch of queued servers. Pipelines already running
//! observe the same token and abandon their in-flight call.

mod report;

pub use report::BatchReport;

use crate::config::ServerDescriptor;
use crate::provision::{ProvisioningOutcome, Provisioner, ServerState};
use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use ulid::Ulid;

type WorkQueue = Arc<Mutex<VecDeque<Arc<ServerDescriptor>>>>;

pub struct BatchCoordinator {
    provisioner: Arc<Provisioner>,
    workers: usize,
}

impl BatchCoordinator {
    pub fn new(provisioner: Arc<Provisioner>, workers: usize) -> Self {
        Self {
            provisioner,
            workers,
        }
    }

    /// Provision every server and report per-server outcomes.
    pub async fn run(
        &self,
        servers: Vec<ServerDescriptor>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let run_id = Ulid::new();
        let started_at = Utc::now();
        let total = servers.len();
        let workers = self.workers.clamp(1, total.max(1));

        tracing::info!(run_id = %run_id, servers = total, workers, "Starting batch");

        let queue: WorkQueue = Arc::new(Mutex::new(
            servers.into_iter().map(Arc::new).collect(),
        ));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                tokio::spawn(worker_loop(
                    worker,
                    Arc::clone(&self.provisioner),
                    Arc::clone(&queue),
                    tx.clone(),
                    cancel.clone(),
                ))
            })
            .collect();
        drop(tx);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        for (worker, result) in join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = result {
                tracing::error!(worker, error = %e, "Provisioning worker terminated abnormally");
            }
        }

        let not_started: Vec<String> = queue
            .lock()
            .drain(..)
            .map(|server| server.name.clone())
            .collect();

        let report = BatchReport {
            run_id,
            total,
            outcomes,
            not_started,
            cancelled: cancel.is_cancelled(),
            started_at,
            finished_at: Utc::now(),
        };
        report.log_summary();
        report
    }
}

async fn worker_loop(
    worker: usize,
    provisioner: Arc<Provisioner>,
    queue: WorkQueue,
    outcomes: mpsc::UnboundedSender<ProvisioningOutcome>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            tracing::debug!(worker, "Cancelled, stopping dispatch");
            break;
        }

        let next = queue.lock().pop_front();
        let Some(server) = next else {
            break;
        };

        tracing::debug!(worker, server = %server.name, "Dispatching server");
        let Some(outcome) = dispatch(&provisioner, server, &queue, &cancel).await else {
            break;
        };
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
}

/// Provision one server taken from the queue.
///
/// A run cancelled before the server's first step leaves it `NotStarted`;
/// it goes back to the front of the queue so the report lists it as not
/// started instead of failed.
async fn dispatch(
    provisioner: &Provisioner,
    server: Arc<ServerDescriptor>,
    queue: &WorkQueue,
    cancel: &CancellationToken,
) -> Option<ProvisioningOutcome> {
    let outcome = provisioner.provision(Arc::clone(&server), cancel).await;
    if outcome.state == ServerState::NotStarted {
        queue.lock().push_front(server);
        return None;
    }
    Some(outcome)
}
