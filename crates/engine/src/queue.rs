//! In-process job queue running simulations on a fixed pool of worker threads.
//!
//! Each worker owns its own database connection. A job runs once; there is no
//! retry, and a failure (or a panicking simulation) is recorded as the job's
//! final state. Only the most recent `retained_jobs` finished jobs are kept.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use simstore_core::BundlePairId;

use crate::config::Config;
use crate::error::EngineError;
use crate::orchestrator::Orchestrator;
use crate::simulator::Simulator;
use crate::store::ResultStore;
use crate::transport::TransportResults;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", &self.0.to_string()[..8])
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum JobState {
    Pending,
    Running,
    Finished(BundlePairId),
    Failed(String),
}

impl JobState {
    fn status(&self) -> JobStatus {
        match self {
            JobState::Pending => JobStatus::Pending,
            JobState::Running => JobStatus::Running,
            JobState::Finished(_) => JobStatus::Finished,
            JobState::Failed(_) => JobStatus::Failed,
        }
    }
}

struct Job {
    id: JobId,
    dataset: PathBuf,
}

#[derive(Default)]
struct Jobs {
    states: HashMap<JobId, JobState>,
    /// Finished and failed jobs, oldest first.
    done: VecDeque<JobId>,
}

struct JobTable {
    jobs: Mutex<Jobs>,
    changed: Condvar,
    retain: usize,
}

impl JobTable {
    fn new(retain: usize) -> Self {
        Self {
            jobs: Mutex::new(Jobs::default()),
            changed: Condvar::new(),
            retain,
        }
    }

    fn set(&self, id: JobId, state: JobState) {
        let mut jobs = self.jobs.lock();
        let done = state.status().is_done();
        jobs.states.insert(id, state);
        if done {
            jobs.done.push_back(id);
            while jobs.done.len() > self.retain {
                if let Some(evicted) = jobs.done.pop_front() {
                    jobs.states.remove(&evicted);
                    debug!(job = %evicted, "job evicted");
                }
            }
        }
        drop(jobs);
        self.changed.notify_all();
    }

    fn with<T>(&self, id: JobId, f: impl FnOnce(&JobState) -> T) -> Result<T, EngineError> {
        self.jobs
            .lock()
            .states
            .get(&id)
            .map(f)
            .ok_or(EngineError::JobNotFound(id))
    }
}

pub struct JobQueue {
    sender: Option<mpsc::Sender<Job>>,
    table: Arc<JobTable>,
    workers: Vec<JoinHandle<()>>,
}

impl JobQueue {
    /// Open one store per worker and start the pool.
    pub fn start(config: &Config, simulator: Arc<dyn Simulator>) -> Result<Self, EngineError> {
        config.validate()?;
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let table = Arc::new(JobTable::new(config.queue.retained_jobs));

        let mut workers = Vec::with_capacity(config.queue.workers);
        for index in 0..config.queue.workers {
            let store = ResultStore::open(config.store.clone())?;
            let orchestrator = Orchestrator::new(store, Arc::clone(&simulator));
            let receiver = Arc::clone(&receiver);
            let table = Arc::clone(&table);
            let handle = thread::Builder::new()
                .name(format!("simstore-worker-{index}"))
                .spawn(move || worker_loop(index, orchestrator, receiver, table))?;
            workers.push(handle);
        }
        info!(workers = workers.len(), "job queue started");

        Ok(Self {
            sender: Some(sender),
            table,
            workers,
        })
    }

    /// Queue a simulation of `dataset`. The job starts out pending.
    pub fn submit(&self, dataset: impl Into<PathBuf>) -> Result<JobId, EngineError> {
        let sender = self.sender.as_ref().ok_or(EngineError::QueueClosed)?;
        let job = Job {
            id: JobId::new(),
            dataset: dataset.into(),
        };
        let id = job.id;
        self.table.set(id, JobState::Pending);
        if sender.send(job).is_err() {
            self.table.jobs.lock().states.remove(&id);
            return Err(EngineError::QueueClosed);
        }
        debug!(job = %id, "job submitted");
        Ok(id)
    }

    pub fn status(&self, id: JobId) -> Result<JobStatus, EngineError> {
        self.table.with(id, JobState::status)
    }

    /// The stored bundle pair, once the job has finished.
    pub fn result(&self, id: JobId) -> Result<Option<BundlePairId>, EngineError> {
        self.table.with(id, |state| match state {
            JobState::Finished(pair_id) => Some(*pair_id),
            _ => None,
        })
    }

    /// The failure message, if the job failed.
    pub fn failure(&self, id: JobId) -> Result<Option<String>, EngineError> {
        self.table.with(id, |state| match state {
            JobState::Failed(reason) => Some(reason.clone()),
            _ => None,
        })
    }

    /// Block until the job is finished or failed, or `timeout` elapses.
    /// Returns the status at that point. A timeout too large to represent
    /// waits without limit.
    pub fn wait(&self, id: JobId, timeout: Duration) -> Result<JobStatus, EngineError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut jobs = self.table.jobs.lock();
        loop {
            let status = jobs
                .states
                .get(&id)
                .map(JobState::status)
                .ok_or(EngineError::JobNotFound(id))?;
            if status.is_done() || deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(status);
            }
            match deadline {
                Some(deadline) => {
                    self.table.changed.wait_until(&mut jobs, deadline);
                }
                None => self.table.changed.wait(&mut jobs),
            }
        }
    }

    /// Stop accepting jobs, let queued ones drain, and join the workers.
    pub fn shutdown(mut self) {
        self.stop();
    }

    /// Stop accepting jobs and return without joining the workers.
    /// Running and queued jobs carry on in the background until the
    /// process exits.
    pub fn detach(mut self) {
        self.sender.take();
        let workers = self.workers.len();
        self.workers.clear();
        warn!(workers, "job queue detached with workers still running");
    }

    fn stop(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
        info!("job queue stopped");
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    index: usize,
    mut orchestrator: Orchestrator,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    table: Arc<JobTable>,
) {
    loop {
        let next = receiver.lock().recv();
        let Ok(job) = next else {
            debug!(worker = index, "worker stopping");
            break;
        };

        table.set(job.id, JobState::Running);
        debug!(worker = index, job = %job.id, dataset = %job.dataset.display(), "job running");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| orchestrator.run(&job.dataset)));
        let state = match outcome {
            Ok(Ok(pair_id)) => {
                info!(job = %job.id, pair_id = %pair_id, "job finished");
                JobState::Finished(pair_id)
            }
            Ok(Err(e)) => {
                warn!(job = %job.id, error = %e, "job failed");
                JobState::Failed(e.to_string())
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(job = %job.id, %reason, "simulation panicked");
                JobState::Failed(format!("simulation panicked: {reason}"))
            }
        };
        table.set(job.id, state);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// What a status poll reports: either where the job stands, or its results.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JobCheck {
    Status(JobStatus),
    Results(TransportResults),
}

/// Poll a job and, once it has finished, read its results from `store`.
pub fn check_job(
    queue: &JobQueue,
    store: &ResultStore,
    id: JobId,
) -> Result<JobCheck, EngineError> {
    match queue.result(id)? {
        Some(pair_id) => Ok(JobCheck::Results(store.restore_transport(pair_id)?)),
        None => Ok(JobCheck::Status(queue.status(id)?)),
    }
}
