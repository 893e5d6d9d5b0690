//! Admission controller: serializes heavy recognition jobs through a
//! single execution slot.
//!
//! Submissions land on an mpsc queue drained by one dedicated consumer
//! task, so at most one job pipeline runs at a time. A capacity-1
//! semaphore is additionally asserted around each execution; finding it
//! held inside the sole consumer means the mutual-exclusion invariant is
//! broken, which is fatal to the scheduler and logged loudly.

use crate::error::{CaptionqError, ErrorKind, Result};
use crate::job::{JobId, JobOutput, JobPhase, JobRequest, JobState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;

/// Events streamed to a job's submitter, in order.
#[derive(Debug)]
pub enum JobEvent {
    /// Sent at submission; `position` is the number of jobs ahead.
    Queued { position: usize },
    /// The job acquired the execution slot.
    Started,
    /// Coarse progress while running.
    Progress { phase: JobPhase },
    Done { output: JobOutput },
    Failed { kind: ErrorKind, message: String },
    /// The job was cancelled before it acquired the execution slot.
    Cancelled,
}

impl JobEvent {
    /// Job state implied by this event.
    pub fn state(&self) -> JobState {
        match self {
            JobEvent::Queued { .. } => JobState::Queued,
            JobEvent::Started | JobEvent::Progress { .. } => JobState::Running,
            JobEvent::Done { .. } => JobState::Done,
            JobEvent::Failed { .. } | JobEvent::Cancelled => JobState::Failed,
        }
    }
}

/// Terminal result of a job, as seen by its submitter.
#[derive(Debug)]
pub enum JobOutcome {
    Done(JobOutput),
    Failed { kind: ErrorKind, message: String },
    Cancelled,
}

/// Context handed to the executor for one admitted job.
pub struct JobContext {
    pub id: JobId,
    pub request: JobRequest,
    events: mpsc::UnboundedSender<JobEvent>,
}

impl JobContext {
    /// Context with no listener, for driving an executor outside the
    /// scheduler (progress reports go nowhere).
    pub fn detached(id: JobId, request: JobRequest) -> Self {
        let (events, _) = mpsc::unbounded_channel();
        Self {
            id,
            request,
            events,
        }
    }

    /// Report a progress phase to the submitter. Best-effort: a submitter
    /// that dropped its handle just stops listening.
    pub fn report_phase(&self, phase: JobPhase) {
        let _ = self.events.send(JobEvent::Progress { phase });
    }
}

/// The recognition+aggregation pipeline boundary the scheduler drives.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, ctx: &JobContext) -> Result<JobOutput>;
}

/// Handle returned by `submit`. Streams job events and allows
/// best-effort cancellation.
pub struct JobHandle {
    id: JobId,
    position: usize,
    cancelled: Arc<AtomicBool>,
    events: mpsc::UnboundedReceiver<JobEvent>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Number of jobs that were ahead of this one at submission time.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Best-effort cancellation: skips the job if it has not yet acquired
    /// the execution slot. A running job completes on its own schedule.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Next event, or `None` once the scheduler has dropped the job.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Drain events until the job reaches a terminal state.
    pub async fn wait(mut self) -> JobOutcome {
        while let Some(event) = self.events.recv().await {
            match event {
                JobEvent::Done { output } => return JobOutcome::Done(output),
                JobEvent::Failed { kind, message } => return JobOutcome::Failed { kind, message },
                JobEvent::Cancelled => return JobOutcome::Cancelled,
                JobEvent::Queued { .. } | JobEvent::Started | JobEvent::Progress { .. } => {}
            }
        }
        JobOutcome::Failed {
            kind: ErrorKind::Internal,
            message: "scheduler dropped the job".to_string(),
        }
    }
}

struct QueuedJob {
    id: JobId,
    request: JobRequest,
    cancelled: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<JobEvent>,
}

struct SchedulerShared {
    /// Jobs submitted but not yet finished (includes the running job).
    waiting: AtomicUsize,
    /// The execution gate. Capacity 1 is the central invariant.
    gate: Semaphore,
    /// Cancellation flags by job id, removed when a job finishes.
    cancels: Mutex<HashMap<JobId, Arc<AtomicBool>>>,
}

impl SchedulerShared {
    fn cancels(&self) -> MutexGuard<'_, HashMap<JobId, Arc<AtomicBool>>> {
        // Recover from poisoning: the map stays usable even if a holder
        // panicked mid-insert.
        self.cancels.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Releases a job's bookkeeping exactly once, on every exit path of the
/// consumer loop iteration: success, failure, panic, or cancelled skip.
struct JobGuard<'a> {
    shared: &'a SchedulerShared,
    id: JobId,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.shared.waiting.fetch_sub(1, Ordering::SeqCst);
        self.shared.cancels().remove(&self.id);
    }
}

/// The admission-controlled job scheduler.
pub struct Scheduler {
    shared: Arc<SchedulerShared>,
    queue_tx: mpsc::UnboundedSender<QueuedJob>,
    next_id: AtomicU64,
    worker: JoinHandle<()>,
}

impl Scheduler {
    /// Create a scheduler and spawn its consumer task.
    pub fn new(executor: Arc<dyn JobExecutor>) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(SchedulerShared {
            waiting: AtomicUsize::new(0),
            gate: Semaphore::new(1),
            cancels: Mutex::new(HashMap::new()),
        });
        let worker = tokio::spawn(run_worker(Arc::clone(&shared), executor, queue_rx));
        Self {
            shared,
            queue_tx,
            next_id: AtomicU64::new(1),
            worker,
        }
    }

    /// Register a job. Non-blocking: the handle is returned immediately
    /// with the job's queue position; admission happens FIFO as the
    /// execution slot frees up.
    pub fn submit(&self, request: JobRequest) -> Result<JobHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        // fetch_add returns the prior count: the number of jobs ahead.
        let position = self.shared.waiting.fetch_add(1, Ordering::SeqCst);
        let _ = events_tx.send(JobEvent::Queued { position });
        self.shared.cancels().insert(id, Arc::clone(&cancelled));

        let queued = QueuedJob {
            id,
            request,
            cancelled: Arc::clone(&cancelled),
            events: events_tx,
        };
        if self.queue_tx.send(queued).is_err() {
            self.shared.waiting.fetch_sub(1, Ordering::SeqCst);
            self.shared.cancels().remove(&id);
            return Err(CaptionqError::SchedulerInternal {
                message: "submission queue is closed".to_string(),
            });
        }

        Ok(JobHandle {
            id,
            position,
            cancelled,
            events: events_rx,
        })
    }

    /// Cancel a job by id. Returns false if the job is unknown (already
    /// finished or never submitted).
    pub fn cancel(&self, id: JobId) -> bool {
        match self.shared.cancels().get(&id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Jobs submitted but not yet finished (includes the running job).
    pub fn waiting(&self) -> usize {
        self.shared.waiting.load(Ordering::SeqCst)
    }

    /// True while a job holds the execution slot.
    pub fn is_running(&self) -> bool {
        self.shared.gate.available_permits() == 0
    }

    /// Stop accepting submissions and wait for queued jobs to drain.
    pub async fn shutdown(self) {
        let Scheduler {
            queue_tx, worker, ..
        } = self;
        drop(queue_tx);
        if let Err(e) = worker.await {
            eprintln!("captionq: scheduler worker task failed: {e}");
        }
    }
}

/// The single consumer task: admits jobs one at a time in FIFO order.
async fn run_worker(
    shared: Arc<SchedulerShared>,
    executor: Arc<dyn JobExecutor>,
    mut queue_rx: mpsc::UnboundedReceiver<QueuedJob>,
) {
    while let Some(job) = queue_rx.recv().await {
        let _guard = JobGuard {
            shared: &shared,
            id: job.id,
        };

        if job.cancelled.load(Ordering::SeqCst) {
            let _ = job.events.send(JobEvent::Cancelled);
            continue;
        }

        let permit = match shared.gate.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                // The sole consumer found the gate held: the
                // mutual-exclusion invariant is violated. Fatal.
                let message = "execution gate already held at admission".to_string();
                eprintln!("captionq: FATAL scheduler invariant violated: {message}");
                let _ = job.events.send(JobEvent::Failed {
                    kind: ErrorKind::Internal,
                    message,
                });
                break;
            }
        };

        let _ = job.events.send(JobEvent::Started);
        let events = job.events.clone();
        let ctx = JobContext {
            id: job.id,
            request: job.request,
            events: job.events,
        };

        // Run the pipeline on its own task so a panic is contained and
        // the gate and counter still release.
        let exec = Arc::clone(&executor);
        let result = tokio::spawn(async move { exec.execute(&ctx).await }).await;

        match result {
            Ok(Ok(output)) => {
                let _ = events.send(JobEvent::Done { output });
            }
            Ok(Err(error)) => {
                let _ = events.send(JobEvent::Failed {
                    kind: error.kind(),
                    message: error.user_message(),
                });
            }
            Err(join_error) => {
                let _ = events.send(JobEvent::Failed {
                    kind: ErrorKind::Internal,
                    message: format!("job crashed: {join_error}"),
                });
            }
        }

        drop(permit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobRequest, TempArtifact};

    fn request() -> JobRequest {
        JobRequest::speech(TempArtifact::from_bytes(b"test audio").unwrap())
    }

    /// Executor that echoes the job id.
    struct EchoExecutor;

    #[async_trait::async_trait]
    impl JobExecutor for EchoExecutor {
        async fn execute(&self, ctx: &JobContext) -> Result<JobOutput> {
            ctx.report_phase(JobPhase::Recognizing);
            Ok(JobOutput {
                text: format!("job {}", ctx.id),
                sync: None,
            })
        }
    }

    /// Executor that always fails with a recognition error.
    struct FailingExecutor;

    #[async_trait::async_trait]
    impl JobExecutor for FailingExecutor {
        async fn execute(&self, _ctx: &JobContext) -> Result<JobOutput> {
            Err(CaptionqError::RecognitionUnavailable {
                message: "engine down".to_string(),
            })
        }
    }

    /// Executor that panics mid-job.
    struct PanickingExecutor;

    #[async_trait::async_trait]
    impl JobExecutor for PanickingExecutor {
        async fn execute(&self, _ctx: &JobContext) -> Result<JobOutput> {
            panic!("pipeline bug");
        }
    }

    #[tokio::test]
    async fn submit_reports_position_and_completes() {
        let scheduler = Scheduler::new(Arc::new(EchoExecutor));
        let handle = scheduler.submit(request()).unwrap();
        assert_eq!(handle.position(), 0);

        match handle.wait().await {
            JobOutcome::Done(output) => assert_eq!(output.text, "job 1"),
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn positions_increase_with_queue_depth() {
        let scheduler = Scheduler::new(Arc::new(EchoExecutor));
        let first = scheduler.submit(request()).unwrap();
        let second = scheduler.submit(request()).unwrap();
        let third = scheduler.submit(request()).unwrap();

        assert_eq!(first.position(), 0);
        assert_eq!(second.position(), 1);
        assert_eq!(third.position(), 2);
    }

    #[tokio::test]
    async fn failed_job_releases_gate_and_counter() {
        let scheduler = Scheduler::new(Arc::new(FailingExecutor));
        let handle = scheduler.submit(request()).unwrap();

        match handle.wait().await {
            JobOutcome::Failed { kind, message } => {
                assert_eq!(kind, ErrorKind::Recognition);
                assert!(message.starts_with("The recognition engine failed"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }

        // Wait for the consumer to finish the iteration's bookkeeping.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(scheduler.waiting(), 0);
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn panicking_job_releases_gate_and_counter() {
        let scheduler = Scheduler::new(Arc::new(PanickingExecutor));
        let handle = scheduler.submit(request()).unwrap();

        match handle.wait().await {
            JobOutcome::Failed { kind, .. } => assert_eq!(kind, ErrorKind::Internal),
            other => panic!("expected Failed, got {other:?}"),
        }

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(scheduler.waiting(), 0);
        assert!(!scheduler.is_running());

        // The scheduler survives a panicked job.
        let handle = scheduler.submit(request()).unwrap();
        assert!(matches!(handle.wait().await, JobOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn cancel_before_admission_skips_job() {
        let slow = Arc::new(SlowExecutor::new(std::time::Duration::from_millis(100)));
        let scheduler = Scheduler::new(slow);

        let first = scheduler.submit(request()).unwrap();
        let second = scheduler.submit(request()).unwrap();
        second.cancel();

        assert!(matches!(first.wait().await, JobOutcome::Done(_)));
        assert!(matches!(second.wait().await, JobOutcome::Cancelled));

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(scheduler.waiting(), 0);
    }

    #[tokio::test]
    async fn cancel_by_id_through_scheduler() {
        let slow = Arc::new(SlowExecutor::new(std::time::Duration::from_millis(100)));
        let scheduler = Scheduler::new(slow);

        let first = scheduler.submit(request()).unwrap();
        let second = scheduler.submit(request()).unwrap();
        assert!(scheduler.cancel(second.id()));

        assert!(matches!(first.wait().await, JobOutcome::Done(_)));
        assert!(matches!(second.wait().await, JobOutcome::Cancelled));

        // Finished jobs are forgotten.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!scheduler.cancel(9999));
    }

    #[tokio::test]
    async fn events_arrive_in_order() {
        let scheduler = Scheduler::new(Arc::new(EchoExecutor));
        let mut handle = scheduler.submit(request()).unwrap();

        assert!(matches!(
            handle.next_event().await,
            Some(JobEvent::Queued { position: 0 })
        ));
        assert!(matches!(handle.next_event().await, Some(JobEvent::Started)));
        assert!(matches!(
            handle.next_event().await,
            Some(JobEvent::Progress {
                phase: JobPhase::Recognizing
            })
        ));
        assert!(matches!(
            handle.next_event().await,
            Some(JobEvent::Done { .. })
        ));
    }

    #[tokio::test]
    async fn event_stream_walks_the_state_machine() {
        let scheduler = Scheduler::new(Arc::new(EchoExecutor));
        let mut handle = scheduler.submit(request()).unwrap();

        let mut states = Vec::new();
        while let Some(event) = handle.next_event().await {
            states.push(event.state());
            if matches!(event, JobEvent::Done { .. }) {
                break;
            }
        }
        assert_eq!(
            states,
            vec![
                JobState::Queued,
                JobState::Running,
                JobState::Running,
                JobState::Done
            ]
        );
    }

    #[tokio::test]
    async fn shutdown_drains_queued_jobs() {
        let scheduler = Scheduler::new(Arc::new(EchoExecutor));
        let first = scheduler.submit(request()).unwrap();
        let second = scheduler.submit(request()).unwrap();
        scheduler.shutdown().await;

        assert!(matches!(first.wait().await, JobOutcome::Done(_)));
        assert!(matches!(second.wait().await, JobOutcome::Done(_)));
    }

    /// Executor that sleeps, used to keep jobs queued behind a slow one.
    struct SlowExecutor {
        delay: std::time::Duration,
    }

    impl SlowExecutor {
        fn new(delay: std::time::Duration) -> Self {
            Self { delay }
        }
    }

    #[async_trait::async_trait]
    impl JobExecutor for SlowExecutor {
        async fn execute(&self, ctx: &JobContext) -> Result<JobOutput> {
            tokio::time::sleep(self.delay).await;
            Ok(JobOutput {
                text: format!("job {}", ctx.id),
                sync: None,
            })
        }
    }
}
