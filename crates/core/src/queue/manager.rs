//! Queue manager driving jobs from pending to completion.

use std::collections::VecDeque;
use tracing::{debug, info};

use crate::job::{Job, JobError};

use super::types::{PollSummary, QueueStatus};

/// Receives each job exactly once after it finishes.
///
/// The callback owns reporting and must call [`Job::cleanup`].
pub type CompletionCallback<J> = Box<dyn FnMut(J) + Send>;

/// Schedules jobs in strict FIFO order, running at most `max_concurrency`
/// at once.
///
/// The manager has no background task. An external loop calls [`poll`]
/// on a cadence; all parallelism comes from the jobs' child processes.
///
/// [`poll`]: QueueManager::poll
pub struct QueueManager<J: Job> {
    pending: VecDeque<J>,
    active: Vec<J>,
    max_concurrency: usize,
    on_complete: CompletionCallback<J>,
    total_started: u64,
    total_succeeded: u64,
    total_failed: u64,
}

impl<J: Job> QueueManager<J> {
    /// Creates a manager. A concurrency of 0 is raised to 1.
    pub fn new<F>(max_concurrency: usize, on_complete: F) -> Self
    where
        F: FnMut(J) + Send + 'static,
    {
        Self {
            pending: VecDeque::new(),
            active: Vec::new(),
            max_concurrency: max_concurrency.max(1),
            on_complete: Box::new(on_complete),
            total_started: 0,
            total_succeeded: 0,
            total_failed: 0,
        }
    }

    /// Creates a manager sized to the processor count.
    pub fn with_default_concurrency<F>(on_complete: F) -> Self
    where
        F: FnMut(J) + Send + 'static,
    {
        Self::new(num_cpus::get(), on_complete)
    }

    /// Queues a job. Nothing happens until the next poll.
    pub fn add(&mut self, job: J) {
        debug!(
            "Queued job {}: {} -> {} ({} pending)",
            job.id(),
            job.request().source(),
            job.request().target_format(),
            self.pending.len() + 1
        );
        self.pending.push_back(job);
    }

    /// Reports finished jobs, then promotes pending jobs into free slots.
    ///
    /// Completion checks never block. Callbacks fire in active-list order.
    pub async fn poll(&mut self) -> PollSummary {
        let mut summary = PollSummary::default();

        let mut index = 0;
        while index < self.active.len() {
            if self.active[index].is_finished() {
                let job = self.active.remove(index);
                self.complete(job);
                summary.completed += 1;
            } else {
                index += 1;
            }
        }

        while self.active.len() < self.max_concurrency {
            let Some(mut job) = self.pending.pop_front() else {
                break;
            };
            // Remote sources are fetched here, so a slow download holds up
            // the caller for up to `staging.fetch_timeout_secs`.
            job.start().await;
            self.total_started += 1;
            self.active.push(job);
            summary.started += 1;
        }

        if summary.completed > 0 || summary.started > 0 {
            debug!(
                "Poll: {} completed, {} started, {} active, {} pending",
                summary.completed,
                summary.started,
                self.active.len(),
                self.pending.len()
            );
        }

        summary
    }

    /// True when nothing is pending or active.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.active.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Aborts every active and pending job, handing each to the callback.
    ///
    /// Active jobs whose work already finished keep their outcome. Returns
    /// the number of jobs that ended aborted.
    pub fn abort_all(&mut self) -> usize {
        let active: Vec<J> = self.active.drain(..).collect();
        let pending: Vec<J> = self.pending.drain(..).collect();

        if !active.is_empty() || !pending.is_empty() {
            info!(
                "Aborting {} active and {} pending job(s)",
                active.len(),
                pending.len()
            );
        }

        let mut aborted = 0;
        for mut job in active.into_iter().chain(pending) {
            job.abort();
            if matches!(job.error(), Some(JobError::Aborted)) {
                aborted += 1;
            }
            self.complete(job);
        }
        aborted
    }

    /// Current queue snapshot.
    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            active_jobs: self.active.len(),
            max_concurrency: self.max_concurrency,
            pending_jobs: self.pending.len(),
            total_started: self.total_started,
            total_succeeded: self.total_succeeded,
            total_failed: self.total_failed,
        }
    }

    fn complete(&mut self, job: J) {
        if job.succeeded() {
            self.total_succeeded += 1;
        } else {
            self.total_failed += 1;
        }
        (self.on_complete)(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockJob, MockJobControl};
    use std::sync::{Arc, Mutex};

    type Completed = Arc<Mutex<Vec<String>>>;

    fn manager(max: usize) -> (QueueManager<MockJob>, Completed) {
        let completed: Completed = Arc::new(Mutex::new(Vec::new()));
        let sink = completed.clone();
        let manager = QueueManager::new(max, move |mut job: MockJob| {
            sink.lock().unwrap().push(job.request().source().to_string());
            job.cleanup();
        });
        (manager, completed)
    }

    fn add(manager: &mut QueueManager<MockJob>, source: &str) -> MockJobControl {
        let (job, control) = MockJob::new(source, "ogg");
        manager.add(job);
        control
    }

    #[tokio::test]
    async fn test_idle_lifecycle() {
        let (mut manager, completed) = manager(2);
        assert!(manager.is_idle());

        let control = add(&mut manager, "/music/a.mp3");
        assert!(!manager.is_idle());
        assert!(!control.is_started());

        manager.poll().await;
        assert!(control.is_started());
        assert!(!manager.is_idle());

        control.finish_ok();
        let summary = manager.poll().await;
        assert_eq!(summary.completed, 1);
        assert!(manager.is_idle());
        assert_eq!(completed.lock().unwrap().as_slice(), ["/music/a.mp3"]);
        assert_eq!(control.cleanup_count(), 1);
    }

    #[tokio::test]
    async fn test_single_slot_promotes_on_completion() {
        let (mut manager, completed) = manager(1);
        let j1 = add(&mut manager, "j1.mp3");
        let j2 = add(&mut manager, "j2.mp3");
        let j3 = add(&mut manager, "j3.mp3");

        manager.poll().await;
        assert!(j1.is_started());
        assert!(!j2.is_started());
        assert_eq!(manager.active_len(), 1);
        assert_eq!(manager.pending_len(), 2);

        j1.finish_ok();
        let summary = manager.poll().await;
        assert_eq!(summary, PollSummary { completed: 1, started: 1 });
        assert_eq!(completed.lock().unwrap().as_slice(), ["j1.mp3"]);
        assert!(j2.is_started());
        assert!(!j3.is_started());
        assert_eq!(manager.pending_len(), 1);

        manager.poll().await;
        assert_eq!(completed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let (mut manager, _completed) = manager(3);
        let controls: Vec<_> = (0..7)
            .map(|i| add(&mut manager, &format!("t{}.flac", i)))
            .collect();

        for _ in 0..3 {
            manager.poll().await;
            assert!(manager.active_len() <= 3);
        }
        assert_eq!(controls.iter().filter(|c| c.is_started()).count(), 3);

        let mut rounds = 0;
        while !manager.is_idle() {
            for control in controls.iter().filter(|c| c.is_started()) {
                control.finish_ok();
            }
            manager.poll().await;
            assert!(manager.active_len() <= 3);
            rounds += 1;
            assert!(rounds < 10);
        }

        let status = manager.status();
        assert_eq!(status.total_started, 7);
        assert_eq!(status.total_succeeded, 7);
    }

    #[tokio::test]
    async fn test_callbacks_in_active_order() {
        let (mut manager, completed) = manager(3);
        let a = add(&mut manager, "a.mp3");
        let b = add(&mut manager, "b.mp3");
        let c = add(&mut manager, "c.mp3");
        manager.poll().await;

        c.finish_ok();
        a.finish_with_error("boom");
        manager.poll().await;
        assert_eq!(completed.lock().unwrap().as_slice(), ["a.mp3", "c.mp3"]);

        b.finish_ok();
        manager.poll().await;
        assert_eq!(completed.lock().unwrap().as_slice(), ["a.mp3", "c.mp3", "b.mp3"]);
        assert_eq!(manager.status().total_failed, 1);
    }

    #[tokio::test]
    async fn test_failed_start_does_not_block_queue() {
        let (mut manager, completed) = manager(1);
        let bad = add(&mut manager, "bad.wma");
        bad.fail_on_start();
        let good = add(&mut manager, "good.mp3");

        manager.poll().await;
        assert!(!good.is_started());

        manager.poll().await;
        assert_eq!(completed.lock().unwrap().as_slice(), ["bad.wma"]);
        assert!(good.is_started());
    }

    #[tokio::test]
    async fn test_abort_all_reports_every_job() {
        let (mut manager, completed) = manager(1);
        let running = add(&mut manager, "running.mp3");
        let waiting = add(&mut manager, "waiting.mp3");
        manager.poll().await;

        assert_eq!(manager.abort_all(), 2);
        assert!(manager.is_idle());
        assert!(running.was_aborted());
        assert!(waiting.was_aborted());
        assert_eq!(
            completed.lock().unwrap().as_slice(),
            ["running.mp3", "waiting.mp3"]
        );
        assert_eq!(manager.status().total_failed, 2);
    }

    #[tokio::test]
    async fn test_abort_all_keeps_unobserved_success() {
        let (mut manager, completed) = manager(2);
        let done = add(&mut manager, "done.mp3");
        let busy = add(&mut manager, "busy.mp3");
        manager.poll().await;

        done.finish_ok();
        assert_eq!(manager.abort_all(), 1);
        assert!(!done.was_aborted());
        assert!(busy.was_aborted());
        assert_eq!(completed.lock().unwrap().len(), 2);

        let status = manager.status();
        assert_eq!(status.total_succeeded, 1);
        assert_eq!(status.total_failed, 1);
    }

    #[test]
    fn test_zero_concurrency_raised_to_one() {
        let (manager, _completed) = manager(0);
        assert_eq!(manager.max_concurrency(), 1);

        let manager: QueueManager<MockJob> = QueueManager::with_default_concurrency(|_| {});
        assert!(manager.max_concurrency() >= 1);
    }
}
