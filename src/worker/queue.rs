//! Serial, priority-ordered background work queue.
//!
//! One dedicated thread runs tasks one at a time. Higher priority tasks are
//! picked first; tasks of equal priority run in submission order.
//! [`WorkQueue::cancel_all`] discards every queued task and flags the
//! running one through its [`CancelToken`].

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// Scheduling priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    #[default]
    Normal,
    High,
    VeryHigh,
}

/// Lets a running task notice that the queue was cancelled.
#[derive(Clone)]
pub struct CancelToken {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

type Job = Box<dyn FnOnce(&CancelToken) + Send + 'static>;

struct Task {
    priority: Priority,
    sequence: u64,
    token: CancelToken,
    job: Job,
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    // Max-heap: higher priority first, then lower sequence first.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Default)]
struct State {
    pending: BinaryHeap<Task>,
    next_sequence: u64,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    available: Condvar,
    generation: Arc<AtomicU64>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the background worker thread.
///
/// Dropping the queue discards pending tasks, lets the running task finish
/// and joins the thread.
pub struct WorkQueue {
    shared: Arc<Shared>,
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl WorkQueue {
    /// Spawns the worker thread.
    pub fn new(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            available: Condvar::new(),
            generation: Arc::new(AtomicU64::new(0)),
        });

        let worker = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || run(&worker))?;

        tracing::debug!(queue = %name, "Work queue started");
        Ok(Self {
            shared,
            name,
            handle: Some(handle),
        })
    }

    /// Enqueues `job` with the given priority.
    pub fn submit<F>(&self, priority: Priority, job: F)
    where
        F: FnOnce(&CancelToken) + Send + 'static,
    {
        let mut state = self.shared.lock();
        if state.shutdown {
            return;
        }
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.pending.push(Task {
            priority,
            sequence,
            token: self.token(),
            job: Box::new(job),
        });
        drop(state);
        self.shared.available.notify_one();
    }

    /// Drops every queued task and cancels the running one.
    pub fn cancel_all(&self) {
        let mut state = self.shared.lock();
        let dropped = state.pending.len();
        state.pending.clear();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        drop(state);
        tracing::debug!(queue = %self.name, dropped, "Work queue cancelled");
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.shared.lock().pending.len()
    }

    fn token(&self) -> CancelToken {
        CancelToken {
            generation: self.shared.generation.load(Ordering::SeqCst),
            current: Arc::clone(&self.shared.generation),
        }
    }
}

impl fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .finish()
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
            state.pending.clear();
        }
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.available.notify_all();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(queue = %self.name, "Work queue thread panicked");
            }
        }
    }
}

fn run(shared: &Shared) {
    loop {
        let task = {
            let mut state = shared.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(task) = state.pending.pop() {
                    break task;
                }
                state = shared
                    .available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        if task.token.is_cancelled() {
            continue;
        }
        (task.job)(&task.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Blocks the worker until the returned sender fires.
    fn block_worker(queue: &WorkQueue) -> mpsc::Sender<()> {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel();
        queue.submit(Priority::Normal, move |_| {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv();
        });
        started_rx.recv_timeout(TIMEOUT).unwrap();
        release_tx
    }

    #[test]
    fn test_runs_tasks_in_priority_order() {
        let queue = WorkQueue::new("test-order").unwrap();
        let release = block_worker(&queue);

        let (tx, rx) = mpsc::channel();
        for (label, priority) in [
            ("normal-1", Priority::Normal),
            ("very-high", Priority::VeryHigh),
            ("high", Priority::High),
            ("normal-2", Priority::Normal),
        ] {
            let tx = tx.clone();
            queue.submit(priority, move |_| tx.send(label).unwrap());
        }
        assert_eq!(queue.pending(), 4);
        release.send(()).unwrap();

        let order: Vec<_> = (0..4).map(|_| rx.recv_timeout(TIMEOUT).unwrap()).collect();
        assert_eq!(order, vec!["very-high", "high", "normal-1", "normal-2"]);
    }

    #[test]
    fn test_cancel_all_drops_queued_tasks() {
        let queue = WorkQueue::new("test-cancel").unwrap();
        let release = block_worker(&queue);

        let (tx, rx) = mpsc::channel();
        let dropped = tx.clone();
        queue.submit(Priority::High, move |_| dropped.send("dropped").unwrap());
        queue.cancel_all();
        assert_eq!(queue.pending(), 0);

        queue.submit(Priority::High, move |_| tx.send("after").unwrap());
        release.send(()).unwrap();
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "after");
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_running_task_observes_cancellation() {
        let queue = WorkQueue::new("test-token").unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel::<()>();
        let (result_tx, result_rx) = mpsc::channel();

        queue.submit(Priority::VeryHigh, move |token| {
            started_tx.send(token.is_cancelled()).unwrap();
            let _ = resume_rx.recv();
            result_tx.send(token.is_cancelled()).unwrap();
        });

        assert!(!started_rx.recv_timeout(TIMEOUT).unwrap());
        queue.cancel_all();
        resume_tx.send(()).unwrap();
        assert!(result_rx.recv_timeout(TIMEOUT).unwrap());
    }

    #[test]
    fn test_drop_joins_worker() {
        let (tx, rx) = mpsc::channel();
        {
            let queue = WorkQueue::new("test-drop").unwrap();
            queue.submit(Priority::Normal, move |_| tx.send(()).unwrap());
            rx.recv_timeout(TIMEOUT).unwrap();
        }
        // The sender was moved into the task, which has been dropped with the queue.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }
}
