//! Work-stealing search pool.
//!
//! Workers pop search states from their own LIFO deque, falling back to the
//! shared injector and then to stealing from each other. Completed states go
//! over a channel to one consumer thread that calls the handler. The
//! controlling thread waits for the pending counter to reach zero, for the
//! sample to fill up, or for an external cancel.
//!
//! `pending` counts states queued or emitted but not yet fully processed.
//! It is incremented before a state becomes visible and decremented once its
//! expansion (or, for output, its handling) is done, so zero means the
//! search is over.

use crossbeam_channel::{Receiver, Sender};
use crossbeam_deque::{Injector, Steal, Stealer, Worker};
use parking_lot::{Condvar, Mutex};
use rand::seq::SliceRandom;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::automaton::{Automaton, StateId};
use crate::trace::{debug, trace};
use crate::work::{CompletedState, WorkInProgress};

type Task<'a> = Arc<WorkInProgress<'a>>;

#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    expanded: AtomicU64,
    emitted: AtomicU64,
    steals: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerMetricsSnapshot {
    pub expanded: u64,
    pub emitted: u64,
    pub steals: u64,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_expanded(&self) {
        self.expanded.fetch_add(1, Ordering::Relaxed);
    }

    fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_steal(&self) {
        self.steals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SchedulerMetricsSnapshot {
        SchedulerMetricsSnapshot {
            expanded: self.expanded.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            steals: self.steals.load(Ordering::Relaxed),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Completed states handed to the handler.
    pub found: usize,
    /// The sample size was reached.
    pub sampled: bool,
    /// Stopped by the external cancel flag.
    pub cancelled: bool,
    pub metrics: SchedulerMetricsSnapshot,
}

pub struct Scheduler {
    threads: usize,
    sample: Option<usize>,
    random: bool,
    poll_interval: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl Scheduler {
    pub fn new(threads: usize, poll_interval: Duration) -> Self {
        Self {
            threads: threads.max(1),
            sample: None,
            random: false,
            poll_interval,
            cancel: None,
        }
    }

    /// Stop once `n` completed states have been handled.
    pub fn with_sample(mut self, sample: Option<usize>) -> Self {
        self.sample = sample;
        self
    }

    /// Shuffle candidate letters and edges at every expansion.
    pub fn with_random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }

    /// Abandon the run as soon as `flag` is set.
    pub fn with_cancel(mut self, flag: Option<Arc<AtomicBool>>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Search from `seeds` until exhausted, sampled or cancelled.
    ///
    /// `handler` runs on a dedicated thread, one completed state at a time.
    pub fn run<'a, F>(
        &self,
        automaton: &'a Automaton,
        seeds: Vec<WorkInProgress<'a>>,
        handler: F,
    ) -> RunOutcome
    where
        F: FnMut(CompletedState<'a>) + Send,
    {
        if self.sample == Some(0) {
            return RunOutcome {
                sampled: true,
                ..RunOutcome::default()
            };
        }

        let injector = Injector::new();
        let pending = AtomicUsize::new(seeds.len());
        for seed in seeds {
            injector.push(Arc::new(seed));
        }

        let shared = Shared {
            automaton,
            injector,
            pending,
            stop: AtomicBool::new(false),
            found: AtomicUsize::new(0),
            sampled: AtomicBool::new(false),
            idle: Mutex::new(()),
            wake: Condvar::new(),
            metrics: SchedulerMetrics::new(),
            random: self.random,
        };

        let workers: Vec<Worker<Task<'a>>> =
            (0..self.threads).map(|_| Worker::new_lifo()).collect();
        let stealers: Vec<Stealer<Task<'a>>> = workers.iter().map(|w| w.stealer()).collect();
        let (tx, rx) = crossbeam_channel::unbounded();

        let mut cancelled = false;
        thread::scope(|scope| {
            for worker in workers {
                let shared = &shared;
                let stealers = &stealers;
                let output = tx.clone();
                scope.spawn(move || shared.work(worker, stealers, output));
            }
            drop(tx);

            let shared_ref = &shared;
            let sample = self.sample;
            scope.spawn(move || shared_ref.consume(rx, sample, handler));

            cancelled = shared.wait(self.poll_interval, self.cancel.as_deref());
        });

        RunOutcome {
            found: shared.found.load(Ordering::Acquire),
            sampled: shared.sampled.load(Ordering::Acquire),
            cancelled,
            metrics: shared.metrics.snapshot(),
        }
    }
}

/// State every thread of one run reads.
struct Shared<'a> {
    automaton: &'a Automaton,
    injector: Injector<Task<'a>>,
    pending: AtomicUsize,
    stop: AtomicBool,
    found: AtomicUsize,
    sampled: AtomicBool,
    idle: Mutex<()>,
    wake: Condvar,
    metrics: SchedulerMetrics,
    random: bool,
}

impl<'a> Shared<'a> {
    /// Block the controlling thread until the run is over. Returns whether
    /// it ended by external cancellation.
    fn wait(&self, poll_interval: Duration, cancel: Option<&AtomicBool>) -> bool {
        let mut cancelled = false;
        let mut guard = self.idle.lock();
        while !self.stop.load(Ordering::Acquire) && self.pending.load(Ordering::Acquire) != 0 {
            if cancel.map_or(false, |c| c.load(Ordering::Acquire)) {
                cancelled = true;
                break;
            }
            self.wake.wait_for(&mut guard, poll_interval);
        }
        drop(guard);
        self.stop.store(true, Ordering::Release);
        cancelled
    }

    fn notify(&self) {
        let _guard = self.idle.lock();
        self.wake.notify_all();
    }

    /// Mark one unit of work finished.
    fn finish_one(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.notify();
        }
    }

    fn work(
        &self,
        local: Worker<Task<'a>>,
        stealers: &[Stealer<Task<'a>>],
        output: Sender<Task<'a>>,
    ) {
        trace!("worker started");
        let mut rng = rand::thread_rng();
        loop {
            if self.stop.load(Ordering::Acquire) {
                break;
            }
            let task = local
                .pop()
                .or_else(|| self.steal_task(&local, stealers));
            match task {
                Some(state) => {
                    self.expand(state, &local, &output, &mut rng);
                    self.metrics.record_expanded();
                    self.finish_one();
                }
                None => {
                    if self.pending.load(Ordering::Acquire) == 0 {
                        break;
                    }
                    thread::yield_now();
                }
            }
        }
        trace!("worker stopped");
    }

    fn steal_task(
        &self,
        local: &Worker<Task<'a>>,
        stealers: &[Stealer<Task<'a>>],
    ) -> Option<Task<'a>> {
        loop {
            match self.injector.steal_batch_and_pop(local) {
                Steal::Success(task) => return Some(task),
                Steal::Retry => continue,
                Steal::Empty => break,
            }
        }

        for stealer in stealers {
            loop {
                match stealer.steal_batch_and_pop(local) {
                    Steal::Success(task) => {
                        self.metrics.record_steal();
                        return Some(task);
                    }
                    Steal::Retry => continue,
                    Steal::Empty => break,
                }
            }
        }

        None
    }

    fn push(&self, local: &Worker<Task<'a>>, state: WorkInProgress<'a>) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        local.push(Arc::new(state));
    }

    fn emit(&self, output: &Sender<Task<'a>>, state: Task<'a>) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.metrics.record_emitted();
        if output.send(state).is_err() {
            // Consumer already left after filling the sample.
            self.finish_one();
        }
    }

    /// One step of the search.
    ///
    /// With letters left: descend into every trie child whose letter is
    /// still available, and if a word ends here, start the next word at each
    /// Terminal successor. With no letters left: emit if a word ends here
    /// and End is a successor.
    fn expand<R: rand::Rng>(
        &self,
        state: Task<'a>,
        local: &Worker<Task<'a>>,
        output: &Sender<Task<'a>>,
        rng: &mut R,
    ) {
        let automaton = self.automaton;
        let trie = state.trie();
        let count = state.count();

        if count.is_empty() {
            let reaches_end = automaton
                .edges(state.node())
                .iter()
                .any(|&e| automaton.is_end(e));
            if trie.is_terminal() && reaches_end {
                self.emit(output, state);
            }
            return;
        }

        let mut letters: SmallVec<[usize; 32]> = trie
            .jump_list()
            .iter()
            .copied()
            .filter(|&i| count.has(i))
            .collect();
        if self.random {
            letters.shuffle(rng);
        }
        for i in letters {
            if let (Some(child), Some(next)) = (trie.child(i), count.decrement(i)) {
                self.push(local, state.descend(child, next));
            }
        }

        if trie.is_terminal() {
            let mut edges: SmallVec<[StateId; 8]> =
                SmallVec::from_slice(automaton.edges(state.node()));
            if self.random {
                edges.shuffle(rng);
            }
            for e in edges {
                if let Some(root) = automaton.trie(e) {
                    self.push(local, state.cross(e, root));
                }
            }
        }
    }

    fn consume<F>(&self, rx: Receiver<Task<'a>>, sample: Option<usize>, mut handler: F)
    where
        F: FnMut(CompletedState<'a>),
    {
        while let Ok(state) = rx.recv() {
            if self.stop.load(Ordering::Acquire) {
                break;
            }
            handler(CompletedState::new(state));
            let found = self.found.fetch_add(1, Ordering::AcqRel) + 1;
            if sample.map_or(false, |n| found >= n) {
                debug!(found, "sample complete");
                self.sampled.store(true, Ordering::Release);
                self.stop.store(true, Ordering::Release);
                self.notify();
                break;
            }
            self.finish_one();
        }
    }
}

#[cfg(test)]
#[path = "tests/scheduler.rs"]
mod tests;
