// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Deterministic Virtual Clock
//!
//! Virtual time plus a due-time-ordered queue of scheduled tasks. Time moves
//! only through [`VirtualClock::advance`] and [`VirtualClock::run_until_idle`].
//!
//! ## Ordering
//!
//! Tasks run in non-decreasing due time; ties run in scheduling order. Before
//! each task runs, `now()` is set to its due time. After each task the clock
//! yields to the runtime a fixed number of times so that work spawned by the
//! task settles before the next task is examined.
//!
//! That settling is only guaranteed on a current-thread runtime, where a
//! yield hands the single worker to every ready task in turn. On a
//! multi-thread runtime spawned work may still be running on another worker
//! when the next task starts; the clock logs a warning once when it is driven
//! from one. Replays belong on `#[tokio::main(flavor = "current_thread")]`
//! or a `new_current_thread()` runtime.
//!
//! ```text
//! schedule(200), schedule(100), schedule(150); advance(300)
//!   → runs 100, 150, 200; now == start + 300
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use parking_lot::Mutex;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{trace, warn};

use crate::domain::clock::{Clock, ScheduledTask};

const DRAIN_ROUNDS: usize = 32;

struct QueuedTask {
    due_ms: i64,
    seq: u64,
    task: ScheduledTask,
}

// Reversed so that `BinaryHeap` pops the earliest (due, seq) first.
impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

struct ClockState {
    now_ms: i64,
    next_seq: u64,
    queue: BinaryHeap<QueuedTask>,
}

pub struct VirtualClock {
    state: Mutex<ClockState>,
    warned_multi_thread: AtomicBool,
}

/// True when called from inside a current-thread tokio runtime.
pub fn on_current_thread_runtime() -> bool {
    Handle::try_current().is_ok_and(|handle| handle.runtime_flavor() == RuntimeFlavor::CurrentThread)
}

impl VirtualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            state: Mutex::new(ClockState {
                now_ms: start_ms,
                next_seq: 0,
                queue: BinaryHeap::new(),
            }),
            warned_multi_thread: AtomicBool::new(false),
        }
    }

    /// Number of tasks still queued.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn next_due_ms(&self) -> Option<i64> {
        self.state.lock().queue.peek().map(|t| t.due_ms)
    }

    /// Runs every task due within `delta_ms`, including tasks scheduled by
    /// earlier tasks inside the window, then sets `now` to `start + delta_ms`.
    /// Returns the number of tasks run.
    pub async fn advance(&self, delta_ms: u64) -> usize {
        let target = {
            let state = self.state.lock();
            state.now_ms.saturating_add(i64::try_from(delta_ms).unwrap_or(i64::MAX))
        };

        let mut ran = 0;
        while let Some(task) = self.pop_due(Some(target)) {
            self.run(task).await;
            ran += 1;
        }

        self.state.lock().now_ms = target;
        ran
    }

    /// Runs tasks until the queue is empty. `now` ends at the due time of the
    /// last task run. Returns the number of tasks run.
    pub async fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop_due(None) {
            self.run(task).await;
            ran += 1;
        }
        ran
    }

    fn check_runtime(&self) {
        if !on_current_thread_runtime() && !self.warned_multi_thread.swap(true, AtomicOrdering::Relaxed) {
            warn!("Virtual clock driven outside a current-thread runtime; task ordering may not be reproducible");
        }
    }

    fn pop_due(&self, limit: Option<i64>) -> Option<QueuedTask> {
        let mut state = self.state.lock();
        let eligible = state
            .queue
            .peek()
            .is_some_and(|next| limit.is_none_or(|limit| next.due_ms <= limit));
        if !eligible {
            return None;
        }
        let task = state.queue.pop()?;
        state.now_ms = state.now_ms.max(task.due_ms);
        Some(task)
    }

    async fn run(&self, queued: QueuedTask) {
        self.check_runtime();
        trace!(due_ms = queued.due_ms, seq = queued.seq, "Running scheduled task");
        (queued.task)().await;
        drain_continuations().await;
    }
}

async fn drain_continuations() {
    for _ in 0..DRAIN_ROUNDS {
        tokio::task::yield_now().await;
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> i64 {
        self.state.lock().now_ms
    }

    fn schedule(&self, delay_ms: u64, task: ScheduledTask) {
        let mut state = self.state.lock();
        let due_ms = state
            .now_ms
            .saturating_add(i64::try_from(delay_ms).unwrap_or(i64::MAX));
        let seq = state.next_seq;
        state.next_seq += 1;
        state.queue.push(QueuedTask { due_ms, seq, task });
    }
}

impl fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VirtualClock")
            .field("now_ms", &state.now_ms)
            .field("pending", &state.queue.len())
            .finish()
    }
}
