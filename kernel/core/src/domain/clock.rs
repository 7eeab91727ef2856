// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Time source port.
//!
//! Kernel code never reads wall time directly. Everything that needs "now" or
//! a delayed callback receives an `Arc<dyn Clock>`, so a `VirtualClock` can be
//! swapped in under simulation.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tracing::warn;

/// Deferred unit of work run by a clock once its delay elapses.
pub type ScheduledTask = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Boxes an async closure into a [`ScheduledTask`].
pub fn scheduled_task<F, Fut>(task: F) -> ScheduledTask
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move || Box::pin(task()))
}

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms()).unwrap_or_default()
    }

    /// Runs `task` once `delay_ms` milliseconds have elapsed on this clock.
    fn schedule(&self, delay_ms: u64, task: ScheduledTask);
}

/// Wall-clock time. Scheduled tasks are spawned onto the ambient tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn schedule(&self, delay_ms: u64, task: ScheduledTask) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    task().await;
                });
            }
            Err(e) => warn!(error = %e, delay_ms, "No tokio runtime; scheduled task dropped"),
        }
    }
}
