// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

// Log Capture - Scoped JSON subscriber feeding the golden-log verifier
//
// One line per event, flattened fields, and nothing that varies between runs:
// no timestamps, no thread ids, no targets, no span context. The subscriber is
// attached to a single future with `WithSubscriber`, so captures from tests
// running in parallel never mix.

use std::future::Future;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::instrument::WithSubscriber;
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON subscriber writing into this capture.
    pub fn dispatch(&self, max_level: LevelFilter) -> Dispatch {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .without_time()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_ansi(false)
            .with_max_level(max_level)
            .with_writer(self.clone())
            .finish();
        Dispatch::new(subscriber)
    }

    /// Runs `future` with every event at or above `max_level` captured.
    pub async fn capture<F: Future>(&self, max_level: LevelFilter, future: F) -> F::Output {
        future.with_subscriber(self.dispatch(max_level)).await
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buffer.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buffer: self.buffer.clone(),
        }
    }
}

pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
