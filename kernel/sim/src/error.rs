// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

use std::path::PathBuf;

use serde_json::Value;
use tessera_core::KernelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Use case not found: {0}")]
    UnknownIntent(String),

    #[error("Query not found: {0}")]
    UnknownQuery(String),

    #[error("Malformed payload for {name}: {source}")]
    MalformedPayload {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Assertion failed for {query}. Expected {expected}, got {actual}")]
    AssertionFailed {
        query: String,
        expected: Value,
        actual: Value,
    },

    #[error("Log length mismatch. Expected {expected}, got {actual}")]
    LogLengthMismatch { expected: usize, actual: usize },

    #[error("Log mismatch at line {line}:\nExpected: {expected}\nActual:   {actual}")]
    LogLineMismatch {
        line: usize,
        expected: String,
        actual: String,
    },

    #[error("Invalid scenario {}: {message}", .path.display())]
    InvalidScenario { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

impl SimulationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
