// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Golden-log verification.
//!
//! A missing reference file is not a failure: the captured lines are written
//! as the new reference (bootstrap). Otherwise both sequences must have the
//! same length and be byte-identical line by line.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::SimulationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Bootstrapped { path: PathBuf, lines: usize },
    Matched { lines: usize },
}

pub struct LogVerifier;

impl LogVerifier {
    pub fn verify(actual: &[String], golden: impl AsRef<Path>) -> Result<VerifyOutcome, SimulationError> {
        let golden = golden.as_ref();

        if !golden.exists() {
            if let Some(parent) = golden.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| SimulationError::io(parent, e))?;
            }
            let mut content = actual.join("\n");
            if !actual.is_empty() {
                content.push('\n');
            }
            std::fs::write(golden, content).map_err(|e| SimulationError::io(golden, e))?;
            info!(path = %golden.display(), lines = actual.len(), "Golden file created");
            return Ok(VerifyOutcome::Bootstrapped {
                path: golden.to_path_buf(),
                lines: actual.len(),
            });
        }

        let content = std::fs::read_to_string(golden).map_err(|e| SimulationError::io(golden, e))?;
        let expected = Self::split_lines(&content);
        Self::compare(&expected, actual)?;
        Ok(VerifyOutcome::Matched { lines: actual.len() })
    }

    /// Splits on `\n` only, so a stray `\r` stays part of its line. The empty
    /// segment after a trailing newline is not a line.
    fn split_lines(content: &str) -> Vec<&str> {
        let mut lines: Vec<&str> = content.split('\n').collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }
        lines
    }

    /// Line numbers in errors are 1-based.
    pub fn compare(expected: &[&str], actual: &[String]) -> Result<(), SimulationError> {
        if expected.len() != actual.len() {
            return Err(SimulationError::LogLengthMismatch {
                expected: expected.len(),
                actual: actual.len(),
            });
        }

        if let Some((index, (want, got))) = expected
            .iter()
            .zip(actual)
            .enumerate()
            .find(|(_, (want, got))| **want != got.as_str())
        {
            return Err(SimulationError::LogLineMismatch {
                line: index + 1,
                expected: (*want).to_string(),
                actual: got.clone(),
            });
        }
        Ok(())
    }
}
