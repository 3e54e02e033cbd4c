//! Tagged results passed between pipeline stages
//!
//! A stage either produced its value or failed with a reason. Failures are
//! never mixed into content; they are rendered as text only by whoever
//! presents them.

use crate::utils::scrub_message;
use crate::OrderScanError;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading text out of the PDF
    Extraction,
    /// Chunked map-reduce summary
    Summarization,
    /// Structured field request and parsing
    FieldExtraction,
    /// Writing artifacts
    Saving,
}

impl Stage {
    /// Prefix used when a failure of this stage is shown to a user
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Stage::Extraction => "Error extracting text from PDF",
            Stage::Summarization => "Error processing text",
            Stage::FieldExtraction => "Error extracting fields",
            Stage::Saving => "Error saving file",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extraction => "extraction",
            Stage::Summarization => "summarization",
            Stage::FieldExtraction => "field_extraction",
            Stage::Saving => "saving",
        };
        f.write_str(name)
    }
}

/// Why a stage did not produce a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    /// Stage that failed
    pub stage: Stage,

    /// Scrubbed failure reason
    pub reason: String,
}

impl StageFailure {
    /// Build a failure; the reason is scrubbed of secrets and personal data
    pub fn new(stage: Stage, reason: impl AsRef<str>) -> Self {
        Self {
            stage,
            reason: scrub_message(reason.as_ref()),
        }
    }

    /// Failure from a library error
    pub fn from_error(stage: Stage, error: &OrderScanError) -> Self {
        Self::new(stage, error.to_string())
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage.failure_prefix(), self.reason)
    }
}

impl std::error::Error for StageFailure {}

/// Result of one stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    /// Stage produced its value
    Ready(T),
    /// Stage failed
    Failed(StageFailure),
}

impl<T> StageOutcome<T> {
    /// Convert a library result at a stage boundary
    pub fn from_result(stage: Stage, result: crate::Result<T>) -> Self {
        match result {
            Ok(value) => StageOutcome::Ready(value),
            Err(e) => StageOutcome::Failed(StageFailure::from_error(stage, &e)),
        }
    }

    /// True when the stage produced a value
    pub fn is_ready(&self) -> bool {
        matches!(self, StageOutcome::Ready(_))
    }

    /// The value, if any
    pub fn ready(&self) -> Option<&T> {
        match self {
            StageOutcome::Ready(value) => Some(value),
            StageOutcome::Failed(_) => None,
        }
    }

    /// The failure, if any
    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            StageOutcome::Ready(_) => None,
            StageOutcome::Failed(failure) => Some(failure),
        }
    }

    /// Transform the ready value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> StageOutcome<U> {
        match self {
            StageOutcome::Ready(value) => StageOutcome::Ready(f(value)),
            StageOutcome::Failed(failure) => StageOutcome::Failed(failure),
        }
    }

    /// Borrowing view
    pub fn as_ref(&self) -> StageOutcome<&T> {
        match self {
            StageOutcome::Ready(value) => StageOutcome::Ready(value),
            StageOutcome::Failed(failure) => StageOutcome::Failed(failure.clone()),
        }
    }

    /// Back to a plain result
    pub fn into_result(self) -> std::result::Result<T, StageFailure> {
        match self {
            StageOutcome::Ready(value) => Ok(value),
            StageOutcome::Failed(failure) => Err(failure),
        }
    }
}

impl<T: Serialize> Serialize for StageOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            StageOutcome::Ready(value) => {
                let mut state = serializer.serialize_struct("StageOutcome", 2)?;
                state.serialize_field("status", "ready")?;
                state.serialize_field("value", value)?;
                state.end()
            }
            StageOutcome::Failed(failure) => {
                let mut state = serializer.serialize_struct("StageOutcome", 3)?;
                state.serialize_field("status", "failed")?;
                state.serialize_field("stage", &failure.stage)?;
                state.serialize_field("reason", &failure.reason)?;
                state.end()
            }
        }
    }
}
