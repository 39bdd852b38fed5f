//! engine::outcome
//!
//! Error taxonomy and the result type threaded through every dispatch.
//!
//! # Design
//!
//! A dispatch ends in exactly one of three ways, modelled by [`Outcome`]:
//!
//! - `Proceed(T)`: the operation ran (or was previewed)
//! - `Aborted`: the user declined a confirmation; nothing was mutated
//! - `Failed(EngineError)`: a terminal error for this invocation
//!
//! Inside the dispatcher, steps return `Result<T, Halt>` so `?` can stop the
//! state machine at any point; the public entry points convert that into an
//! `Outcome`.

use serde::Serialize;
use thiserror::Error;

use crate::api::TransportError;
use crate::core::payload::PayloadError;
use crate::ui::prompts::PromptError;

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for every engine error.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when the user declined a confirmation.
pub const EXIT_ABORTED: i32 = 9;

/// One row of an ambiguous match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub id: u64,
    pub name: String,
}

/// Terminal errors for one invocation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Identifier resolution found zero matches.
    #[error("{kind} not found for '{token}'")]
    NotFound { kind: String, token: String },

    /// Identifier resolution found more than one match.
    #[error("{kind} '{token}' is ambiguous: {} matches found", .candidates.len())]
    Ambiguous {
        kind: String,
        token: String,
        candidates: Vec<Candidate>,
    },

    /// A capability flag on the parent's type is false.
    #[error("{feature} not supported for {type_name}")]
    Unsupported { feature: String, type_name: String },

    /// The assembled payload was empty.
    #[error("{0}")]
    NoOp(String),

    /// User input that cannot be turned into a request.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Remote(#[from] TransportError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl EngineError {
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }

    /// Whether the user should be pointed at `--help`.
    pub fn wants_usage(&self) -> bool {
        matches!(self, EngineError::NoOp(_) | EngineError::Validation(_))
    }
}

/// How a dispatch ended.
#[derive(Debug)]
pub enum Outcome<T> {
    Proceed(T),
    Aborted,
    Failed(EngineError),
}

impl<T> Outcome<T> {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Outcome::Proceed(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Proceed(value) => Outcome::Proceed(f(value)),
            Outcome::Aborted => Outcome::Aborted,
            Outcome::Failed(err) => Outcome::Failed(err),
        }
    }

    /// The value, if the dispatch proceeded.
    pub fn proceeded(self) -> Option<T> {
        match self {
            Outcome::Proceed(value) => Some(value),
            _ => None,
        }
    }

    /// The error, if the dispatch failed.
    pub fn failure(&self) -> Option<&EngineError> {
        match self {
            Outcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Early exit from a dispatcher step.
#[derive(Debug)]
pub(crate) enum Halt {
    Aborted,
    Failed(EngineError),
}

impl From<EngineError> for Halt {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Prompt(PromptError::Cancelled) => Halt::Aborted,
            err => Halt::Failed(err),
        }
    }
}

impl From<TransportError> for Halt {
    fn from(err: TransportError) -> Self {
        Halt::Failed(err.into())
    }
}

impl From<PayloadError> for Halt {
    fn from(err: PayloadError) -> Self {
        Halt::Failed(err.into())
    }
}

impl From<PromptError> for Halt {
    fn from(err: PromptError) -> Self {
        EngineError::from(err).into()
    }
}

impl<T> From<Result<T, Halt>> for Outcome<T> {
    fn from(result: Result<T, Halt>) -> Self {
        match result {
            Ok(value) => Outcome::Proceed(value),
            Err(Halt::Aborted) => Outcome::Aborted,
            Err(Halt::Failed(err)) => Outcome::Failed(err),
        }
    }
}
