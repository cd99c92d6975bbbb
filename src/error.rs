//! Error types used by pins, nodes and node results.
//!
//! This module defines four error enums:
//!
//! - [`PinError`] — token delivery/consumption errors, reported synchronously to the caller.
//! - [`NodeError`] — errors raised while building or driving a node's lifecycle.
//! - [`ActionError`] — failures of user logic inside a firing (terminal for the node).
//! - [`ResultError`] — what a reader of a node or dataflow result observes.
//!
//! All of them provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by pin operations.
///
/// Producer-side errors are local: they fail the offending call and never
/// change the state of the owning node.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PinError {
    /// A single-slot pin already holds a token that has not been consumed.
    #[error("pin already holds a token")]
    AlreadySet,

    /// A token was posted to a stream after it was closed.
    #[error("stream is closed")]
    ClosedStream,

    /// A negative permit delta was passed to a counting pin.
    #[error("illegal permit delta {delta}")]
    IllegalArgument {
        /// The rejected delta.
        delta: i64,
    },

    /// A second pushback was requested before the first one was consumed.
    #[error("a pushed back token is already pending")]
    PushbackPending,

    /// The pin holds no token.
    #[error("pin holds no token")]
    Empty,

    /// The pin id was not registered by the node it was used with.
    #[error("pin does not belong to this node")]
    ForeignPin,
}

impl PinError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pinflow::PinError;
    ///
    /// assert_eq!(PinError::ClosedStream.as_label(), "pin_closed_stream");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PinError::AlreadySet => "pin_already_set",
            PinError::ClosedStream => "pin_closed_stream",
            PinError::IllegalArgument { .. } => "pin_illegal_argument",
            PinError::PushbackPending => "pin_pushback_pending",
            PinError::Empty => "pin_empty",
            PinError::ForeignPin => "pin_foreign",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PinError::IllegalArgument { delta } => format!("illegal permit delta: {delta}"),
            other => other.to_string(),
        }
    }
}

/// # Errors produced by node construction and lifecycle calls.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// More pins were registered than the readiness mask can track.
    #[error("pin capacity exceeded (limit {limit})")]
    CapacityExceeded {
        /// Maximum number of pins per node, control pin included.
        limit: usize,
    },

    /// The operation is only allowed before `start()`.
    #[error("node is already started")]
    AlreadyStarted,

    /// Subscribers need a tokio runtime to run their workers.
    #[error("no tokio runtime available for {what}")]
    NoRuntime {
        /// What needed the runtime.
        what: &'static str,
    },
}

impl NodeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pinflow::NodeError;
    ///
    /// let err = NodeError::CapacityExceeded { limit: 64 };
    /// assert_eq!(err.as_label(), "node_capacity_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            NodeError::CapacityExceeded { .. } => "node_capacity_exceeded",
            NodeError::AlreadyStarted => "node_already_started",
            NodeError::NoRuntime { .. } => "node_no_runtime",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            NodeError::CapacityExceeded { limit } => format!("at most {limit} pins per node"),
            other => other.to_string(),
        }
    }
}

/// # Errors produced by user logic during a firing.
///
/// Any of these stops the node for good: there is no automatic retry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// User logic reported a failure.
    #[error("action failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// A consumer-side pin call failed inside the action.
    #[error("pin error: {0}")]
    Pin(#[from] PinError),

    /// User logic panicked; the panic was caught at the node boundary.
    #[error("action panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl ActionError {
    /// Shorthand for [`ActionError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ActionError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pinflow::ActionError;
    ///
    /// assert_eq!(ActionError::fail("boom").as_label(), "action_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Fail { .. } => "action_failed",
            ActionError::Pin(_) => "action_pin_error",
            ActionError::Panicked { .. } => "action_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActionError::Fail { error } => format!("error: {error}"),
            ActionError::Pin(e) => format!("pin: {}", e.as_message()),
            ActionError::Panicked { info } => format!("panic: {info}"),
        }
    }
}

/// # Errors observed by readers of a result.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResultError {
    /// The producing node failed.
    #[error("node failed: {0}")]
    Failed(#[from] ActionError),

    /// The node stopped without producing a value.
    #[error("node stopped without a result")]
    Stopped,

    /// Waiting for the result exceeded the given timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The result was requested from a node that was never started.
    #[error("node is not started")]
    NotStarted,
}

impl ResultError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ResultError::Failed(_) => "result_failed",
            ResultError::Stopped => "result_stopped",
            ResultError::Timeout { .. } => "result_timeout",
            ResultError::NotStarted => "result_not_started",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ResultError::Failed(e) => e.as_message(),
            ResultError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            other => other.to_string(),
        }
    }

    /// Returns `true` if the result will never become available.
    ///
    /// Only [`ResultError::Timeout`] is transient: waiting again may succeed.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResultError::Timeout { .. })
    }
}
