//! Error types used by the service core and its collaborators.
//!
//! This module defines three error enums:
//!
//! - [`ServiceError`]: a single request (or completion) could not be handled.
//! - [`DeliveryError`]: a payload could not be pushed to a caller or subscriber.
//! - [`DownstreamError`]: an outbound call to a dependency could not be issued or failed.
//!
//! All of them provide `as_label` (stable snake_case for logs/metrics) and
//! `as_message` helpers. None of them ever escapes the service loop: they are
//! reported through [`Event`](crate::Event)s and otherwise swallowed.

use thiserror::Error;

/// # Errors produced while handling one request.
///
/// Each of these aborts the operation it belongs to and nothing else; the
/// caller gets no reply.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The payload is not valid JSON or does not match what the method expects.
    #[error("malformed payload: {reason}")]
    Malformed {
        /// Parser or schema message.
        reason: String,
    },

    /// A field the operation needs is absent or has the wrong type.
    #[error("missing field '{field}'")]
    MissingField {
        /// Name of the field.
        field: String,
    },

    /// No handler is registered under this method name.
    #[error("unknown method '{method}'")]
    UnknownMethod {
        /// The requested method name.
        method: String,
    },

    /// The service loop is gone (all commands are rejected).
    #[error("service closed")]
    Closed,

    /// The command queue is full (try again later or use the async `submit`).
    #[error("command queue full")]
    Full,
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickrelay::ServiceError;
    ///
    /// let err = ServiceError::UnknownMethod { method: "nope".into() };
    /// assert_eq!(err.as_label(), "unknown_method");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Malformed { .. } => "malformed_payload",
            ServiceError::MissingField { .. } => "missing_field",
            ServiceError::UnknownMethod { .. } => "unknown_method",
            ServiceError::Closed => "service_closed",
            ServiceError::Full => "command_queue_full",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ServiceError::Malformed { reason } => format!("malformed: {reason}"),
            ServiceError::MissingField { field } => format!("missing field: {field}"),
            ServiceError::UnknownMethod { method } => format!("unknown method: {method}"),
            ServiceError::Closed => "service closed".to_string(),
            ServiceError::Full => "command queue full".to_string(),
        }
    }

    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        ServiceError::Malformed {
            reason: err.to_string(),
        }
    }
}

/// # Errors produced when pushing a payload to a reply sink.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The receiving side has gone away (connection dropped).
    #[error("recipient closed")]
    Closed,

    /// The recipient's buffer is full; the payload was dropped.
    #[error("recipient queue full")]
    Full,

    /// The sink refused the payload for another reason.
    #[error("delivery rejected: {reason}")]
    Rejected {
        /// Sink-specific message.
        reason: String,
    },
}

impl DeliveryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::Closed => "delivery_closed",
            DeliveryError::Full => "delivery_full",
            DeliveryError::Rejected { .. } => "delivery_rejected",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DeliveryError::Closed => "recipient closed".to_string(),
            DeliveryError::Full => "recipient queue full".to_string(),
            DeliveryError::Rejected { reason } => format!("rejected: {reason}"),
        }
    }
}

/// # Errors produced by a downstream dependency.
///
/// Neither variant is retried; the waiting caller is abandoned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownstreamError {
    /// The call could not be issued at all.
    #[error("downstream unavailable: {reason}")]
    Unavailable {
        /// Why the call could not be issued.
        reason: String,
    },

    /// The dependency accepted the call but answered with an error.
    #[error("downstream rejected call: {reason}")]
    Rejected {
        /// Error text reported by the dependency.
        reason: String,
    },
}

impl DownstreamError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickrelay::DownstreamError;
    ///
    /// let err = DownstreamError::Unavailable { reason: "no runtime".into() };
    /// assert_eq!(err.as_label(), "downstream_unavailable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DownstreamError::Unavailable { .. } => "downstream_unavailable",
            DownstreamError::Rejected { .. } => "downstream_rejected",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DownstreamError::Unavailable { reason } => format!("unavailable: {reason}"),
            DownstreamError::Rejected { reason } => format!("rejected: {reason}"),
        }
    }
}
