//! Typed errors for the service and cache boundary.
//!
//! The retry policy needs to tell authentication and validation failures
//! apart from transient server/transport failures, so service calls return
//! this enum instead of an opaque report. Application-level code (startup,
//! config, session files) keeps using `color_eyre::Result`.

use thiserror::Error;

/// Error raised by an entity-service call.
///
/// Variants are `Clone` so a single failed fetch can be broadcast to every
/// caller coalesced onto the same in-flight request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
  /// 401/403 - the session is missing, expired, or lacks permission.
  #[error("{message}")]
  Auth { status: u16, message: String },

  /// Any other 4xx, or a 2xx body with `success: false`. Retrying cannot
  /// change a validation or authorization outcome.
  #[error("{message}")]
  Client { status: u16, message: String },

  /// 5xx - transient by assumption, eligible for retry.
  #[error("{message}")]
  Server { status: u16, message: String },

  /// Transport-level failure (connection refused, timeout, DNS).
  #[error("{0}")]
  Network(String),

  /// The body was not JSON or the envelope had an unexpected shape.
  #[error("{0}")]
  Malformed(String),
}

impl ApiError {
  /// Classify a non-2xx HTTP status with an extracted message.
  pub fn from_status(status: u16, message: String) -> Self {
    match status {
      401 | 403 => ApiError::Auth { status, message },
      400..=499 => ApiError::Client { status, message },
      _ => ApiError::Server { status, message },
    }
  }

  /// Whether the retry policy may attempt this call again.
  ///
  /// Auth and client errors are final; server, transport, and malformed
  /// responses may heal on a later attempt.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      ApiError::Server { .. } | ApiError::Network(_) | ApiError::Malformed(_)
    )
  }

  /// Human-readable message for the notification surface.
  ///
  /// Backend-provided messages are preferred for client errors; auth and
  /// server failures map to stable generic wording.
  pub fn user_message(&self) -> String {
    match self {
      ApiError::Auth { status: 401, .. } => {
        "Authentication required. Please log in again.".to_string()
      }
      ApiError::Auth { .. } => {
        "Access denied. You do not have permission to perform this action.".to_string()
      }
      ApiError::Client { status: 404, .. } => "The requested resource was not found.".to_string(),
      ApiError::Client { message, .. } => message.clone(),
      ApiError::Server { .. } => "Server error. Please try again later.".to_string(),
      ApiError::Network(_) => "Network error. Please check your connection.".to_string(),
      ApiError::Malformed(_) => "An unexpected error occurred. Please try again.".to_string(),
    }
  }
}
