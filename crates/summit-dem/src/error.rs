//! Error types for the terrain crate.

use thiserror::Error;

/// Errors that can occur while sampling, fetching or projecting terrain grids.
#[derive(Debug, Error)]
pub enum DemError {
    /// Bad grid parameters, mismatched grid shapes or an invalid fetch configuration.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The elevation service could not be reached or answered with a non-success HTTP status.
    #[error("Elevation service unavailable ({}): {body}", status_label(.status))]
    ServiceUnavailable {
        /// HTTP status code, if a response was received at all.
        status: Option<u16>,
        /// Leading part of the response body, or the transport error message.
        body: String,
    },

    /// The elevation service responded but reported a failure or returned malformed data.
    #[error("Elevation service error {status}: {message}")]
    ServiceError {
        /// Service-reported status string (e.g. `OVER_QUERY_LIMIT`).
        status: String,
        /// Service-reported or locally generated diagnostic message.
        message: String,
    },

    /// The caller cancelled the fetch between two batches.
    #[error("Elevation fetch cancelled after {completed_batches} of {total_batches} batches")]
    Cancelled {
        /// Number of batches that completed before cancellation.
        completed_batches: usize,
        /// Total number of batches that were planned.
        total_batches: usize,
    },
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no response".to_string(),
    }
}

impl DemError {
    /// Build a malformed-response error for data the service should never send.
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        DemError::ServiceError {
            status: "INVALID_RESPONSE".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_unavailable_display() {
        let err = DemError::ServiceUnavailable {
            status: Some(403),
            body: "forbidden".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Elevation service unavailable (HTTP 403): forbidden"
        );

        let err = DemError::ServiceUnavailable {
            status: None,
            body: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Elevation service unavailable (no response): connection refused"
        );
    }

    #[test]
    fn test_malformed_uses_invalid_response_status() {
        match DemError::malformed("bad") {
            DemError::ServiceError { status, message } => {
                assert_eq!(status, "INVALID_RESPONSE");
                assert_eq!(message, "bad");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
