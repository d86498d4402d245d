//! # Error Types
//!
//! This module defines error types used throughout the cardstock library.

use thiserror::Error;

/// Main error type for cardstock operations
#[derive(Debug, Error)]
pub enum CardstockError {
    /// Transport-level errors (connection refused, DNS, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The template service answered with a non-success status
    #[error("Template service returned HTTP {status} for '{template_id}'")]
    Status { template_id: String, status: u16 },

    /// The template service did not answer within the request budget
    #[error("Template service timed out for '{0}'")]
    Timeout(String),

    /// The response parsed as JSON but had no usable project payload
    #[error("Malformed template response: {0}")]
    Shape(String),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither the service nor the bundled fallbacks could provide a template
    #[error("No template available for '{template_id}'")]
    NoTemplate { template_id: String },

    /// An edit addressed an element id that does not exist on the active side
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    /// A text edit addressed an image element
    #[error("Element '{0}' is not a text element")]
    NotText(String),

    /// Image asset download or decode failure
    #[error("Asset error: {0}")]
    Asset(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CardstockError {
    /// True for errors the loader recovers from by using a bundled template.
    pub fn is_recoverable_fetch(&self) -> bool {
        matches!(
            self,
            CardstockError::Transport(_)
                | CardstockError::Status { .. }
                | CardstockError::Timeout(_)
                | CardstockError::Shape(_)
                | CardstockError::Json(_)
        )
    }
}
