//! Payment gateway errors.

use thiserror::Error;

/// Errors that can occur when talking to a payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("payment gateway request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("payment gateway response error: {0}")]
    Response(String),

    /// Gateway answered with a non-success status.
    #[error("payment gateway API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The gateway has no payment with that id.
    #[error("payment not found: {0}")]
    NotFound(String),
}
