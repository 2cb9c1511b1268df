//! The client for the remote finance API that owns all durable data.

mod client;
pub mod types;

pub use client::ApiClient;

/// The ways a call to the remote API can fail.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read, e.g.
    /// the API is down or the request timed out.
    #[error("could not reach the API: {0}")]
    Request(String),

    /// The API answered with a non-success status code.
    ///
    /// `message` is the response body, or the canonical reason for the status
    /// code if the body was empty.
    #[error("the API responded with {status}: {message}")]
    Status { status: u16, message: String },

    /// The API rejected the session token, the user must log in again.
    #[error("the API rejected the session token")]
    Unauthorized,

    /// The response body did not have the expected shape.
    #[error("unexpected response from the API: {0}")]
    InvalidResponse(String),
}
