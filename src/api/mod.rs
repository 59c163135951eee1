/// Track service access
///
/// - HTTP client and request shapes (client.rs)
/// - Error surfaced to the user on failed requests (error.rs)

pub mod client;
pub mod error;

pub use client::{ApiClient, SampleStride};
pub use error::FetchError;
