//! HTTP client for the Spool studio server.
//!
//! One [`SpoolApi`] instance implements both transport seams: the chunked
//! upload endpoints consumed by `spool-uploader` and the processing
//! endpoints consumed by `spool-processing`.

pub mod client;

pub use client::SpoolApi;
