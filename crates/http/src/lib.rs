//! HTTP side of beamdrop uploads.
//!
//! [`Client`] implements [`beamdrop_upload::UploadTransport`] on top of
//! `reqwest` and reads the server's advertised limits.

pub mod client;

pub use client::{Client, Error};
