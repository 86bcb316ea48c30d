#![forbid(unsafe_code)]

//! Dataverse Web API adapter for the solution manager core.

pub mod client;
pub mod odata;

pub use client::{api_root, DataverseClient, API_PATH, DEFAULT_TIMEOUT};
