//! Shared models for the `sweepr` workspace.
//!
//! * **[`network`]**: address validation, subnets, ranges and probe results.
//! * **[`config`]**: the scan configuration assembled by the CLI.
//! * **[`error`]**: the error taxonomy shared by every crate.

pub mod config;
pub mod error;
pub mod network;

pub use error::ScanError;
