//! Sweep engine: partitioning, probing, per-range workers and result merging.
//!
//! [`scanner::Scanner`] is the entry point. Probing strategies live behind
//! [`prober::Prober`] and are built from a [`sweepr_common::config::Config`]
//! through [`prober::build_prober`].

pub mod aggregate;
pub mod network;
pub mod partition;
pub mod prober;
pub mod report;
pub mod scanner;
pub mod worker;
