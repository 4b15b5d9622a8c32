//! busyfeed command-line binary internals.
//!
//! The binary wires the pipeline together: load configuration, resolve the
//! query window and reference zone, process each configured resource into
//! busy periods, synthesize the output calendar, write the artifact and
//! optionally upload it.

pub mod artifact;
pub mod cli;
pub mod config;
pub mod error;
pub mod run;
pub mod upload;
