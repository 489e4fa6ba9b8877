//! lmsp library crate: the pieces behind the `lmsp` binary.
//!
//! The merge engine lives in `lmsp-core` and file I/O in `lmsp-archive`.
//! This crate adds what the command line needs around them: configuration,
//! telemetry setup, project loading and saving, stack selection and console
//! reporting. It is exposed as a library so integration tests can drive
//! those pieces without going through the CLI.

pub mod config;
pub mod format;
pub mod project;
pub mod report;
pub mod select;
pub mod telemetry;
