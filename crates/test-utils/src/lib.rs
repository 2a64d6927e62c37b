//! Shared test utilities for the camx-rs workspace.
//!
//! This crate builds synthetic CAMx height/pressure byte streams with
//! predictable, verifiable payloads so tests never depend on external
//! binary fixtures.

pub mod generators;

pub use generators::*;
