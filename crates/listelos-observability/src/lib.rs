// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # listelos-observability
//!
//! Logging infrastructure shared by the model crates and the trial tool.
//!
//! Provides per-crate debug flags and a single `init_logging` entry point.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &["listelos", "listelos-config", "listelos-model"];
