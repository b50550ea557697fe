//! ecoctl - meta-CLI for multi-repository ecosystems
//!
//! Discovers the member projects of an ecosystem, works out which of them
//! the current directory applies to, and builds them in dependency waves
//! with bounded parallelism.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output front ends
//! - [`core`] - Scope resolution, scheduling, execution and orchestration
//! - [`infra`] - Infrastructure layer (filesystem discovery, processes, directories)
//! - [`config`] - Configuration constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
