//! Core build orchestration
//!
//! Scope resolution, wave scheduling and bounded-concurrency execution.
//! Filesystem walking and process spawning live in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`project`] - Discovered project nodes and their hierarchy kinds
//! - [`project_config`] - Per-project `eco.toml`
//! - [`global_config`] - User-level defaults
//! - [`settings`] - Layered build settings
//! - [`scope`] - Which projects the working directory applies to
//! - [`select`] - `--filter` / `--exclude` name patterns
//! - [`job`] - Build jobs and results
//! - [`event`] - Build event contract consumed by every front end
//! - [`scheduler`] - Dependency wave scheduling
//! - [`executor`] - Bounded-concurrency execution of one wave
//! - [`orchestrator`] - Sequential wave dispatch and result aggregation

pub mod event;
pub mod executor;
pub mod global_config;
pub mod job;
pub mod orchestrator;
pub mod project;
pub mod project_config;
pub mod scheduler;
pub mod scope;
pub mod select;
pub mod settings;
