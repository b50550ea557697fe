//! Infrastructure layer
//!
//! Handles filesystem discovery, platform directories and external processes.

pub mod dirs;
pub mod discovery;
pub mod process;
