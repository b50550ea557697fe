//! TUI (Terminal User Interface) module
//!
//! Provides the interactive live view of a running build.

pub mod live;

pub use live::{run_live, LiveState};
