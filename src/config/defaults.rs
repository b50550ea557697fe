//! Default configuration values

/// Per-project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "eco.toml";

/// Directory (inside a project) holding its worktrees
pub const WORKTREES_DIR: &str = ".worktrees";

/// Git metadata entry marking a directory as a project
pub const GIT_DIR: &str = ".git";

/// Build command used when a project does not declare one
pub const DEFAULT_BUILD_COMMAND: &[&str] = &["make", "build"];

/// Directories (relative to a project) exported to later waves when none are declared
pub const DEFAULT_EXPORT_DIRS: &[&str] = &["bin"];

/// Capacity of the per-wave build event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the per-job output line channel
pub const LINE_CHANNEL_CAPACITY: usize = 64;

/// How long to wait for a killed build to be reaped (in milliseconds)
pub const KILL_WAIT_MS: u64 = 2000;

/// Live display refresh interval (in milliseconds)
pub const UI_TICK_MS: u64 = 100;

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
