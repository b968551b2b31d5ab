// ABOUTME: Configuration and constants for the evaluator CLI and sandbox

use std::path::PathBuf;

#[allow(dead_code)]
pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "lisp-eval-core REPL";
pub const WELCOME_SUBTITLE: &str = "A stack-driven Lisp evaluator with closures, macros, and catch/throw";

/// Fixed path the facade checks for a prelude to prepend to every program
/// (§6 "Persisted state"). Relative to the process's current directory.
pub const PRELUDE_PATH: &str = "prelude.lisp";

/// Name of the REPL history file, written alongside the current directory.
pub const HISTORY_FILE: &str = ".lisp-eval-core_history";

// ============================================================================
// I/O sandboxing configuration
// ============================================================================

/// Filesystem sandbox configuration for the `load` primitive and the
/// facade's prelude loader (SPEC_FULL.md §10).
#[derive(Debug, Clone)]
pub struct FsConfig {
    pub allowed_paths: Vec<PathBuf>,
    pub max_file_size: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            allowed_paths: vec![PathBuf::from(".")],
            // Default max file size: 10MB.
            max_file_size: 10 * 1024 * 1024,
        }
    }
}
