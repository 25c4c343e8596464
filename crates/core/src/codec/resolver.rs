//! Executable lookup on the search path.

use std::path::PathBuf;

/// Resolves a program name to an executable.
///
/// Used to tell "format unsupported" apart from "tool not installed" before
/// any process is spawned.
pub trait ExecutableResolver: Send + Sync {
    /// Returns the resolved executable path, if any.
    fn resolve(&self, program: &str) -> Option<PathBuf>;

    /// Whether the program can be executed.
    fn is_available(&self, program: &str) -> bool {
        self.resolve(program).is_some()
    }
}

/// Resolver backed by the `PATH` environment variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPathResolver;

impl ExecutableResolver for SearchPathResolver {
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}
