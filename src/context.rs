use std::path::PathBuf;

/// Per-invocation settings, resolved once in `main` and threaded through
/// every command. Nothing below this layer touches the environment or the
/// current directory.
pub struct ProjectContext {
    /// Path to the local catalog file.
    pub config: PathBuf,
    /// Suppress non-essential output.
    pub quiet: bool,
}
