//! Typed error surface for the core. The CLI layer (`main.rs` and `commands/`) wraps these
//! with `anyhow::Context` to produce human messages; nothing in this module ever terminates
//! the process.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RepoError>;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git repository (or any parent up to mount point): {0}")]
    NotARepository(PathBuf),

    #[error("unsupported repositoryformatversion {0}")]
    UnsupportedRepoVersion(i64),

    #[error("path {0:?} is outside the worktree")]
    PathOutsideWorktree(PathBuf),

    #[error("path {0:?} is not a regular file or symlink")]
    PathNotAFile(PathBuf),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("malformed object {0}: {1}")]
    MalformedObject(String, String),

    #[error("unknown object type {0:?} for object {1}")]
    UnknownObjectType(String, String),

    #[error("expected object of type {expected}, got {actual} (for {name})")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
        name: String,
    },

    #[error("ambiguous name {name}: candidates {candidates:?}")]
    AmbiguousName {
        name: String,
        candidates: Vec<String>,
    },

    #[error("name not found: {0}")]
    NameNotFound(String),

    #[error("ref not found: {0}")]
    RefNotFound(String),

    #[error("malformed ref {0}: {1}")]
    RefMalformed(String, String),

    #[error("malformed index: {0}")]
    IndexMalformed(String),

    #[error("unsupported index version {0}, only version 2 is supported")]
    IndexVersionUnsupported(u32),

    #[error("checkout directory {0:?} is not empty")]
    CheckoutDirNotEmpty(PathBuf),

    #[error("invalid ignore pattern {0:?}: {1}")]
    IgnorePatternInvalid(String, String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RepoError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepoError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Helper analogous to `Context` for plain `std::io::Result`, attaching the path that was
/// being operated on when the error originated.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| RepoError::io(path, source))
    }
}
