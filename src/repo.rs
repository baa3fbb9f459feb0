//! Repository façade: discovers the admin directory, resolves administrative paths, and owns
//! the parsed configuration. Can be discovered from any working-directory depth by walking
//! upward looking for the admin directory, the way `git rev-parse --show-toplevel` does.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{IoResultExt, RepoError, Result};

/// Name of the administrative directory. Not configurable in this core (no `--git-dir`).
const ADMIN_DIR: &str = ".git";

pub struct Repository {
    worktree: PathBuf,
    gitdir: PathBuf,
    config: Config,
}

impl Repository {
    /// Opens a repository rooted exactly at `worktree` (its admin dir is `worktree/.git`).
    /// Unlike [`Repository::discover`], this does not walk upward. Pass `force = true` to
    /// skip the repositoryformatversion check (used while initializing a new repository,
    /// matching the source's `NewRepository(path, force)`).
    pub fn open(worktree: impl Into<PathBuf>, force: bool) -> Result<Self> {
        let worktree = worktree.into();
        let gitdir = worktree.join(ADMIN_DIR);

        if !force && !gitdir.is_dir() {
            return Err(RepoError::NotARepository(worktree));
        }

        let config_path = gitdir.join("config");
        let config = if config_path.is_file() {
            Config::load(&config_path)?
        } else if force {
            Config::default_core()
        } else {
            return Err(RepoError::Config("missing config file".into()));
        };

        if !force {
            let version = config.repository_format_version()?;
            if version != 0 {
                return Err(RepoError::UnsupportedRepoVersion(version));
            }
        }

        Ok(Repository {
            worktree,
            gitdir,
            config,
        })
    }

    /// Walks upward from `start` looking for a `.git` directory, the way the reference CLI
    /// locates the enclosing repository from a subdirectory.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let mut dir = start.as_ref().canonicalize().with_path(start.as_ref())?;

        loop {
            if dir.join(ADMIN_DIR).is_dir() {
                return Repository::open(dir, false);
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => return Err(RepoError::NotARepository(start.as_ref().to_path_buf())),
            }
        }
    }

    /// Initializes a brand-new repository at `path`, laying out the directory skeleton and
    /// default files. `path` is created if it does not exist; it must be empty of any existing
    /// `.git` contents.
    pub fn init(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let repo = Repository::open(&path, true)?;

        if !repo.worktree.exists() {
            fs::create_dir_all(&repo.worktree).with_path(&repo.worktree)?;
        } else if !repo.worktree.is_dir() {
            return Err(RepoError::Config(format!(
                "{} is not a directory",
                repo.worktree.display()
            )));
        }

        if repo.gitdir.is_dir() && fs::read_dir(&repo.gitdir).with_path(&repo.gitdir)?.next().is_some() {
            return Err(RepoError::Config(format!(
                "{} is not empty",
                repo.worktree.display()
            )));
        }

        fs::create_dir_all(&repo.gitdir).with_path(&repo.gitdir)?;
        repo.repo_dir(true, &["branches"])?;
        repo.repo_dir(true, &["objects"])?;
        repo.repo_dir(true, &["refs", "tags"])?;
        repo.repo_dir(true, &["refs", "heads"])?;
        repo.repo_dir(true, &["info"])?;

        let description = repo.repo_path(&["description"]);
        fs::write(
            &description,
            "Unnamed repository; edit this file 'description' to name the repository.\n",
        )
        .with_path(&description)?;

        let head = repo.repo_path(&["HEAD"]);
        fs::write(&head, "ref: refs/heads/master\n").with_path(&head)?;

        let config_path = repo.repo_path(&["config"]);
        repo.config.save(&config_path)?;

        tracing::debug!(worktree = %repo.worktree.display(), "initialized repository");
        Ok(repo)
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    pub fn gitdir(&self) -> &Path {
        &self.gitdir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Joins path components onto the admin directory without touching the filesystem.
    pub fn repo_path(&self, parts: &[&str]) -> PathBuf {
        let mut p = self.gitdir.clone();
        for part in parts {
            p.push(part);
        }
        p
    }

    /// Resolves the path to a file under the admin directory, creating intermediate
    /// directories when `mkdir` is set.
    pub fn repo_file(&self, mkdir: bool, parts: &[&str]) -> Result<PathBuf> {
        if parts.len() > 1 {
            self.repo_dir(mkdir, &parts[..parts.len() - 1])?;
        }
        Ok(self.repo_path(parts))
    }

    /// Resolves (and optionally creates) a directory under the admin directory.
    pub fn repo_dir(&self, mkdir: bool, parts: &[&str]) -> Result<PathBuf> {
        let path = self.repo_path(parts);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Ok(path),
            Ok(_) => Err(RepoError::Config(format!("not a directory: {}", path.display()))),
            Err(_) if mkdir => {
                fs::create_dir_all(&path).with_path(&path)?;
                Ok(path)
            }
            Err(_) => Err(RepoError::Config(format!(
                "directory does not exist: {}",
                path.display()
            ))),
        }
    }

    /// Returns `path` relative to the worktree root, rejecting paths that escape it.
    pub fn rel_to_worktree(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .with_path(path)?
                .join(path)
        };
        let abs = dunce_canonicalize(&abs)?;
        let worktree = dunce_canonicalize(&self.worktree)?;
        abs.strip_prefix(&worktree)
            .map(|p| p.to_path_buf())
            .map_err(|_| RepoError::PathOutsideWorktree(path.to_path_buf()))
    }
}

/// `Path::canonicalize` requires the path to exist; this softens that for not-yet-existing
/// trailing components (needed when checking whether an about-to-be-created file is inside
/// the worktree).
fn dunce_canonicalize(path: &Path) -> Result<PathBuf> {
    if let Ok(c) = path.canonicalize() {
        return Ok(c);
    }
    let parent = path.parent().ok_or_else(|| RepoError::PathOutsideWorktree(path.to_path_buf()))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| RepoError::PathOutsideWorktree(path.to_path_buf()))?;
    let parent = dunce_canonicalize(parent)?;
    Ok(parent.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_skeleton() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        assert!(repo.repo_path(&["objects"]).is_dir());
        assert!(repo.repo_path(&["refs", "heads"]).is_dir());
        assert!(repo.repo_path(&["refs", "tags"]).is_dir());
        assert!(repo.repo_path(&["info"]).is_dir());
        assert!(repo.repo_path(&["HEAD"]).is_file());
        assert!(repo.repo_path(&["config"]).is_file());
        assert_eq!(repo.config().repository_format_version().unwrap(), 0);
    }

    #[test]
    fn init_rejects_nonempty_gitdir() {
        let dir = tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let err = Repository::init(dir.path()).unwrap_err();
        assert!(matches!(err, RepoError::Config(_)));
    }

    #[test]
    fn discover_walks_upward() {
        let dir = tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let repo = Repository::discover(&nested).unwrap();
        assert_eq!(
            repo.worktree().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn discover_fails_outside_repo() {
        let dir = tempdir().unwrap();
        let err = Repository::discover(dir.path()).unwrap_err();
        assert!(matches!(err, RepoError::NotARepository(_)));
    }
}
