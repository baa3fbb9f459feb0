//! Minimal INI-style configuration reader/writer: a small layered key-value store that
//! understands `[section]` headers, used both for the repository's own `config` file and for
//! the external identity/ignore sources (user gitconfig, global excludes).
//!
//! This is not a general INI parser: only `[section]` headers and `key = value` lines are
//! recognized, matching the handful of keys this core actually reads or writes.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{IoResultExt, RepoError, Result};

#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
    /// The config written by `init`: `core.repositoryformatversion = 0`, `filemode = false`,
    /// `bare = false`.
    pub fn default_core() -> Self {
        let mut cfg = Config::default();
        cfg.set("core", "repositoryformatversion", "0");
        cfg.set("core", "filemode", "false");
        cfg.set("core", "bare", "false");
        cfg
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_path(path)?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut cfg = Config::default();
        let mut section = String::new();

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = rest.trim().to_string();
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                cfg.set(&section, key.trim(), value.trim());
            }
        }

        cfg
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).with_path(path)?;
        {
            use std::io::Write;
            write!(tmp, "{}", self.render()).with_path(path)?;
        }
        tmp.persist(path)
            .map_err(|e| RepoError::io(path, e.error))?;
        Ok(())
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (section, keys) in &self.sections {
            out.push('[');
            out.push_str(section);
            out.push_str("]\n");
            for (key, value) in keys {
                out.push('\t');
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(value);
                out.push('\n');
            }
        }
        out
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(|s| s.as_str())
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn repository_format_version(&self) -> Result<i64> {
        self.get("core", "repositoryformatversion")
            .ok_or_else(|| RepoError::Config("core.repositoryformatversion missing".into()))?
            .parse()
            .map_err(|_| RepoError::Config("core.repositoryformatversion is not an integer".into()))
    }
}

/// `$XDG_CONFIG_HOME`, falling back to `$HOME/.config`.
fn config_home() -> Option<PathBuf> {
    if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    env::var("HOME").ok().map(|home| Path::new(&home).join(".config"))
}

fn home_dir() -> Option<PathBuf> {
    env::var("HOME").ok().map(PathBuf::from)
}

/// Path to the user's global ignore file, `$XDG_CONFIG_HOME/git/ignore`.
pub fn global_ignore_path() -> Option<PathBuf> {
    config_home().map(|dir| dir.join("git").join("ignore"))
}

/// Resolves `user.name`/`user.email`, checked in precedence order: the repository's own
/// config, then `$XDG_CONFIG_HOME/git/config`, then `~/.gitconfig`.
pub fn resolve_identity(repo_config: &Config) -> Result<(String, String)> {
    if let (Some(name), Some(email)) = (
        repo_config.get("user", "name"),
        repo_config.get("user", "email"),
    ) {
        return Ok((name.to_string(), email.to_string()));
    }

    let candidates = [
        config_home().map(|dir| dir.join("git").join("config")),
        home_dir().map(|dir| dir.join(".gitconfig")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Ok(text) = fs::read_to_string(&candidate) {
            let cfg = Config::parse(&text);
            if let (Some(name), Some(email)) =
                (cfg.get("user", "name"), cfg.get("user", "email"))
            {
                return Ok((name.to_string(), email.to_string()));
            }
        }
    }

    Err(RepoError::Config(
        "no user.name/user.email found in repository config, $XDG_CONFIG_HOME/git/config, or ~/.gitconfig".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render_round_trip() {
        let text = "[core]\n\trepositoryformatversion = 0\n\tfilemode = false\n\tbare = false\n";
        let cfg = Config::parse(text);
        assert_eq!(cfg.get("core", "repositoryformatversion"), Some("0"));
        assert_eq!(cfg.repository_format_version().unwrap(), 0);
    }

    #[test]
    fn default_core_has_expected_keys() {
        let cfg = Config::default_core();
        assert_eq!(cfg.get("core", "filemode"), Some("false"));
        assert_eq!(cfg.get("core", "bare"), Some("false"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        let cfg = Config::default_core();
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.repository_format_version().unwrap(), 0);
    }
}
