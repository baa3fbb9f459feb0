//! Ignore engine: decides whether a worktree-relative path is ignored, combining two kinds of
//! rule group. Absolute groups apply repo-wide, checked in a fixed order: `info/exclude` then
//! the user's global ignore file. Scoped groups come from `.gitignore` blobs recorded in the
//! index, one rule set per directory, checked from the path's immediate parent upward. Uses a
//! three-valued [`Verdict`] instead of a sentinel "no rule matched" error.

use std::collections::BTreeMap;
use std::fs;

use glob::MatchOptions;

use crate::config;
use crate::error::{IoResultExt, RepoError, Result};
use crate::index;
use crate::object::read_object;
use crate::repo::Repository;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ignored,
    NotIgnored,
    Undecided,
}

/// A single parsed pattern line. `negated` patterns (`!pattern`) un-ignore a path that an
/// earlier rule in the same group ignored; within a group, the last matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IgnoreLine {
    pattern: String,
    negated: bool,
}

fn parse_line(raw: &str) -> Option<IgnoreLine> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix('!') {
        return Some(IgnoreLine { pattern: rest.to_string(), negated: true });
    }
    if let Some(rest) = trimmed.strip_prefix('\\') {
        return Some(IgnoreLine { pattern: rest.to_string(), negated: false });
    }
    Some(IgnoreLine { pattern: trimmed.to_string(), negated: false })
}

fn parse_lines(text: &str) -> Vec<IgnoreLine> {
    text.lines().filter_map(parse_line).collect()
}

#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    absolute: Vec<Vec<IgnoreLine>>,
    scoped: BTreeMap<String, Vec<IgnoreLine>>,
}

/// Collects every rule source: `info/exclude`, the global ignore file, and every `.gitignore`
/// blob currently staged in the index.
pub fn read(repo: &Repository) -> Result<IgnoreRules> {
    let mut absolute = Vec::new();

    let exclude_path = repo.repo_path(&["info", "exclude"]);
    if exclude_path.is_file() {
        let text = fs::read_to_string(&exclude_path).with_path(&exclude_path)?;
        absolute.push(parse_lines(&text));
    }

    if let Some(global_path) = config::global_ignore_path() {
        if global_path.is_file() {
            let text = fs::read_to_string(&global_path).with_path(&global_path)?;
            absolute.push(parse_lines(&text));
        }
    }

    let mut scoped = BTreeMap::new();
    let idx = index::read(repo)?;
    for entry in &idx.entries {
        if entry.name != ".gitignore" && !entry.name.ends_with("/.gitignore") {
            continue;
        }
        let dir = dirname(&entry.name);
        let sha_hex = hex::encode(entry.sha);
        let obj = read_object(repo, &sha_hex)?;
        let blob = obj.as_blob()?;
        let text = String::from_utf8_lossy(blob);
        scoped.insert(dir.to_string(), parse_lines(&text));
    }

    Ok(IgnoreRules { absolute, scoped })
}

fn dirname(name: &str) -> &str {
    name.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Every strict ancestor directory of `path`, nearest first, ending with `""` for the
/// worktree root.
fn ancestors(path: &str) -> Vec<String> {
    let mut components: Vec<&str> = path.split('/').collect();
    components.pop();

    let mut out = Vec::new();
    while !components.is_empty() {
        out.push(components.join("/"));
        components.pop();
    }
    out.push(String::new());
    out
}

fn basename(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, base)| base).unwrap_or(path)
}

/// A pattern with no `/` matches the path's basename at any depth, like real gitignore; a
/// pattern containing `/` is anchored and matched against the path as given.
fn match_group(rules: &[IgnoreLine], path: &str) -> Result<Verdict> {
    let base = basename(path);
    let mut verdict = Verdict::Undecided;
    for rule in rules {
        let pattern = glob::Pattern::new(&rule.pattern)
            .map_err(|e| RepoError::IgnorePatternInvalid(rule.pattern.clone(), e.to_string()))?;
        let candidate = if rule.pattern.contains('/') { path } else { base };
        if pattern.matches_with(candidate, MATCH_OPTIONS) {
            verdict = if rule.negated { Verdict::NotIgnored } else { Verdict::Ignored };
        }
    }
    Ok(verdict)
}

fn match_scoped(rules: &IgnoreRules, path: &str) -> Result<Verdict> {
    for dir in ancestors(path) {
        if let Some(group) = rules.scoped.get(&dir) {
            // rules in a `.gitignore` are matched relative to the directory that owns them,
            // not the worktree root.
            let rel = if dir.is_empty() {
                path
            } else {
                path.strip_prefix(&dir)
                    .and_then(|s| s.strip_prefix('/'))
                    .unwrap_or(path)
            };
            let verdict = match_group(group, rel)?;
            if verdict != Verdict::Undecided {
                return Ok(verdict);
            }
        }
    }
    Ok(Verdict::Undecided)
}

fn match_absolute(rules: &IgnoreRules, path: &str) -> Result<Verdict> {
    for group in &rules.absolute {
        let verdict = match_group(group, path)?;
        if verdict != Verdict::Undecided {
            return Ok(verdict);
        }
    }
    Ok(Verdict::Undecided)
}

/// Decides whether `path` (always worktree-relative, forward-slash separated) is ignored:
/// scoped rules take precedence over absolute ones, nearest directory first.
pub fn check(rules: &IgnoreRules, path: &str) -> Result<Verdict> {
    let scoped = match_scoped(rules, path)?;
    if scoped != Verdict::Undecided {
        return Ok(scoped);
    }
    match_absolute(rules, path)
}

/// Convenience: `true` when `path` should be treated as ignored (`Undecided` counts as not
/// ignored, matching the common case of no rule applying).
pub fn is_ignored(rules: &IgnoreRules, path: &str) -> Result<bool> {
    Ok(check(rules, path)? == Verdict::Ignored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(absolute: Vec<&str>) -> IgnoreRules {
        IgnoreRules {
            absolute: vec![parse_lines(&absolute.join("\n"))],
            scoped: BTreeMap::new(),
        }
    }

    #[test]
    fn matches_simple_pattern() {
        let r = rules(vec!["*.log"]);
        assert_eq!(check(&r, "debug.log").unwrap(), Verdict::Ignored);
        assert_eq!(check(&r, "src/main.rs").unwrap(), Verdict::Undecided);
    }

    #[test]
    fn negation_overrides_earlier_match_in_same_group() {
        let r = rules(vec!["*.log", "!keep.log"]);
        assert_eq!(check(&r, "keep.log").unwrap(), Verdict::NotIgnored);
        assert_eq!(check(&r, "other.log").unwrap(), Verdict::Ignored);
    }

    #[test]
    fn later_group_only_consulted_when_earlier_is_undecided() {
        let r = IgnoreRules {
            absolute: vec![parse_lines("*.log"), parse_lines("*.tmp")],
            scoped: BTreeMap::new(),
        };
        assert_eq!(check(&r, "a.tmp").unwrap(), Verdict::Ignored);
    }

    #[test]
    fn scoped_rules_win_over_absolute() {
        let mut scoped = BTreeMap::new();
        scoped.insert("src".to_string(), parse_lines("!debug.log"));
        let r = IgnoreRules { absolute: vec![parse_lines("*.log")], scoped };
        assert_eq!(check(&r, "src/debug.log").unwrap(), Verdict::NotIgnored);
        assert_eq!(check(&r, "other/debug.log").unwrap(), Verdict::Ignored);
    }

    #[test]
    fn slash_less_pattern_matches_at_any_depth() {
        let r = rules(vec!["*.log"]);
        assert_eq!(check(&r, "src/debug.log").unwrap(), Verdict::Ignored);
        assert_eq!(check(&r, "a/b/debug.log").unwrap(), Verdict::Ignored);
    }

    #[test]
    fn slash_containing_pattern_is_anchored() {
        let r = rules(vec!["src/debug.log"]);
        assert_eq!(check(&r, "src/debug.log").unwrap(), Verdict::Ignored);
        assert_eq!(check(&r, "other/src/debug.log").unwrap(), Verdict::Undecided);
    }

    #[test]
    fn scoped_rule_matches_relative_to_its_own_directory() {
        let mut scoped = BTreeMap::new();
        scoped.insert("d".to_string(), parse_lines("!keep.log"));
        let r = IgnoreRules { absolute: vec![parse_lines("*.log")], scoped };
        assert_eq!(check(&r, "d/keep.log").unwrap(), Verdict::NotIgnored);
        assert_eq!(check(&r, "d/x.log").unwrap(), Verdict::Ignored);
    }

    #[test]
    fn ancestors_reaches_root() {
        assert_eq!(ancestors("a/b/c.txt"), vec!["a/b".to_string(), "a".to_string(), String::new()]);
        assert_eq!(ancestors("c.txt"), vec![String::new()]);
    }
}
