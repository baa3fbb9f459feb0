//! Name resolver: turns a user-supplied identifier (HEAD, a short or full hex hash, a tag or
//! branch name) into the single canonical object hash it denotes, with optional type-follow
//! traversal (tag -> target, commit -> tree).

use std::fs;

use crate::error::{IoResultExt, RepoError, Result};
use crate::object::{read_object, GitObject, ObjectKind};
use crate::refs;
use crate::repo::Repository;

/// Resolves `name` to a single canonical hash, optionally requiring (and following to) a
/// specific object type.
pub fn find(repo: &Repository, name: &str, required: Option<ObjectKind>, follow: bool) -> Result<String> {
    let candidates = collect_candidates(repo, name)?;

    match candidates.len() {
        0 => Err(RepoError::NameNotFound(name.to_string())),
        1 => {
            let hash = candidates.into_iter().next().expect("len checked above");
            match required {
                None => Ok(hash),
                Some(kind) => follow_to_type(repo, &hash, kind, follow),
            }
        }
        _ => Err(RepoError::AmbiguousName {
            name: name.to_string(),
            candidates,
        }),
    }
}

fn collect_candidates(repo: &Repository, name: &str) -> Result<Vec<String>> {
    let mut candidates = Vec::new();

    if name == "HEAD" {
        if let Ok(hash) = refs::resolve(repo, "HEAD") {
            candidates.push(hash);
        }
    } else {
        if (4..=40).contains(&name.len()) && name.bytes().all(|b| b.is_ascii_hexdigit()) {
            let lower = name.to_lowercase();
            let prefix_dir = repo.repo_path(&["objects", &lower[..2]]);
            if prefix_dir.is_dir() {
                let rest = &lower[2..];
                for entry in fs::read_dir(&prefix_dir).with_path(&prefix_dir)? {
                    let entry = entry.with_path(&prefix_dir)?;
                    let fname = entry.file_name().to_string_lossy().into_owned();
                    if fname.starts_with(rest) {
                        candidates.push(format!("{}{}", &lower[..2], fname));
                    }
                }
            }
        }

        if let Ok(hash) = refs::resolve(repo, &format!("refs/tags/{name}")) {
            candidates.push(hash);
        }
        if let Ok(hash) = refs::resolve(repo, &format!("refs/heads/{name}")) {
            candidates.push(hash);
        }
    }

    candidates.sort();
    candidates.dedup();
    Ok(candidates)
}

fn follow_to_type(repo: &Repository, start: &str, wanted: ObjectKind, follow: bool) -> Result<String> {
    let mut current = start.to_string();

    loop {
        let obj = read_object(repo, &current)?;
        if obj.kind() == wanted {
            return Ok(current);
        }
        if !follow {
            return Err(type_mismatch(wanted, &obj, start));
        }

        current = match &obj {
            GitObject::Tag(kvlm) => kvlm
                .get_one_str("object")
                .ok_or_else(|| RepoError::MalformedObject(current.clone(), "tag missing 'object' field".into()))?,
            GitObject::Commit(kvlm) if wanted == ObjectKind::Tree => kvlm
                .get_one_str("tree")
                .ok_or_else(|| RepoError::MalformedObject(current.clone(), "commit missing 'tree' field".into()))?,
            _ => return Err(type_mismatch(wanted, &obj, start)),
        };
    }
}

fn type_mismatch(wanted: ObjectKind, actual: &GitObject, name: &str) -> RepoError {
    RepoError::TypeMismatch {
        expected: wanted.as_str(),
        actual: actual.kind().as_str().to_string(),
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::write_object;
    use tempfile::tempdir;

    #[test]
    fn resolves_unique_prefix() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let hash = write_object(Some(&repo), &GitObject::Blob(b"a".to_vec())).unwrap();

        let found = find(&repo, &hash[..6], None, false).unwrap();
        assert_eq!(found, hash);
    }

    #[test]
    fn fails_on_missing_name() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let err = find(&repo, "deadbeef", None, false).unwrap_err();
        assert!(matches!(err, RepoError::NameNotFound(_)));
    }

    #[test]
    fn fails_on_ambiguous_prefix() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        // brute force two blobs that share a short prefix
        let mut hashes = Vec::new();
        for i in 0u32..4000 {
            let hash = write_object(Some(&repo), &GitObject::Blob(i.to_string().into_bytes())).unwrap();
            hashes.push(hash);
        }
        hashes.sort();
        let shared_prefix = (0..hashes.len() - 1).find_map(|i| {
            let common = common_prefix_len(&hashes[i], &hashes[i + 1]);
            (common >= 4).then_some(hashes[i][..4].to_string())
        });

        if let Some(prefix) = shared_prefix {
            let err = find(&repo, &prefix, None, false).unwrap_err();
            assert!(matches!(err, RepoError::AmbiguousName { .. }));
        }
    }

    fn common_prefix_len(a: &str, b: &str) -> usize {
        a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
    }
}
