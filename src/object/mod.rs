//! The content-addressed object store: loose objects under `objects/xx/yyyy…`, framed as
//! `<type> SP <len> NUL <payload>` and zlib-compressed on disk, named by the SHA-1 of the
//! framed bytes. Covers all four object kinds (blob, tree, commit, tag) through a single
//! `GitObject` tagged enum instead of a bespoke reader per kind.

pub mod kvlm;
pub mod tree;

pub use kvlm::Kvlm;
pub use tree::{Tree, TreeLeaf};

use std::fs;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha1::{Digest, Sha1};
use tempfile::NamedTempFile;

use crate::error::{IoResultExt, RepoError, Result};
use crate::repo::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            "tag" => Ok(ObjectKind::Tag),
            other => Err(RepoError::UnknownObjectType(other.to_string(), String::new())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitObject {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(Kvlm),
    Tag(Kvlm),
}

impl GitObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            GitObject::Blob(_) => ObjectKind::Blob,
            GitObject::Tree(_) => ObjectKind::Tree,
            GitObject::Commit(_) => ObjectKind::Commit,
            GitObject::Tag(_) => ObjectKind::Tag,
        }
    }

    fn serialize_payload(&self) -> Vec<u8> {
        match self {
            GitObject::Blob(data) => data.clone(),
            GitObject::Tree(tree) => tree.serialize(),
            GitObject::Commit(kvlm) | GitObject::Tag(kvlm) => kvlm.serialize(),
        }
    }

    fn deserialize(kind: ObjectKind, data: Vec<u8>, name: &str) -> Result<GitObject> {
        Ok(match kind {
            ObjectKind::Blob => GitObject::Blob(data),
            ObjectKind::Tree => GitObject::Tree(Tree::parse(&data)?),
            ObjectKind::Commit => GitObject::Commit(Kvlm::parse(&data).map_err(|e| {
                RepoError::MalformedObject(name.to_string(), e.to_string())
            })?),
            ObjectKind::Tag => GitObject::Tag(Kvlm::parse(&data).map_err(|e| {
                RepoError::MalformedObject(name.to_string(), e.to_string())
            })?),
        })
    }

    pub fn as_blob(&self) -> Result<&[u8]> {
        match self {
            GitObject::Blob(data) => Ok(data),
            other => Err(type_mismatch("blob", other)),
        }
    }

    pub fn as_tree(&self) -> Result<&Tree> {
        match self {
            GitObject::Tree(tree) => Ok(tree),
            other => Err(type_mismatch("tree", other)),
        }
    }

    pub fn as_commit(&self) -> Result<&Kvlm> {
        match self {
            GitObject::Commit(kvlm) => Ok(kvlm),
            other => Err(type_mismatch("commit", other)),
        }
    }

    pub fn as_tag(&self) -> Result<&Kvlm> {
        match self {
            GitObject::Tag(kvlm) => Ok(kvlm),
            other => Err(type_mismatch("tag", other)),
        }
    }
}

fn type_mismatch(expected: &'static str, actual: &GitObject) -> RepoError {
    RepoError::TypeMismatch {
        expected,
        actual: actual.kind().as_str().to_string(),
        name: String::new(),
    }
}

/// `<type> SP <decimal-length> NUL <payload>` — the hashed and stored unit.
pub fn frame(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 32);
    out.extend_from_slice(kind.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(0);
    out.extend_from_slice(payload);
    out
}

pub fn hash_framed(framed: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(framed);
    hasher.finalize().into()
}

fn object_path(repo: &Repository, hash_hex: &str) -> std::path::PathBuf {
    repo.repo_path(&["objects", &hash_hex[..2], &hash_hex[2..]])
}

/// Reads and parses the object named by `hash_hex` (a full 40-char hex hash; name resolution
/// to short hashes happens one layer up, in `resolve`).
pub fn read_object(repo: &Repository, hash_hex: &str) -> Result<GitObject> {
    let path = object_path(repo, hash_hex);
    if !path.is_file() {
        return Err(RepoError::ObjectNotFound(hash_hex.to_string()));
    }

    let file = fs::File::open(&path).with_path(&path)?;
    let mut decoder = ZlibDecoder::new(file);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| RepoError::MalformedObject(hash_hex.to_string(), e.to_string()))?;

    let sp = raw
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| RepoError::MalformedObject(hash_hex.to_string(), "no space in header".into()))?;
    let nul = raw
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| RepoError::MalformedObject(hash_hex.to_string(), "no NUL in header".into()))?;

    let kind_str = std::str::from_utf8(&raw[..sp])
        .map_err(|_| RepoError::MalformedObject(hash_hex.to_string(), "type is not UTF-8".into()))?;
    let len_str = std::str::from_utf8(&raw[sp + 1..nul])
        .map_err(|_| RepoError::MalformedObject(hash_hex.to_string(), "length is not UTF-8".into()))?;
    let declared_len: usize = len_str
        .parse()
        .map_err(|_| RepoError::MalformedObject(hash_hex.to_string(), "length is not numeric".into()))?;

    let payload = raw[nul + 1..].to_vec();
    if payload.len() != declared_len {
        return Err(RepoError::MalformedObject(
            hash_hex.to_string(),
            format!("declared length {declared_len} does not match payload length {}", payload.len()),
        ));
    }

    let kind = ObjectKind::parse(kind_str)
        .map_err(|_| RepoError::UnknownObjectType(kind_str.to_string(), hash_hex.to_string()))?;

    GitObject::deserialize(kind, payload, hash_hex)
}

/// Serializes, hashes, and (if `repo` is given) persists `obj`. Writes are content-conditional:
/// an existing file at the target path is left untouched.
pub fn write_object(repo: Option<&Repository>, obj: &GitObject) -> Result<String> {
    let payload = obj.serialize_payload();
    let framed = frame(obj.kind(), &payload);
    let hash = hash_framed(&framed);
    let hash_hex = hex::encode(hash);

    if let Some(repo) = repo {
        let path = object_path(repo, &hash_hex);
        if !path.is_file() {
            let dir = path.parent().expect("object path always has a parent");
            fs::create_dir_all(dir).with_path(dir)?;

            let mut tmp = NamedTempFile::new_in(dir).with_path(dir)?;
            {
                let mut encoder = ZlibEncoder::new(&mut tmp, Compression::default());
                encoder.write_all(&framed).with_path(&path)?;
                encoder.finish().with_path(&path)?;
            }
            tmp.persist(&path).map_err(|e| RepoError::io(&path, e.error))?;
            tracing::debug!(hash = %hash_hex, kind = obj.kind().as_str(), "wrote object");
        }
    }

    Ok(hash_hex)
}

/// Convenience used by `hash-object`: frames and hashes `payload` as `kind`, optionally
/// persisting it, without requiring the caller to build a full [`GitObject`] for simple blobs.
pub fn hash_bytes(repo: Option<&Repository>, kind: ObjectKind, payload: Vec<u8>) -> Result<String> {
    let obj = match kind {
        ObjectKind::Blob => GitObject::Blob(payload),
        ObjectKind::Tree => GitObject::Tree(Tree::parse(&payload)?),
        ObjectKind::Commit => GitObject::Commit(Kvlm::parse(&payload)?),
        ObjectKind::Tag => GitObject::Tag(Kvlm::parse(&payload)?),
    };
    write_object(repo, &obj)
}
