//! The staging index: a binary snapshot of what `add`/`rm` have staged for the next commit,
//! stored at `<gitdir>/index` in the git index v2 layout so other tools can still read it.

use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

use crate::error::{IoResultExt, RepoError, Result};
use crate::repo::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileTime {
    pub seconds: u32,
    pub nanoseconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub ctime: FileTime,
    pub mtime: FileTime,
    pub dev: u32,
    pub ino: u32,
    /// The 4-bit object type tag packed into the top nibble of the on-disk mode word.
    pub mode_type: u16,
    pub mode_perms: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    pub sha: [u8; 20],
    pub flag_assume_valid: bool,
    pub flag_stage: u16,
    pub name: String,
}

impl IndexEntry {
    pub const MODE_REGULAR: u16 = 0b1000;
    pub const MODE_SYMLINK: u16 = 0b1010;
    pub const MODE_GITLINK: u16 = 0b1110;

    pub fn mode_word(&self) -> u16 {
        (self.mode_type << 12) | (self.mode_perms & 0x01FF)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    pub version: u32,
    pub entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Index { version: 2, entries: Vec::new() }
    }

    pub fn find(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Replaces the entry named `entry.name`, or appends it, keeping entries sorted by name
    /// (the order the tree builder walks the index in).
    pub fn upsert(&mut self, entry: IndexEntry) {
        match self.entries.iter().position(|e| e.name == entry.name) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
        self.entries.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }
}

/// Reads the index, returning an empty (version 2) index when no index file exists yet --
/// a brand new repository has staged nothing.
pub fn read(repo: &Repository) -> Result<Index> {
    let path = repo.repo_path(&["index"]);
    if !path.is_file() {
        return Ok(Index::new());
    }
    let data = fs::read(&path).with_path(&path)?;
    parse(&data)
}

pub fn write(repo: &Repository, index: &Index) -> Result<()> {
    let path = repo.repo_path(&["index"]);
    let bytes = serialize(index);

    let dir = repo.gitdir();
    fs::create_dir_all(dir).with_path(dir)?;
    let mut tmp = NamedTempFile::new_in(dir).with_path(dir)?;
    tmp.write_all(&bytes).with_path(&path)?;
    tmp.persist(&path).map_err(|e| RepoError::io(&path, e.error))?;
    tracing::debug!(entries = index.entries.len(), "wrote index");
    Ok(())
}

fn parse(data: &[u8]) -> Result<Index> {
    if data.len() < 12 || &data[0..4] != b"DIRC" {
        return Err(RepoError::IndexMalformed("missing DIRC signature".into()));
    }
    let version = u32::from_be_bytes(data[4..8].try_into().unwrap());
    if version != 2 {
        return Err(RepoError::IndexVersionUnsupported(version));
    }
    let count = u32::from_be_bytes(data[8..12].try_into().unwrap());

    let mut pos = 12usize;
    let mut entries = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let ctime = FileTime { seconds: read_u32(data, &mut pos)?, nanoseconds: read_u32(data, &mut pos)? };
        let mtime = FileTime { seconds: read_u32(data, &mut pos)?, nanoseconds: read_u32(data, &mut pos)? };
        let dev = read_u32(data, &mut pos)?;
        let ino = read_u32(data, &mut pos)?;

        let unused = read_u16(data, &mut pos)?;
        if unused != 0 {
            return Err(RepoError::IndexMalformed("nonzero reserved mode field".into()));
        }
        let mode = read_u16(data, &mut pos)?;
        let mode_type = mode >> 12;
        if mode & 0x0E00 != 0 {
            return Err(RepoError::IndexMalformed("nonzero reserved mode bits (9-11)".into()));
        }
        let mode_perms = mode & 0x01FF;
        if ![IndexEntry::MODE_REGULAR, IndexEntry::MODE_SYMLINK, IndexEntry::MODE_GITLINK].contains(&mode_type) {
            return Err(RepoError::IndexMalformed(format!("unrecognized mode type {mode_type:#06b}")));
        }

        let uid = read_u32(data, &mut pos)?;
        let gid = read_u32(data, &mut pos)?;
        let size = read_u32(data, &mut pos)?;

        let mut sha = [0u8; 20];
        sha.copy_from_slice(read_bytes(data, &mut pos, 20)?);

        let flags = read_u16(data, &mut pos)?;
        let flag_assume_valid = flags & 0x8000 != 0;
        let extended = flags & 0x4000 != 0;
        if extended {
            return Err(RepoError::IndexMalformed("extended flag bit set, unsupported".into()));
        }
        let flag_stage = flags & 0x3000;
        let name_len = (flags & 0x0FFF) as usize;

        let name = if name_len < 0xFFF {
            String::from_utf8_lossy(read_bytes(data, &mut pos, name_len)?).into_owned()
        } else {
            let nul = data[pos..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| RepoError::IndexMalformed("unterminated long entry name".into()))?;
            let name = String::from_utf8_lossy(&data[pos..pos + nul]).into_owned();
            pos += nul;
            name
        };

        // the name is always NUL-terminated, even when the flags length field already gave an
        // exact byte count, so at least one padding byte is mandatory here. Consume it before
        // rounding the rest up to the next 8-byte boundary (absolute file offset, not
        // entry-relative, and never 0 extra bytes beyond this terminator).
        if data.get(pos) != Some(&0) {
            return Err(RepoError::IndexMalformed("entry name is not NUL-terminated".into()));
        }
        pos += 1;
        pos = pos.div_ceil(8) * 8;

        entries.push(IndexEntry {
            ctime,
            mtime,
            dev,
            ino,
            mode_type,
            mode_perms,
            uid,
            gid,
            size,
            sha,
            flag_assume_valid,
            flag_stage,
            name,
        });
    }

    Ok(Index { version, entries })
}

fn serialize(index: &Index) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"DIRC");
    out.extend_from_slice(&index.version.to_be_bytes());
    out.extend_from_slice(&(index.entries.len() as u32).to_be_bytes());

    let mut sorted = index.entries.clone();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    for entry in &sorted {
        out.extend_from_slice(&entry.ctime.seconds.to_be_bytes());
        out.extend_from_slice(&entry.ctime.nanoseconds.to_be_bytes());
        out.extend_from_slice(&entry.mtime.seconds.to_be_bytes());
        out.extend_from_slice(&entry.mtime.nanoseconds.to_be_bytes());
        out.extend_from_slice(&entry.dev.to_be_bytes());
        out.extend_from_slice(&entry.ino.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&entry.mode_word().to_be_bytes());
        out.extend_from_slice(&entry.uid.to_be_bytes());
        out.extend_from_slice(&entry.gid.to_be_bytes());
        out.extend_from_slice(&entry.size.to_be_bytes());
        out.extend_from_slice(&entry.sha);

        let name_bytes = entry.name.as_bytes();
        let name_len_field = name_bytes.len().min(0xFFF) as u16;
        let mut flags = entry.flag_stage & 0x3000;
        if entry.flag_assume_valid {
            flags |= 0x8000;
        }
        flags |= name_len_field;
        out.extend_from_slice(&flags.to_be_bytes());

        out.extend_from_slice(name_bytes);

        // the name is always NUL-terminated regardless of whether its exact length fit in the
        // flags field, so this byte is never optional -- padding is 1-8 bytes, never 0.
        out.push(0);
        while out.len() % 8 != 0 {
            out.push(0);
        }
    }

    out
}

fn read_u32(data: &[u8], pos: &mut usize) -> Result<u32> {
    Ok(u32::from_be_bytes(read_bytes(data, pos, 4)?.try_into().unwrap()))
}

fn read_u16(data: &[u8], pos: &mut usize) -> Result<u16> {
    Ok(u16::from_be_bytes(read_bytes(data, pos, 2)?.try_into().unwrap()))
}

fn read_bytes<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    if *pos + len > data.len() {
        return Err(RepoError::IndexMalformed("truncated entry".into()));
    }
    let slice = &data[*pos..*pos + len];
    *pos += len;
    Ok(slice)
}
