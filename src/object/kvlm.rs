//! Key-value-list-with-message codec: the shared wire format for commit and tag payloads.
//! An ordered multi-map from ASCII keys to lists of byte values, plus a distinguished
//! free-form message. Modeled as a `Vec` of `(key, values)` records rather than a map so that
//! first-insertion key order survives serialization.

use crate::error::{RepoError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kvlm {
    records: Vec<(Vec<u8>, Vec<Vec<u8>>)>,
    pub message: Vec<u8>,
}

impl Kvlm {
    pub fn new() -> Self {
        Kvlm::default()
    }

    /// Appends a value under `key`, creating a new record at the end of the ordering if this
    /// is the key's first occurrence.
    pub fn push(&mut self, key: impl AsRef<[u8]>, value: impl Into<Vec<u8>>) {
        let key = key.as_ref();
        if let Some((_, values)) = self.records.iter_mut().find(|(k, _)| k == key) {
            values.push(value.into());
        } else {
            self.records.push((key.to_vec(), vec![value.into()]));
        }
    }

    /// All values recorded under `key`, in insertion order.
    pub fn get_all(&self, key: impl AsRef<[u8]>) -> &[Vec<u8>] {
        let key = key.as_ref();
        self.records
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// The first value recorded under `key`, if any.
    pub fn get_one(&self, key: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.get_all(key).first().map(|v| v.as_slice())
    }

    pub fn get_one_str(&self, key: &str) -> Option<String> {
        self.get_one(key).map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn parse(data: &[u8]) -> Result<Kvlm> {
        let mut kvlm = Kvlm::new();
        let mut pos = 0usize;

        loop {
            let space = find(data, pos, b' ');
            let newline = find(data, pos, b'\n');

            let (key_end, terminates_here) = match (space, newline) {
                (None, None) => {
                    kvlm.message = data[pos..].to_vec();
                    return Ok(kvlm);
                }
                (None, Some(nl)) => {
                    kvlm.message = data[nl + 1..].to_vec();
                    return Ok(kvlm);
                }
                (Some(_), None) => {
                    return Err(RepoError::MalformedObject(
                        "kvlm".into(),
                        "key line with no terminating newline".into(),
                    ));
                }
                (Some(sp), Some(nl)) if nl < sp => {
                    kvlm.message = data[nl + 1..].to_vec();
                    return Ok(kvlm);
                }
                (Some(sp), Some(_)) => (sp, false),
            };
            let _ = terminates_here;

            let key = data[pos..key_end].to_vec();

            let mut scan = key_end + 1;
            let value_end;
            loop {
                let nl = find(data, scan, b'\n').ok_or_else(|| {
                    RepoError::MalformedObject(
                        "kvlm".into(),
                        "value with no terminating newline".into(),
                    )
                })?;
                if nl + 1 < data.len() && data[nl + 1] == b' ' {
                    scan = nl + 1;
                    continue;
                }
                value_end = nl;
                break;
            }

            let raw_value = &data[key_end + 1..value_end];
            let value = unfold_continuations(raw_value);
            kvlm.push(&key, value);
            pos = value_end + 1;
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, values) in &self.records {
            for value in values {
                out.extend_from_slice(key);
                out.push(b' ');
                for &b in value {
                    out.push(b);
                    if b == b'\n' {
                        out.push(b' ');
                    }
                }
                out.push(b'\n');
            }
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }
}

fn find(data: &[u8], start: usize, needle: u8) -> Option<usize> {
    data[start..].iter().position(|&b| b == needle).map(|i| start + i)
}

/// Reverses the `LF SP` folding the serializer applies to embed a real newline inside a
/// value: `b"a\n b"` (on the wire) becomes `b"a\nb"` in memory.
fn unfold_continuations(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        out.push(raw[i]);
        if raw[i] == b'\n' && i + 1 < raw.len() && raw[i + 1] == b' ' {
            i += 1; // skip the folded space
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Kvlm {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", "abc123".as_bytes().to_vec());
        kvlm.push("parent", "def456".as_bytes().to_vec());
        kvlm.push("parent", "789abc".as_bytes().to_vec());
        kvlm.push("author", "A <a@b.com> 1 +0000".as_bytes().to_vec());
        kvlm.message = b"hello\nworld\n".to_vec();
        kvlm
    }

    #[test]
    fn round_trip_simple() {
        let kvlm = sample();
        let serialized = kvlm.serialize();
        let parsed = Kvlm::parse(&serialized).unwrap();
        assert_eq!(parsed, kvlm);
    }

    #[test]
    fn round_trip_embedded_newline_in_value() {
        let mut kvlm = Kvlm::new();
        kvlm.push("gpgsig", b"line one\nline two\nline three".to_vec());
        kvlm.message = b"msg\n".to_vec();

        let serialized = kvlm.serialize();
        let parsed = Kvlm::parse(&serialized).unwrap();
        assert_eq!(parsed, kvlm);
        assert_eq!(parsed.get_one("gpgsig").unwrap(), b"line one\nline two\nline three");
    }

    #[test]
    fn preserves_key_order_and_repeats() {
        let kvlm = sample();
        assert_eq!(kvlm.get_all("parent").len(), 2);
        assert_eq!(kvlm.get_one("tree").unwrap(), b"abc123");
    }

    #[test]
    fn serialize_matches_expected_bytes() {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", b"t".to_vec());
        kvlm.message = b"m\n".to_vec();
        assert_eq!(kvlm.serialize(), b"tree t\n\nm\n".to_vec());
    }
}
