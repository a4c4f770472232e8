use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::atom::Handle;
use crate::domain::errors::StorageError;
use crate::ports::storage::{index_by_handle, AtomRecord, BackendStats, StorageNode};

/// File-backed persistence without requiring a real database: the whole
/// graph is kept in memory and serialized as one S-expression per atom,
/// one per line, written via a temp-file-then-rename so a crash mid-write
/// never corrupts the previous snapshot (spec.md §6).
///
/// Each line has the shape
/// `(atom <handle> <type-name> (name "...") | (outgoing <h> ...) <strength> <confidence>)`
/// — a node atom carries a quoted `name`, a link atom carries its
/// `outgoing` handle list.
pub struct FileStorageNode {
    records: HashMap<u64, AtomRecord>,
    path: PathBuf,
    connected: bool,
}

impl FileStorageNode {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            records: HashMap::new(),
            path: path.as_ref().to_path_buf(),
            connected: false,
        }
    }

    fn load_from_disk(&mut self) -> Result<(), StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => {
                let mut records = Vec::new();
                for line in text.lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    records.push(parse_record(line)?);
                }
                self.records = index_by_handle(records);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let mut handles: Vec<&u64> = self.records.keys().collect();
        handles.sort();
        let mut text = String::new();
        for handle in handles {
            text.push_str(&serialize_record(&self.records[handle]));
            text.push('\n');
        }

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, text.as_bytes()).map_err(|e| StorageError::Io(e.to_string()))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Quote and escape `s` for embedding as an S-expression string literal.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn serialize_record(r: &AtomRecord) -> String {
    let payload = match &r.name {
        Some(name) => format!("(name {})", quote(name)),
        None => {
            let handles: Vec<String> = r.outgoing.iter().map(|h| h.to_string()).collect();
            format!("(outgoing {})", handles.join(" "))
        }
    };
    format!(
        "(atom {} {} {} {} {})",
        r.handle, r.type_name, payload, r.strength, r.confidence
    )
}

/// Split a single atom line into whitespace-separated tokens, treating a
/// double-quoted span (with `\"`/`\\` escapes) as one token and `(`/`)` as
/// tokens of their own.
fn tokenize(line: &str) -> Result<Vec<String>, StorageError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '(' | ')' => {
                tokens.push(c.to_string());
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('"') => s.push('"'),
                            Some('\\') => s.push('\\'),
                            Some(other) => s.push(other),
                            None => return Err(StorageError::Serialization("unterminated escape".to_string())),
                        },
                        Some(other) => s.push(other),
                        None => return Err(StorageError::Serialization("unterminated string".to_string())),
                    }
                }
                tokens.push(format!("\"{s}\""));
            }
            _ => {
                let mut s = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '(' || c == ')' || c.is_whitespace() {
                        break;
                    }
                    s.push(c);
                    chars.next();
                }
                tokens.push(s);
            }
        }
    }
    Ok(tokens)
}

fn parse_record(line: &str) -> Result<AtomRecord, StorageError> {
    let bad = || StorageError::Serialization(format!("malformed atom record: {line}"));
    let tokens = tokenize(line)?;
    // (atom <handle> <type> (name "...") <strength> <confidence>)
    // (atom <handle> <type> (outgoing h h h) <strength> <confidence>)
    if tokens.len() < 8 || tokens[0] != "(" || tokens[1] != "atom" {
        return Err(bad());
    }
    let handle: u64 = tokens[2].parse().map_err(|_| bad())?;
    let type_name = tokens[3].clone();
    if tokens[4] != "(" {
        return Err(bad());
    }
    let payload_tag = tokens[5].clone();
    let mut idx = 6;
    let (name, outgoing) = match payload_tag.as_str() {
        "name" => {
            let raw = tokens.get(idx).ok_or_else(bad)?.clone();
            idx += 1;
            if tokens.get(idx).map(String::as_str) != Some(")") {
                return Err(bad());
            }
            idx += 1;
            let unquoted = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')).ok_or_else(bad)?;
            (Some(unquoted.to_string()), Vec::new())
        }
        "outgoing" => {
            let mut handles = Vec::new();
            while tokens.get(idx).map(String::as_str) != Some(")") {
                let h: u64 = tokens.get(idx).ok_or_else(bad)?.parse().map_err(|_| bad())?;
                handles.push(h);
                idx += 1;
            }
            idx += 1;
            (None, handles)
        }
        _ => return Err(bad()),
    };
    let strength: f64 = tokens.get(idx).ok_or_else(bad)?.parse().map_err(|_| bad())?;
    idx += 1;
    let confidence: f64 = tokens.get(idx).ok_or_else(bad)?.parse().map_err(|_| bad())?;
    idx += 1;
    if tokens.get(idx).map(String::as_str) != Some(")") {
        return Err(bad());
    }

    Ok(AtomRecord {
        handle,
        type_name,
        name,
        outgoing,
        strength,
        confidence,
    })
}

impl StorageNode for FileStorageNode {
    fn open(&mut self) -> Result<(), StorageError> {
        self.load_from_disk()?;
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.connected = false;
        Ok(())
    }

    fn connected(&self) -> bool {
        self.connected
    }

    fn store_atom(&mut self, record: &AtomRecord) -> Result<(), StorageError> {
        if !self.connected {
            return Err(StorageError::NotConnected);
        }
        self.records.insert(record.handle, record.clone());
        self.persist()
    }

    fn fetch_atom(&self, handle: Handle) -> Result<Option<AtomRecord>, StorageError> {
        if !self.connected {
            return Err(StorageError::NotConnected);
        }
        Ok(self.records.get(&handle.0).cloned())
    }

    fn delete_atom(&mut self, handle: Handle) -> Result<(), StorageError> {
        if !self.connected {
            return Err(StorageError::NotConnected);
        }
        self.records.remove(&handle.0);
        self.persist()
    }

    fn store_graph(&mut self, records: &[AtomRecord]) -> Result<(), StorageError> {
        if !self.connected {
            return Err(StorageError::NotConnected);
        }
        for record in records {
            self.records.insert(record.handle, record.clone());
        }
        self.persist()
    }

    fn load_graph(&self) -> Result<Vec<AtomRecord>, StorageError> {
        if !self.connected {
            return Err(StorageError::NotConnected);
        }
        Ok(self.records.values().cloned().collect())
    }

    fn stats(&self) -> BackendStats {
        BackendStats {
            atom_count: self.records.len() as u64,
            connected: self.connected,
            backend_kind: "file".to_string(),
        }
    }
}
