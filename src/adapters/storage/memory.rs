use std::collections::HashMap;

use crate::domain::atom::Handle;
use crate::domain::errors::StorageError;
use crate::ports::storage::{AtomRecord, BackendStats, StorageNode};

/// In-memory backend for unit tests and embedding hosts that don't need
/// durability. `open`/`close` just flip a flag — there's nothing to
/// connect to.
#[derive(Default)]
pub struct InMemoryStorageNode {
    records: HashMap<u64, AtomRecord>,
    connected: bool,
}

impl InMemoryStorageNode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageNode for InMemoryStorageNode {
    fn open(&mut self) -> Result<(), StorageError> {
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
        Ok(())
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
        Ok(())
    }

    fn store_graph(&mut self, records: &[AtomRecord]) -> Result<(), StorageError> {
        if !self.connected {
            return Err(StorageError::NotConnected);
        }
        for record in records {
            self.records.insert(record.handle, record.clone());
        }
        Ok(())
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
            backend_kind: "memory".to_string(),
        }
    }
}
