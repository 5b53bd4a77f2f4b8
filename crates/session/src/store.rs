//! Session metadata store
//!
//! Records are keyed by session id. The JSON file store keeps the whole list
//! in one pretty-printed file and rewrites it on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ContractError, SessionId, SessionRecord, StoreConfig};
use tracing::debug;

/// Session record sink
pub trait SessionStore: Send + Sync {
    /// Insert a new record, rejecting duplicate ids
    fn insert(&self, record: &SessionRecord) -> Result<(), ContractError>;

    /// Replace an existing record
    fn update(&self, record: &SessionRecord) -> Result<(), ContractError>;

    fn get(&self, id: SessionId) -> Result<Option<SessionRecord>, ContractError>;

    /// Highest stored id, `None` when the store is empty
    fn max_session_id(&self) -> Result<Option<SessionId>, ContractError>;

    /// All records ordered by id
    fn list(&self) -> Result<Vec<SessionRecord>, ContractError>;
}

type Records = BTreeMap<SessionId, SessionRecord>;

fn insert_into(records: &mut Records, record: &SessionRecord) -> Result<(), ContractError> {
    if records.contains_key(&record.session_id) {
        return Err(ContractError::store(format!(
            "session {} already exists",
            record.session_id
        )));
    }
    records.insert(record.session_id, record.clone());
    Ok(())
}

fn update_in(records: &mut Records, record: &SessionRecord) -> Result<(), ContractError> {
    match records.get_mut(&record.session_id) {
        Some(slot) => {
            *slot = record.clone();
            Ok(())
        }
        None => Err(ContractError::store(format!(
            "session {} not found",
            record.session_id
        ))),
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    records: Mutex<Records>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, record: &SessionRecord) -> Result<(), ContractError> {
        insert_into(&mut self.records(), record)
    }

    fn update(&self, record: &SessionRecord) -> Result<(), ContractError> {
        update_in(&mut self.records(), record)
    }

    fn get(&self, id: SessionId) -> Result<Option<SessionRecord>, ContractError> {
        Ok(self.records().get(&id).cloned())
    }

    fn max_session_id(&self) -> Result<Option<SessionId>, ContractError> {
        Ok(self.records().keys().next_back().copied())
    }

    fn list(&self) -> Result<Vec<SessionRecord>, ContractError> {
        Ok(self.records().values().cloned().collect())
    }
}

/// Store persisted as a JSON array in one file
#[derive(Debug)]
pub struct JsonFileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileSessionStore {
    /// Open a store at `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> Result<Records, ContractError> {
        if !self.path.exists() {
            return Ok(Records::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Records::new());
        }
        let list: Vec<SessionRecord> = serde_json::from_str(&content).map_err(|e| {
            ContractError::store(format!("corrupt store {}: {e}", self.path.display()))
        })?;
        Ok(list.into_iter().map(|r| (r.session_id, r)).collect())
    }

    fn save(&self, records: &Records) -> Result<(), ContractError> {
        let list: Vec<&SessionRecord> = records.values().collect();
        let content = serde_json::to_string_pretty(&list)
            .map_err(|e| ContractError::store(format!("encode failed: {e}")))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), records = records.len(), "session store written");
        Ok(())
    }

    fn modify(
        &self,
        change: impl FnOnce(&mut Records) -> Result<(), ContractError>,
    ) -> Result<(), ContractError> {
        let _guard = self.guard();
        let mut records = self.load()?;
        change(&mut records)?;
        self.save(&records)
    }
}

impl SessionStore for JsonFileSessionStore {
    fn insert(&self, record: &SessionRecord) -> Result<(), ContractError> {
        self.modify(|records| insert_into(records, record))
    }

    fn update(&self, record: &SessionRecord) -> Result<(), ContractError> {
        self.modify(|records| update_in(records, record))
    }

    fn get(&self, id: SessionId) -> Result<Option<SessionRecord>, ContractError> {
        let _guard = self.guard();
        Ok(self.load()?.remove(&id))
    }

    fn max_session_id(&self) -> Result<Option<SessionId>, ContractError> {
        let _guard = self.guard();
        Ok(self.load()?.keys().next_back().copied())
    }

    fn list(&self) -> Result<Vec<SessionRecord>, ContractError> {
        let _guard = self.guard();
        Ok(self.load()?.into_values().collect())
    }
}

/// Store selected by configuration: JSON file when a path is set
pub fn open_store(config: &StoreConfig) -> Arc<dyn SessionStore> {
    match &config.path {
        Some(path) => Arc::new(JsonFileSessionStore::new(path.clone())),
        None => Arc::new(InMemorySessionStore::new()),
    }
}

/// Id for the next session: highest stored id + 1, or 1
pub fn next_session_id(store: &dyn SessionStore) -> Result<SessionId, ContractError> {
    Ok(store
        .max_session_id()?
        .map(SessionId::next)
        .unwrap_or_else(|| SessionId::new(1)))
}
