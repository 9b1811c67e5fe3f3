use std::sync::{Arc, Mutex};

use ahash::RandomState;
use common::{BridgeError, BridgeResult};
use hashbrown::HashMap;
use uuid::Uuid;

use crate::table_data::TableData;

/// Accessors handed to script content, keyed by an opaque handle string.
///
/// A script keeps an accessor alive by holding its handle and gives it up with
/// [`HandleRegistry::release`]; dropping the registry drops every accessor.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    entries: Mutex<HashMap<String, Arc<TableData>, RandomState>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` and return its handle.
    pub fn insert(&self, data: TableData) -> BridgeResult<String> {
        let handle = Uuid::new_v4().to_string();
        self.lock()?.insert(handle.clone(), Arc::new(data));
        Ok(handle)
    }

    pub fn get(&self, handle: &str) -> BridgeResult<Arc<TableData>> {
        self.lock()?
            .get(handle)
            .cloned()
            .ok_or_else(|| BridgeError::Script(format!("unknown table handle '{handle}'")))
    }

    /// Forget a handle. Returns whether it was registered.
    pub fn release(&self, handle: &str) -> BridgeResult<bool> {
        Ok(self.lock()?.remove(handle).is_some())
    }

    pub fn clear(&self) -> BridgeResult<()> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> BridgeResult<std::sync::MutexGuard<'_, HashMap<String, Arc<TableData>, RandomState>>> {
        self.entries
            .lock()
            .map_err(|_| BridgeError::InvalidState("handle registry lock poisoned".into()))
    }
}
