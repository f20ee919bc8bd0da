//! In-memory record store.
//!
//! Backs dry runs and tests. Failures can be injected per collection to
//! exercise partial-success paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::store::{Filter, Record, RecordPage, RecordStore};

#[derive(Debug, Default)]
struct Faults {
    connect: bool,
    creates: Vec<(String, Filter)>,
    lists: Vec<String>,
    deletes: Vec<(String, Option<String>)>,
}

/// Record store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Record>>>,
    faults: Mutex<Faults>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("mem{:012}", n)
    }

    /// Insert a record directly, bypassing fault injection.
    pub async fn insert(&self, collection: &str, fields: serde_json::Value) -> Record {
        let record = self.build_record(fields);
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    /// All records of a collection in insertion order.
    pub async fn records(&self, collection: &str) -> Vec<Record> {
        self.collections
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of records in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Make every `connect` call fail.
    pub async fn fail_connect(&self) {
        self.faults.lock().await.connect = true;
    }

    /// Fail creates in `collection` whose body matches `filter`.
    pub async fn fail_creates(&self, collection: &str, filter: Filter) {
        self.faults
            .lock()
            .await
            .creates
            .push((collection.to_string(), filter));
    }

    /// Fail every list query on `collection`.
    pub async fn fail_lists(&self, collection: &str) {
        self.faults.lock().await.lists.push(collection.to_string());
    }

    /// Fail deletes in `collection`, either for one id or for all.
    pub async fn fail_deletes(&self, collection: &str, id: Option<&str>) {
        self.faults
            .lock()
            .await
            .deletes
            .push((collection.to_string(), id.map(str::to_string)));
    }

    /// Remove every injected fault.
    pub async fn clear_faults(&self) {
        *self.faults.lock().await = Faults::default();
    }

    fn build_record(&self, fields: serde_json::Value) -> Record {
        let fields = match fields {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Record {
            id: self.next_id(),
            fields,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn connect(&self) -> StoreResult<()> {
        if self.faults.lock().await.connect {
            return Err(StoreError::Auth("connection refused".to_string()));
        }
        Ok(())
    }

    async fn create(&self, collection: &str, body: &serde_json::Value) -> StoreResult<Record> {
        let record = self.build_record(body.clone());

        let rejected = self
            .faults
            .lock()
            .await
            .creates
            .iter()
            .any(|(c, f)| c == collection && f.matches(&record));
        if rejected {
            return Err(StoreError::Injected(format!(
                "Failed to create record in {}.",
                collection
            )));
        }

        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn list(
        &self,
        collection: &str,
        filter: &Filter,
        page: u32,
        per_page: u32,
    ) -> StoreResult<RecordPage> {
        if self.faults.lock().await.lists.iter().any(|c| c == collection) {
            return Err(StoreError::Injected(format!(
                "Failed to list records in {}.",
                collection
            )));
        }

        let matching: Vec<Record> = self
            .collections
            .lock()
            .await
            .get(collection)
            .map(|records| records.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();

        let page = page.max(1);
        let per_page = per_page.max(1);
        let total_items = matching.len() as i64;
        let total_pages = (total_items + i64::from(per_page) - 1) / i64::from(per_page);
        let offset = u64::from(page - 1) * u64::from(per_page);
        let items = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(per_page as usize)
            .collect();

        Ok(RecordPage {
            page,
            per_page,
            total_items,
            total_pages,
            items,
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let rejected = self
            .faults
            .lock()
            .await
            .deletes
            .iter()
            .any(|(c, target)| c == collection && target.as_deref().map_or(true, |t| t == id));
        if rejected {
            return Err(StoreError::Injected(format!(
                "Failed to delete record {}.",
                id
            )));
        }

        let mut collections = self.collections.lock().await;
        let records = collections.get_mut(collection).ok_or_else(|| StoreError::Api {
            status: 404,
            message: "The requested resource wasn't found.".to_string(),
        })?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::Api {
                status: 404,
                message: "The requested resource wasn't found.".to_string(),
            });
        }
        Ok(())
    }
}
