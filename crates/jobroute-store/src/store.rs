//! Record store trait and shared record types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreResult;

/// Page size used by [`RecordStore::full_list`].
pub const FULL_LIST_BATCH: u32 = 500;

/// A stored record: the store-assigned id plus every other field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record id assigned by the store.
    pub id: String,

    /// Remaining fields as returned by the store.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    /// Look up a field value.
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields.get(field)
    }

    /// Look up a string field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }
}

/// One page of a list query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub page: u32,
    pub per_page: u32,
    #[serde(default)]
    pub total_items: i64,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub items: Vec<Record>,
}

impl RecordPage {
    /// Returns true if no later page can hold more records.
    pub fn is_last(&self) -> bool {
        self.items.is_empty() || i64::from(self.page) >= self.total_pages
    }
}

/// Equality filter `field="value"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    field: String,
    value: String,
}

impl Filter {
    /// Match records whose `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Evaluate the filter against a record.
    ///
    /// Numbers and booleans compare by their textual form, matching how the
    /// remote store coerces a quoted literal.
    pub fn matches(&self, record: &Record) -> bool {
        if self.field == "id" {
            return record.id == self.value;
        }
        match record.get(&self.field) {
            Some(serde_json::Value::String(s)) => *s == self.value,
            Some(serde_json::Value::Number(n)) => n.to_string() == self.value,
            Some(serde_json::Value::Bool(b)) => b.to_string() == self.value,
            Some(serde_json::Value::Null) | None => self.value.is_empty(),
            Some(_) => false,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=\"", self.field)?;
        for c in self.value.chars() {
            if c == '"' || c == '\\' {
                write!(f, "\\")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "\"")
    }
}

/// Collection-oriented record store.
///
/// Every call is a single remote round trip; nothing is retried.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Establish a session if none is valid.
    async fn connect(&self) -> StoreResult<()>;

    /// Create a record and return it as stored.
    async fn create(&self, collection: &str, body: &serde_json::Value) -> StoreResult<Record>;

    /// Fetch one page of records matching `filter`. Pages are 1-based.
    async fn list(
        &self,
        collection: &str,
        filter: &Filter,
        page: u32,
        per_page: u32,
    ) -> StoreResult<RecordPage>;

    /// Delete a record by id.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// First record matching `filter`, if any.
    async fn first(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Record>> {
        let page = self.list(collection, filter, 1, 1).await?;
        Ok(page.items.into_iter().next())
    }

    /// Every record matching `filter`, fetched page by page.
    async fn full_list(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        let mut records = Vec::new();
        let mut page_no = 1;

        loop {
            let page = self
                .list(collection, filter, page_no, FULL_LIST_BATCH)
                .await?;
            let last = page.is_last();
            records.extend(page.items);
            if last {
                break;
            }
            page_no += 1;
        }

        tracing::trace!(
            collection,
            filter = %filter,
            count = records.len(),
            "Full list fetched"
        );

        Ok(records)
    }
}
