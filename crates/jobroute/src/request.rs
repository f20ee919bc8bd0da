//! Expansion input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sub-identifier reserved for the main assembly.
pub const MAIN_ASSEMBLY: &str = "0";

/// Quantity requested for one sub-assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubIdEntry {
    pub sub_id: String,
    pub quantity: u32,
}

impl SubIdEntry {
    pub fn new(sub_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            sub_id: sub_id.into(),
            quantity,
        }
    }
}

/// Validated input to the expansion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionRequest {
    pub work_order_number: String,
    pub sub_id_entries: Vec<SubIdEntry>,
    #[serde(default)]
    pub cust_order_id: Option<String>,
    #[serde(default)]
    pub cust_order_line_no: Option<u32>,
    #[serde(default)]
    pub cust_order_want_date: Option<DateTime<Utc>>,
}

impl ExpansionRequest {
    /// Jobs a fully successful expansion creates.
    pub fn total_quantity(&self) -> u64 {
        self.sub_id_entries
            .iter()
            .map(|e| u64::from(e.quantity))
            .sum()
    }
}

/// Sub-identifiers for `count` sub-assemblies: `"1"..="count"`, then the
/// main assembly `"0"` last. Empty when `count` is zero.
pub fn sub_id_list(count: u32) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }
    (1..=count)
        .map(|i| i.to_string())
        .chain(std::iter::once(MAIN_ASSEMBLY.to_string()))
        .collect()
}
