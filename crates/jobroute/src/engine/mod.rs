//! Expansion and reversal engines.

mod expand;
mod revert;

pub use expand::ExpansionEngine;
pub use revert::ReversalEngine;

use jobroute_store::MemoryStore;

use crate::config::Collections;
use crate::operations::Operation;

/// Field holding the machine identifier in machine-master and
/// machine-assignment records.
pub(crate) const MACHINE_ID_FIELD: &str = "machineId";

/// In-memory store whose machine master holds one record per operation.
pub async fn dry_run_store(collections: &Collections, operations: &[Operation]) -> MemoryStore {
    let store = MemoryStore::new();
    for op in operations {
        store
            .insert(
                &collections.machine_master,
                serde_json::json!({
                    MACHINE_ID_FIELD: op.machine_id,
                    "machineName": op.name,
                }),
            )
            .await;
    }
    store
}
