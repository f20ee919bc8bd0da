//! Batch outcome reporting.

use serde::Serialize;
use thiserror::Error;

/// Kind of record a failed delete targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Staging,
    Job,
    Route,
    Machine,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Staging => write!(f, "ERP entry"),
            RecordKind::Job => write!(f, "job"),
            RecordKind::Route => write!(f, "route"),
            RecordKind::Machine => write!(f, "machine"),
        }
    }
}

/// A non-fatal problem collected while processing a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchError {
    #[error("ERP Consolidate error for {work_order}-{sub_id}: {reason}")]
    Staging {
        work_order: String,
        sub_id: String,
        reason: String,
    },

    #[error("Warning: Could not find machine \"{machine_id}\" in machineMaster")]
    MachineNotFound { machine_id: String },

    #[error("Warning: Could not look up machine \"{machine_id}\" in machineMaster: {reason}")]
    MachineLookup { machine_id: String, reason: String },

    #[error("Job creation error for {display_name}: {reason}")]
    Job { display_name: String, reason: String },

    #[error("Route error for {display_name} / {operation}: {reason}")]
    Route {
        display_name: String,
        operation: String,
        reason: String,
    },

    #[error("Machine entry error for {display_name} / {operation}: {reason}")]
    MachineAssignment {
        display_name: String,
        operation: String,
        reason: String,
    },

    #[error("Delete {record} {record_id}: {reason}")]
    Delete {
        record: RecordKind,
        record_id: String,
        reason: String,
    },

    #[error("Delete operation failed: {reason}")]
    OperationFailed { reason: String },
}

impl BatchError {
    /// Machine resolution problems degrade to an empty reference.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            BatchError::MachineNotFound { .. } | BatchError::MachineLookup { .. }
        )
    }
}

/// Outcome of an expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionReport {
    pub total_jobs: usize,
    pub total_routes: usize,
    pub total_machines: usize,
    pub total_consolidate_entries: usize,
    pub errors: Vec<BatchError>,
}

impl ExpansionReport {
    /// True when every record was written and every machine resolved.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_complete() {
            format!(
                "Created {} ERP entries, {} jobs, {} routes, {} machines",
                self.total_consolidate_entries,
                self.total_jobs,
                self.total_routes,
                self.total_machines
            )
        } else {
            format!("Completed with {} warning(s)", self.errors.len())
        }
    }
}

/// Outcome of a reversal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertReport {
    pub deleted_jobs: usize,
    pub deleted_routes: usize,
    pub deleted_machines: usize,
    pub deleted_consolidate_entries: usize,
    pub errors: Vec<BatchError>,
}

impl RevertReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_deleted(&self) -> usize {
        self.deleted_jobs
            + self.deleted_routes
            + self.deleted_machines
            + self.deleted_consolidate_entries
    }

    pub fn summary(&self) -> String {
        let counts = format!(
            "Deleted {} ERP entries, {} jobs, {} routes, {} machines",
            self.deleted_consolidate_entries,
            self.deleted_jobs,
            self.deleted_routes,
            self.deleted_machines
        );
        if self.is_complete() {
            counts
        } else {
            format!("{} with {} error(s)", counts, self.errors.len())
        }
    }
}
