//! Work order entry form and its validation.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

use crate::request::{sub_id_list, ExpansionRequest, SubIdEntry};

/// Form validation failure. Checks run in declaration order; the first
/// failing one is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Work order number is required")]
    MissingWorkOrder,

    #[error("Please enter a valid number of sub IDs")]
    InvalidSubIdCount,

    #[error("Sales order ID is required")]
    MissingCustOrderId,

    #[error("Please enter a valid line number")]
    InvalidLineNumber,

    #[error("All sub ID quantities must be at least 1")]
    InvalidQuantities,
}

/// How sub-identifiers without a positive quantity are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuantityPolicy {
    /// Reject the form.
    #[default]
    Strict,
    /// Drop those sub-identifiers.
    Lenient,
}

/// Raw form input.
#[derive(Debug, Clone, Default)]
pub struct WorkOrderForm {
    pub work_order_suffix: String,
    pub sub_id_count: u32,
    pub quantities: HashMap<String, u32>,
    pub cust_order_id: String,
    pub cust_order_line_no: u32,
    pub cust_order_want_date: Option<DateTime<Utc>>,
}

impl WorkOrderForm {
    /// Full work order number: `prefix` followed by the trimmed suffix.
    pub fn work_order_number(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.work_order_suffix.trim())
    }

    /// Sub-identifiers the form asks quantities for.
    pub fn sub_ids(&self) -> Vec<String> {
        sub_id_list(self.sub_id_count)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.work_order_suffix.trim().is_empty() {
            return Err(ValidationError::MissingWorkOrder);
        }
        if self.sub_id_count == 0 {
            return Err(ValidationError::InvalidSubIdCount);
        }
        if self.cust_order_id.trim().is_empty() {
            return Err(ValidationError::MissingCustOrderId);
        }
        if self.cust_order_line_no == 0 {
            return Err(ValidationError::InvalidLineNumber);
        }
        Ok(())
    }

    /// Validate and build the expansion request.
    pub fn into_request(
        self,
        prefix: &str,
        policy: QuantityPolicy,
    ) -> Result<ExpansionRequest, ValidationError> {
        self.validate()?;

        let entries: Vec<SubIdEntry> = self
            .sub_ids()
            .into_iter()
            .map(|sub_id| {
                let quantity = self.quantities.get(&sub_id).copied().unwrap_or(0);
                SubIdEntry::new(sub_id, quantity)
            })
            .collect();

        let entries = match policy {
            QuantityPolicy::Strict => {
                if entries.iter().any(|e| e.quantity == 0) {
                    return Err(ValidationError::InvalidQuantities);
                }
                entries
            }
            QuantityPolicy::Lenient => entries.into_iter().filter(|e| e.quantity > 0).collect(),
        };

        if entries.is_empty() {
            return Err(ValidationError::InvalidQuantities);
        }

        Ok(ExpansionRequest {
            work_order_number: self.work_order_number(prefix),
            sub_id_entries: entries,
            cust_order_id: Some(self.cust_order_id.trim().to_string()),
            cust_order_line_no: Some(self.cust_order_line_no),
            cust_order_want_date: self.cust_order_want_date,
        })
    }
}
