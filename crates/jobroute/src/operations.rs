//! Fixed operation sequence applied to every job.

use serde::Serialize;

/// One manufacturing operation and the machine it runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: &'static str,
    pub sequence: &'static str,
    pub machine_id: &'static str,
}

/// Every job gets one route per entry, in this order.
pub const OPERATIONS: [Operation; 5] = [
    Operation {
        name: "MANUAL WORK - QC",
        sequence: "10",
        machine_id: "MANUALWORK-QC",
    },
    Operation {
        name: "FITTING AND ASSEMBLY - FLP",
        sequence: "20",
        machine_id: "FIT-ASMBLY-FLP",
    },
    Operation {
        name: "BLASTING BOOTH-01",
        sequence: "30",
        machine_id: "BLAST-01",
    },
    Operation {
        name: "AUTOTIG-02 FOR CLADDING - FRONIUS",
        sequence: "40",
        machine_id: "AUTOTIG-01",
    },
    Operation {
        name: "SUB CONTRACT",
        sequence: "50",
        machine_id: "SUBCONTRACT",
    },
];

/// Position of an operation within the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLink {
    pub previous_sequence: String,
    pub next_sequence: String,
    pub is_last: bool,
}

/// Neighbour links for each operation; `""` at both ends.
pub fn route_links(operations: &[Operation]) -> Vec<RouteLink> {
    let last = operations.len().saturating_sub(1);
    operations
        .iter()
        .enumerate()
        .map(|(i, _)| RouteLink {
            previous_sequence: if i > 0 {
                operations[i - 1].sequence.to_string()
            } else {
                String::new()
            },
            next_sequence: if i < last {
                operations[i + 1].sequence.to_string()
            } else {
                String::new()
            },
            is_last: i == last,
        })
        .collect()
}
