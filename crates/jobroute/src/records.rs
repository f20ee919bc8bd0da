//! Record payloads written to the store.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::operations::{Operation, RouteLink};
use crate::random::RandomSource;
use crate::request::{ExpansionRequest, SubIdEntry};

const BOM_PART_IDS: [&str; 3] = ["WE0272", "FLNG_PRTC_2", "FG-40-1558_ REPAIR KIT SV-150"];
const WO_PRODUCT_CODES: [&str; 3] = ["_C-FBRCTN-N", "_C-VRM-IS-WLD-R", "_R-ACCU-BOTTL-R"];
const BOM_OPERATION_SEQ_NOS: [u32; 5] = [10, 20, 30, 40, 50];
const YES_NO: [&str; 2] = ["Y", "N"];

fn iso<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn iso_opt<S: Serializer>(date: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => iso(d, s),
        None => s.serialize_none(),
    }
}

fn days_after(date: DateTime<Utc>, rng: &mut impl RandomSource, min: i64, max: i64) -> DateTime<Utc> {
    date + Duration::days(rng.int_in(min, max))
}

/// Dates shared by every staging entry of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDates {
    pub now: DateTime<Utc>,
    pub cust_order_want_date: DateTime<Utc>,
    pub cust_order_line_want_date: DateTime<Utc>,
    pub wo_release_date: DateTime<Utc>,
    pub wo_want_date: DateTime<Utc>,
}

impl BatchDates {
    /// Synthesize batch dates relative to `now`.
    ///
    /// The line want date falls 1-7 days before the order want date, never
    /// further back than today allows.
    pub fn synthesize(
        now: DateTime<Utc>,
        want_date: Option<DateTime<Utc>>,
        rng: &mut impl RandomSource,
    ) -> Self {
        let cust_order_want_date = match want_date {
            Some(d) => d,
            None => days_after(now, rng, 1, 30),
        };

        let days_diff = (cust_order_want_date - now).num_days();
        let days_before = if days_diff > 0 {
            rng.int_in(1, days_diff.min(7))
        } else {
            1
        };
        let cust_order_line_want_date = cust_order_want_date - Duration::days(days_before);

        let wo_release_date = days_after(now, rng, 1, 14);
        let wo_want_date = days_after(now, rng, 1, 30);

        Self {
            now,
            cust_order_want_date,
            cust_order_line_want_date,
            wo_release_date,
            wo_want_date,
        }
    }
}

/// ERP staging row, one per sub-identifier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StagingEntry {
    pub txn_type: &'static str,

    pub cust_order_id: Option<String>,
    pub cust_order_line_no: Option<u32>,
    #[serde(serialize_with = "iso")]
    pub cust_order_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub cust_order_want_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub cust_order_line_want_date: DateTime<Utc>,
    pub cust_order_status: &'static str,

    pub bom_workorder_base_id: String,
    pub bom_workorder_sub_id: String,
    pub bom_workorder_type: &'static str,
    pub bom_workorder_lot_id: String,
    pub bom_workorder_split_id: String,
    pub bom_part_id: &'static str,
    pub bom_qty: u32,
    pub bom_operation_seq_no: u32,
    pub bom_piece_no: Option<u32>,

    pub wo_assmb_part_id: String,
    pub wo_assmb_qty: u32,
    #[serde(serialize_with = "iso")]
    pub wo_create_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub wo_rls_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub wo_want_date: DateTime<Utc>,
    pub wo_status: &'static str,
    pub wo_product_code: &'static str,
    pub wo_asw_status: String,

    pub part_is_manufacture: &'static str,
    pub part_category: &'static str,

    pub purc_req_id: String,
    pub purc_req_line_no: i64,
    pub purc_req_part_id: String,
    pub purc_req_qty: i64,
    #[serde(serialize_with = "iso")]
    pub purc_req_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub purc_req_want_date: DateTime<Utc>,

    pub purc_order_id: String,
    pub po_line_no: i64,
    pub po_qty: i64,
    #[serde(serialize_with = "iso")]
    pub purc_order_date: DateTime<Utc>,
    pub purc_order_status: String,
    #[serde(serialize_with = "iso")]
    pub po_want_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub po_etd: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub po_eta: DateTime<Utc>,

    pub grn_id: String,
    pub grn_line_no: i64,
    pub grn_qty: i64,
    pub grn_inspect_qty: i64,
    pub grn_rejected_qty: i64,
    #[serde(serialize_with = "iso")]
    pub grn_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub grn_create_date: DateTime<Utc>,

    pub inv_trans_id: i64,
    pub inv_trans_part_id: String,
    pub inv_trans_type: String,
    pub inv_trans_class: String,
    pub inv_trans_qty: i64,
    #[serde(serialize_with = "iso")]
    pub inv_trans_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub inv_trans_create_date: DateTime<Utc>,
}

impl StagingEntry {
    pub fn synthesize(
        request: &ExpansionRequest,
        entry: &SubIdEntry,
        dates: &BatchDates,
        rng: &mut impl RandomSource,
    ) -> Self {
        let now = dates.now;

        let bom_part_id = *rng.pick(&BOM_PART_IDS);
        let wo_product_code = *rng.pick(&WO_PRODUCT_CODES);
        let bom_operation_seq_no = *rng.pick(&BOM_OPERATION_SEQ_NOS);

        let purc_req_date = days_after(now, rng, 0, 30);
        let purc_req_want_date = days_after(purc_req_date, rng, 1, 14);
        let purc_order_date = days_after(now, rng, 0, 30);
        let po_want_date = days_after(purc_order_date, rng, 1, 30);
        let po_etd = days_after(po_want_date, rng, 1, 14);
        let po_eta = days_after(po_etd, rng, 1, 7);
        let grn_date = days_after(now, rng, 0, 60);
        let grn_create_date = days_after(grn_date, rng, 0, 7);
        let inv_trans_date = days_after(now, rng, 0, 60);
        let inv_trans_create_date = days_after(inv_trans_date, rng, 0, 7);

        Self {
            txn_type: "BOM",

            cust_order_id: request.cust_order_id.clone(),
            cust_order_line_no: request.cust_order_line_no,
            cust_order_date: now,
            cust_order_want_date: dates.cust_order_want_date,
            cust_order_line_want_date: dates.cust_order_line_want_date,
            cust_order_status: "R",

            bom_workorder_base_id: request.work_order_number.clone(),
            bom_workorder_sub_id: entry.sub_id.clone(),
            bom_workorder_type: "W",
            bom_workorder_lot_id: rng.code(12),
            bom_workorder_split_id: rng.int_in(0, 9).to_string(),
            bom_part_id,
            bom_qty: entry.quantity,
            bom_operation_seq_no,
            bom_piece_no: entry.sub_id.parse().ok(),

            wo_assmb_part_id: rng.code(10),
            wo_assmb_qty: entry.quantity,
            wo_create_date: now,
            wo_rls_date: dates.wo_release_date,
            wo_want_date: dates.wo_want_date,
            wo_status: "R",
            wo_product_code,
            wo_asw_status: rng.code(6),

            part_is_manufacture: *rng.pick(&YES_NO),
            part_category: "RM",

            purc_req_id: rng.code(10),
            purc_req_line_no: rng.int_in(1, 100),
            purc_req_part_id: rng.code(10),
            purc_req_qty: rng.int_in(1, 1000),
            purc_req_date,
            purc_req_want_date,

            purc_order_id: rng.code(10),
            po_line_no: rng.int_in(1, 100),
            po_qty: rng.int_in(1, 1000),
            purc_order_date,
            purc_order_status: rng.code(6),
            po_want_date,
            po_etd,
            po_eta,

            grn_id: rng.code(10),
            grn_line_no: rng.int_in(1, 100),
            grn_qty: rng.int_in(1, 1000),
            grn_inspect_qty: rng.int_in(0, 1000),
            grn_rejected_qty: rng.int_in(0, 100),
            grn_date,
            grn_create_date,

            inv_trans_id: rng.int_in(1000, 9999),
            inv_trans_part_id: rng.code(10),
            inv_trans_type: rng.code(6),
            inv_trans_class: rng.code(6),
            inv_trans_qty: rng.int_in(1, 1000),
            inv_trans_date,
            inv_trans_create_date,
        }
    }
}

/// Job record, one per unit of quantity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub work_order_number: String,
    pub sub_id: String,
    pub job_qty: &'static str,
    pub display_name: String,

    pub product_code: String,
    pub product_description: String,
    pub product_type: &'static str,
    pub part_id: String,

    #[serde(serialize_with = "iso")]
    pub creation_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub last_update_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub order_start_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub order_end_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub sales_order_creation_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub prefered_delivery_date: DateTime<Utc>,
    #[serde(serialize_with = "iso")]
    pub sync_timestamp: DateTime<Utc>,
    #[serde(serialize_with = "iso_opt")]
    pub job_completion_date: Option<DateTime<Utc>>,

    pub sales_order_number: Option<String>,
    pub so_line_number: String,
    pub sales_order_line_number: String,
    pub sales_order_quantity: String,

    pub customer_name: String,
    pub customer_number: String,

    pub job_status: &'static str,
    pub is_in_progress: bool,
    pub is_completed: bool,
    pub sync_status: &'static str,

    pub drawing_tag: String,
    pub serial_number: String,
}

/// `"{workOrder}-{subId} ({unit}/{quantity})"`
pub fn display_name(work_order: &str, sub_id: &str, unit: u32, quantity: u32) -> String {
    format!("{}-{} ({}/{})", work_order, sub_id, unit, quantity)
}

impl Job {
    pub fn new(
        request: &ExpansionRequest,
        entry: &SubIdEntry,
        unit: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let wo = &request.work_order_number;
        let sub = &entry.sub_id;
        let cust = request.cust_order_id.as_deref().unwrap_or_default();
        let line_no = request
            .cust_order_line_no
            .map(|n| n.to_string())
            .unwrap_or_default();

        Self {
            work_order_number: wo.clone(),
            sub_id: sub.clone(),
            job_qty: "1",
            display_name: display_name(wo, sub, unit, entry.quantity),

            product_code: format!("PROD-{}-{}", wo, sub),
            product_description: format!("Product for {}-{}", wo, sub),
            product_type: "Standard",
            part_id: format!("PART-{}-{}", wo, sub),

            creation_date: now,
            last_update_date: now,
            order_start_date: now,
            order_end_date: now,
            sales_order_creation_date: now,
            prefered_delivery_date: now,
            sync_timestamp: now,
            job_completion_date: None,

            sales_order_number: request.cust_order_id.clone(),
            so_line_number: line_no.clone(),
            sales_order_line_number: line_no,
            sales_order_quantity: entry.quantity.to_string(),

            customer_name: format!("Customer-{}", cust),
            customer_number: format!("CUST-{}", cust),

            job_status: "Created",
            is_in_progress: false,
            is_completed: false,
            sync_status: "Pending",

            drawing_tag: String::new(),
            serial_number: String::new(),
        }
    }
}

/// One operation step of a job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub operation_name: &'static str,
    pub sequence: &'static str,
    pub previous_sequence: String,
    pub next_sequence: String,
    pub job_id: String,
    pub is_completed: bool,
    pub is_last_operation: bool,
    pub status: &'static str,
    pub run_hrs_per: String,
}

impl Route {
    pub fn new(
        operation: &Operation,
        link: &RouteLink,
        job_id: &str,
        rng: &mut impl RandomSource,
    ) -> Self {
        Self {
            operation_name: operation.name,
            sequence: operation.sequence,
            previous_sequence: link.previous_sequence.clone(),
            next_sequence: link.next_sequence.clone(),
            job_id: job_id.to_string(),
            is_completed: false,
            is_last_operation: link.is_last,
            status: "",
            run_hrs_per: rng.int_in(1, 10).to_string(),
        }
    }
}

/// Binding of a route to a machine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineAssignment {
    #[serde(rename = "jobreceipeId")]
    pub route_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    pub machine_id: &'static str,
    pub cycle_time: String,
    pub is_running: bool,
    pub is_priority: bool,
}

impl MachineAssignment {
    pub fn new(
        operation: &Operation,
        route_id: &str,
        machine: Option<String>,
        rng: &mut impl RandomSource,
    ) -> Self {
        Self {
            route_id: route_id.to_string(),
            machine,
            machine_id: operation.machine_id,
            cycle_time: rng.int_in(0, 10).to_string(),
            is_running: false,
            is_priority: false,
        }
    }
}
