//! Work order expansion.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use jobroute_store::{Filter, Record, RecordStore, StoreResult};

use super::MACHINE_ID_FIELD;
use crate::config::Collections;
use crate::operations::{route_links, Operation, OPERATIONS};
use crate::random::RandomSource;
use crate::records::{BatchDates, Job, MachineAssignment, Route, StagingEntry};
use crate::report::{BatchError, ExpansionReport};
use crate::request::ExpansionRequest;

/// Expands a work order into staging rows, jobs, routes and machine
/// assignments.
///
/// Calls are issued one at a time. A failed write is recorded in the
/// report and skips only the records that depend on it; nothing already
/// written is rolled back.
pub struct ExpansionEngine<'a, S: ?Sized, R> {
    store: &'a S,
    collections: Collections,
    operations: &'a [Operation],
    rng: R,
    clock: Option<DateTime<Utc>>,
}

impl<'a, S, R> ExpansionEngine<'a, S, R>
where
    S: RecordStore + ?Sized,
    R: RandomSource,
{
    pub fn new(store: &'a S, collections: Collections, rng: R) -> Self {
        Self {
            store,
            collections,
            operations: &OPERATIONS,
            rng,
            clock: None,
        }
    }

    /// Replace the operation sequence.
    pub fn with_operations(mut self, operations: &'a [Operation]) -> Self {
        self.operations = operations;
        self
    }

    /// Pin "now" for date synthesis.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    /// Run the expansion.
    ///
    /// Only a failure to connect is returned as `Err`; every per-record
    /// failure lands in [`ExpansionReport::errors`].
    pub async fn expand(&mut self, request: &ExpansionRequest) -> StoreResult<ExpansionReport> {
        self.store.connect().await?;

        let now = self.clock.unwrap_or_else(Utc::now);
        let mut report = ExpansionReport::default();

        tracing::info!(
            work_order = %request.work_order_number,
            sub_ids = request.sub_id_entries.len(),
            jobs = request.total_quantity(),
            "Expanding work order"
        );

        self.create_staging_entries(request, now, &mut report).await;

        let machines = self.resolve_machines(&mut report.errors).await;
        let operations = self.operations;
        let links = route_links(operations);

        for entry in &request.sub_id_entries {
            for unit in 1..=entry.quantity {
                let job = Job::new(request, entry, unit, now);
                let display_name = job.display_name.clone();

                let job_record = match self.create(&self.collections.job, job).await {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::warn!(job = %display_name, error = %e, "Job creation failed");
                        report.errors.push(BatchError::Job {
                            display_name,
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };
                report.total_jobs += 1;

                for (op, link) in operations.iter().zip(&links) {
                    let route = Route::new(op, link, &job_record.id, &mut self.rng);
                    let route_record = match self.create(&self.collections.route, route).await {
                        Ok(record) => record,
                        Err(e) => {
                            tracing::warn!(
                                job = %display_name,
                                operation = op.name,
                                error = %e,
                                "Route creation failed"
                            );
                            report.errors.push(BatchError::Route {
                                display_name: display_name.clone(),
                                operation: op.name.to_string(),
                                reason: e.to_string(),
                            });
                            continue;
                        }
                    };
                    report.total_routes += 1;

                    let machine = machines.get(op.machine_id).cloned();
                    let assignment =
                        MachineAssignment::new(op, &route_record.id, machine, &mut self.rng);
                    match self.create(&self.collections.machine, assignment).await {
                        Ok(_) => report.total_machines += 1,
                        Err(e) => {
                            tracing::warn!(
                                job = %display_name,
                                operation = op.name,
                                error = %e,
                                "Machine assignment failed"
                            );
                            report.errors.push(BatchError::MachineAssignment {
                                display_name: display_name.clone(),
                                operation: op.name.to_string(),
                                reason: e.to_string(),
                            });
                        }
                    }
                }

                tracing::debug!(job = %display_name, id = %job_record.id, "Job expanded");
            }
        }

        tracing::info!(
            work_order = %request.work_order_number,
            staging = report.total_consolidate_entries,
            jobs = report.total_jobs,
            routes = report.total_routes,
            machines = report.total_machines,
            errors = report.errors.len(),
            "Expansion finished"
        );

        Ok(report)
    }

    async fn create_staging_entries(
        &mut self,
        request: &ExpansionRequest,
        now: DateTime<Utc>,
        report: &mut ExpansionReport,
    ) {
        let dates = BatchDates::synthesize(now, request.cust_order_want_date, &mut self.rng);

        for entry in &request.sub_id_entries {
            let row = StagingEntry::synthesize(request, entry, &dates, &mut self.rng);
            match self.create(&self.collections.staging, row).await {
                Ok(_) => report.total_consolidate_entries += 1,
                Err(e) => {
                    tracing::warn!(
                        work_order = %request.work_order_number,
                        sub_id = %entry.sub_id,
                        error = %e,
                        "Staging entry failed"
                    );
                    report.errors.push(BatchError::Staging {
                        work_order: request.work_order_number.clone(),
                        sub_id: entry.sub_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    /// Map machine identifier to machine-master record id.
    async fn resolve_machines(&self, errors: &mut Vec<BatchError>) -> HashMap<&'static str, String> {
        let mut resolved = HashMap::new();

        for op in self.operations {
            let filter = Filter::eq(MACHINE_ID_FIELD, op.machine_id);
            match self
                .store
                .first(&self.collections.machine_master, &filter)
                .await
            {
                Ok(Some(record)) => {
                    resolved.insert(op.machine_id, record.id);
                }
                Ok(None) => {
                    tracing::warn!(machine_id = op.machine_id, "Machine not found");
                    errors.push(BatchError::MachineNotFound {
                        machine_id: op.machine_id.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(machine_id = op.machine_id, error = %e, "Machine lookup failed");
                    errors.push(BatchError::MachineLookup {
                        machine_id: op.machine_id.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        resolved
    }

    async fn create(&self, collection: &str, payload: impl Serialize) -> StoreResult<Record> {
        let body = serde_json::to_value(payload)?;
        self.store.create(collection, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dry_run_store;
    use crate::random::ScriptedRandom;
    use crate::request::SubIdEntry;
    use chrono::TimeZone;
    use jobroute_store::{MemoryStore, StoreError};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap()
    }

    fn request(entries: Vec<SubIdEntry>) -> ExpansionRequest {
        ExpansionRequest {
            work_order_number: "IA-2026-123".to_string(),
            sub_id_entries: entries,
            cust_order_id: Some("SO-1001".to_string()),
            cust_order_line_no: Some(1),
            cust_order_want_date: None,
        }
    }

    fn scenario() -> ExpansionRequest {
        request(vec![SubIdEntry::new("1", 2), SubIdEntry::new("0", 1)])
    }

    async fn expand(store: &MemoryStore, req: &ExpansionRequest) -> ExpansionReport {
        ExpansionEngine::new(store, Collections::default(), StdRng::seed_from_u64(3))
            .with_clock(now())
            .expand(req)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_expand_scenario() {
        let c = Collections::default();
        let store = dry_run_store(&c, &OPERATIONS).await;

        let report = expand(&store, &scenario()).await;

        assert_eq!(report.total_jobs, 3);
        assert_eq!(report.total_routes, 15);
        assert_eq!(report.total_machines, 15);
        assert_eq!(report.total_consolidate_entries, 2);
        assert!(report.errors.is_empty());
        assert!(report.is_complete());

        assert_eq!(store.count(&c.job).await, 3);
        assert_eq!(store.count(&c.route).await, 15);
        assert_eq!(store.count(&c.machine).await, 15);
        assert_eq!(store.count(&c.staging).await, 2);

        let names: Vec<_> = store
            .records(&c.job)
            .await
            .iter()
            .map(|j| j.get_str("displayName").unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            ["IA-2026-123-1 (1/2)", "IA-2026-123-1 (2/2)", "IA-2026-123-0 (1/1)"]
        );

        for machine in store.records(&c.machine).await {
            assert!(machine.get_str("machine").is_some());
            assert_eq!(machine.get("isRunning"), Some(&serde_json::json!(false)));
        }
    }

    #[tokio::test]
    async fn test_routes_chain_per_job() {
        let c = Collections::default();
        let store = dry_run_store(&c, &OPERATIONS).await;
        expand(&store, &scenario()).await;

        let routes = store.records(&c.route).await;
        for job in store.records(&c.job).await {
            let job_routes: Vec<_> = routes
                .iter()
                .filter(|r| r.get_str("jobId") == Some(job.id.as_str()))
                .collect();
            assert_eq!(job_routes.len(), OPERATIONS.len());

            let head = job_routes
                .iter()
                .find(|r| r.get_str("previousSequence") == Some(""))
                .unwrap();
            let mut order = vec![head.get_str("sequence").unwrap()];
            let mut current = *head;
            while let Some(next) = current.get_str("nextSequence").filter(|s| !s.is_empty()) {
                current = *job_routes
                    .iter()
                    .find(|r| r.get_str("sequence") == Some(next))
                    .unwrap();
                order.push(next);
            }
            assert_eq!(order, ["10", "20", "30", "40", "50"]);

            let last: Vec<_> = job_routes
                .iter()
                .filter(|r| r.get("isLastOperation") == Some(&serde_json::json!(true)))
                .collect();
            assert_eq!(last.len(), 1);
            assert_eq!(last[0].get_str("sequence"), Some("50"));

            for r in &job_routes {
                let hours: u32 = r.get_str("runHrsPer").unwrap().parse().unwrap();
                assert!((1..=10).contains(&hours));
            }
        }
    }

    #[tokio::test]
    async fn test_totals_follow_quantities() {
        let cases = [vec![1], vec![3, 1], vec![2, 5, 1], vec![4, 4, 4, 4, 2]];
        for quantities in cases {
            let c = Collections::default();
            let store = dry_run_store(&c, &OPERATIONS).await;
            let entries = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| SubIdEntry::new(i.to_string(), *q))
                .collect();
            let req = request(entries);

            let report = expand(&store, &req).await;
            let expected: usize = quantities.iter().map(|q| *q as usize).sum();
            assert_eq!(report.total_jobs, expected);
            assert_eq!(report.total_routes, expected * 5);
            assert_eq!(report.total_machines, report.total_routes);
            assert_eq!(report.total_consolidate_entries, quantities.len());
            assert!(report.errors.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unresolved_machines_warn_and_continue() {
        let c = Collections::default();
        let store = MemoryStore::new();

        let report = expand(&store, &scenario()).await;

        assert_eq!(report.total_routes, 15);
        assert_eq!(report.total_machines, report.total_routes);
        assert_eq!(report.errors.len(), 5);
        assert!(report
            .errors
            .iter()
            .all(|e| matches!(e, BatchError::MachineNotFound { .. })));

        for machine in store.records(&c.machine).await {
            assert!(machine.get("machine").is_none());
            assert!(machine.get_str("machineId").is_some());
        }
    }

    #[tokio::test]
    async fn test_machine_lookup_failure_is_a_warning() {
        let c = Collections::default();
        let store = dry_run_store(&c, &OPERATIONS).await;
        store.fail_lists(&c.machine_master).await;

        let report = expand(&store, &scenario()).await;

        assert_eq!(report.total_machines, 15);
        assert_eq!(report.errors.len(), 5);
        assert!(report.errors.iter().all(BatchError::is_warning));
    }

    #[tokio::test]
    async fn test_job_failure_skips_its_routes() {
        let c = Collections::default();
        let store = dry_run_store(&c, &OPERATIONS).await;
        store
            .fail_creates(&c.job, Filter::eq("displayName", "IA-2026-123-1 (2/2)"))
            .await;

        let report = expand(&store, &scenario()).await;

        assert_eq!(report.total_jobs, 2);
        assert_eq!(report.total_routes, 10);
        assert_eq!(report.total_machines, 10);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.errors[0].to_string(),
            "Job creation error for IA-2026-123-1 (2/2): Failed to create record in ASWNDUBAI_Job."
        );
    }

    #[tokio::test]
    async fn test_route_failure_skips_only_its_machine() {
        let c = Collections::default();
        let store = dry_run_store(&c, &OPERATIONS).await;
        store
            .fail_creates(&c.route, Filter::eq("operationName", "BLASTING BOOTH-01"))
            .await;

        let report = expand(&store, &scenario()).await;

        assert_eq!(report.total_jobs, 3);
        assert_eq!(report.total_routes, 12);
        assert_eq!(report.total_machines, 12);
        assert_eq!(report.errors.len(), 3);
        assert!(matches!(
            &report.errors[0],
            BatchError::Route { operation, .. } if operation == "BLASTING BOOTH-01"
        ));
    }

    #[tokio::test]
    async fn test_machine_assignment_failure() {
        let c = Collections::default();
        let store = dry_run_store(&c, &OPERATIONS).await;
        store
            .fail_creates(&c.machine, Filter::eq("machineId", "SUBCONTRACT"))
            .await;

        let report = expand(&store, &scenario()).await;

        assert_eq!(report.total_routes, 15);
        assert_eq!(report.total_machines, 12);
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors[0]
            .to_string()
            .starts_with("Machine entry error for IA-2026-123-1 (1/2) / SUB CONTRACT:"));
    }

    #[tokio::test]
    async fn test_staging_failure_does_not_block_jobs() {
        let c = Collections::default();
        let store = dry_run_store(&c, &OPERATIONS).await;
        store
            .fail_creates(&c.staging, Filter::eq("BOM_WORKORDER_SUB_ID", "0"))
            .await;

        let report = expand(&store, &scenario()).await;

        assert_eq!(report.total_consolidate_entries, 1);
        assert_eq!(report.total_jobs, 3);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(&report.errors[0], BatchError::Staging { sub_id, .. } if sub_id == "0"));
    }

    #[tokio::test]
    async fn test_connect_failure_touches_nothing() {
        let c = Collections::default();
        let store = dry_run_store(&c, &OPERATIONS).await;
        store.fail_connect().await;

        let result = ExpansionEngine::new(&store, c.clone(), ScriptedRandom::lowest())
            .expand(&scenario())
            .await;

        assert!(matches!(result, Err(StoreError::Auth(_))));
        assert_eq!(store.count(&c.job).await, 0);
        assert_eq!(store.count(&c.staging).await, 0);
    }

    #[tokio::test]
    async fn test_custom_operation_sequence() {
        let c = Collections::default();
        let all: &'static [Operation] = &OPERATIONS;
        let operations = &all[..2];
        let store = dry_run_store(&c, operations).await;

        let report = ExpansionEngine::new(&store, c.clone(), StdRng::seed_from_u64(3))
            .with_operations(operations)
            .with_clock(now())
            .expand(&scenario())
            .await
            .unwrap();

        assert_eq!(report.total_jobs, 3);
        assert_eq!(report.total_routes, 6);
        assert_eq!(report.total_machines, 6);
        assert!(report.errors.is_empty());

        let routes = store.records(&c.route).await;
        let last: Vec<_> = routes
            .iter()
            .filter(|r| r.get("isLastOperation") == Some(&serde_json::json!(true)))
            .collect();
        assert_eq!(last.len(), 3);
        assert!(last.iter().all(|r| r.get_str("sequence") == Some("20")));
        assert!(routes
            .iter()
            .all(|r| r.get_str("operationName") != Some("SUB CONTRACT")));
    }

    #[tokio::test]
    async fn test_seeded_expansion_is_reproducible() {
        let c = Collections::default();
        let a = dry_run_store(&c, &OPERATIONS).await;
        let b = dry_run_store(&c, &OPERATIONS).await;

        expand(&a, &scenario()).await;
        expand(&b, &scenario()).await;

        assert_eq!(a.records(&c.staging).await, b.records(&c.staging).await);
        assert_eq!(a.records(&c.route).await, b.records(&c.route).await);
        assert_eq!(a.records(&c.machine).await, b.records(&c.machine).await);
    }
}
