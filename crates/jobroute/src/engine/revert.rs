//! Work order reversal.

use jobroute_store::{Filter, RecordStore, StoreResult};

use crate::config::Collections;
use crate::report::{BatchError, RecordKind, RevertReport};

const STAGING_WORK_ORDER_FIELD: &str = "BOM_WORKORDER_BASE_ID";
const JOB_WORK_ORDER_FIELD: &str = "workOrderNumber";
const ROUTE_JOB_FIELD: &str = "jobId";
const MACHINE_ROUTE_FIELD: &str = "jobreceipeId";

/// Deletes everything an expansion created for a work order.
///
/// Children go before parents: machine assignments, then their route, then
/// the job. Records whose parent is already gone are not searched for.
pub struct ReversalEngine<'a, S: ?Sized> {
    store: &'a S,
    collections: Collections,
}

impl<'a, S> ReversalEngine<'a, S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: &'a S, collections: Collections) -> Self {
        Self { store, collections }
    }

    /// Delete the staging rows and job tree of `work_order`.
    ///
    /// Only a failure to connect is returned as `Err`. A failed lookup stops
    /// the cascade and is reported once; failed deletes are reported and
    /// skipped.
    pub async fn revert(&self, work_order: &str) -> StoreResult<RevertReport> {
        self.store.connect().await?;

        tracing::info!(work_order, "Reverting work order");

        let mut report = RevertReport::default();
        if let Err(e) = self.cascade(work_order, &mut report).await {
            tracing::error!(work_order, error = %e, "Revert aborted");
            report.errors.push(BatchError::OperationFailed {
                reason: e.to_string(),
            });
        }

        tracing::info!(
            work_order,
            staging = report.deleted_consolidate_entries,
            jobs = report.deleted_jobs,
            routes = report.deleted_routes,
            machines = report.deleted_machines,
            errors = report.errors.len(),
            "Revert finished"
        );

        Ok(report)
    }

    async fn cascade(&self, work_order: &str, report: &mut RevertReport) -> StoreResult<()> {
        let c = &self.collections;

        let staging = self
            .store
            .full_list(&c.staging, &Filter::eq(STAGING_WORK_ORDER_FIELD, work_order))
            .await?;
        for row in &staging {
            if self.delete(RecordKind::Staging, &c.staging, &row.id, report).await {
                report.deleted_consolidate_entries += 1;
            }
        }

        let jobs = self
            .store
            .full_list(&c.job, &Filter::eq(JOB_WORK_ORDER_FIELD, work_order))
            .await?;
        for job in &jobs {
            let routes = self
                .store
                .full_list(&c.route, &Filter::eq(ROUTE_JOB_FIELD, &job.id))
                .await?;

            for route in &routes {
                let machines = self
                    .store
                    .full_list(&c.machine, &Filter::eq(MACHINE_ROUTE_FIELD, &route.id))
                    .await?;
                for machine in &machines {
                    if self.delete(RecordKind::Machine, &c.machine, &machine.id, report).await {
                        report.deleted_machines += 1;
                    }
                }

                if self.delete(RecordKind::Route, &c.route, &route.id, report).await {
                    report.deleted_routes += 1;
                }
            }

            if self.delete(RecordKind::Job, &c.job, &job.id, report).await {
                report.deleted_jobs += 1;
            }
        }

        Ok(())
    }

    async fn delete(
        &self,
        record: RecordKind,
        collection: &str,
        id: &str,
        report: &mut RevertReport,
    ) -> bool {
        match self.store.delete(collection, id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%record, id, error = %e, "Delete failed");
                report.errors.push(BatchError::Delete {
                    record,
                    record_id: id.to_string(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}
