//! Reconciliation of a result batch with TestRail's plan/run/case hierarchy.
//!
//! Before any result is submitted the engine makes sure that:
//! - results for case ids outside the suite are dropped and reported back,
//! - the plan exists (found by id, by name, or created),
//! - every run name has an open run in the plan (found or created),
//! - every case with a pending result is a member of its run.
//!
//! A failure in any step aborts the batch. Plans, entries and membership
//! changes already made stay in place and are picked up again by a retry.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, error, info, trace, warn};

use crate::error::{TestRailError, TestRailResult};
use crate::gateway::TestRailClient;
use crate::models::{Plan, PlanEntryUpdate, ResultTable};

/// Where a batch is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    pub project_id: i64,
    pub suite_id: i64,
    pub plan_name: String,
    /// Known plan id; skips the lookup by name
    pub plan_id: Option<i64>,
    /// New runs include every case of the suite
    pub include_all: bool,
}

/// Remove " UTC" and turn underscores into " - " in a plan name.
pub fn clean_plan_name(name: &str) -> String {
    name.replace(" UTC", "").replace('_', " - ")
}

/// Run of the plan that results for one run name are submitted to.
struct ResolvedRun {
    run_id: i64,
    entry_id: String,
}

/// Plan as last fetched, tagged with the entry-creation count it reflects.
struct PlanSnapshot {
    plan: Plan,
    generation: u64,
}

/// Reconciliation engine.
pub struct ResultLogger {
    client: TestRailClient,
    /// One lock per (plan id, run name), held from find-or-create through the membership update
    run_locks: Mutex<HashMap<(i64, String), Arc<Mutex<()>>>>,
    /// Plan entries created through this logger
    entries_created: AtomicU64,
}

impl ResultLogger {
    pub fn new(client: TestRailClient) -> Self {
        Self {
            client,
            run_locks: Mutex::new(HashMap::new()),
            entries_created: AtomicU64::new(0),
        }
    }

    /// Reconcile and submit a batch; returns the case ids dropped as invalid.
    ///
    /// Invalid case ids are removed from `results` in place.
    pub async fn execute(
        &self,
        results: &mut ResultTable,
        request: &ReconcileRequest,
    ) -> TestRailResult<BTreeSet<i64>> {
        let valid = self
            .client
            .get_case_ids(request.project_id, request.suite_id)
            .await?;
        let invalid: BTreeSet<i64> = results.case_ids().difference(&valid).copied().collect();
        if !invalid.is_empty() {
            warn!(
                "Dropping results for {} case ids not in suite {}: {:?}",
                invalid.len(),
                request.suite_id,
                invalid
            );
            results.remove_cases(&invalid);
        }

        let generation = self.entries_created.load(Ordering::Acquire);
        let plan = self
            .verify_or_create_plan(request.project_id, request.plan_id, &request.plan_name)
            .await?;
        let plan_id = plan.id;
        let mut snapshot = PlanSnapshot { plan, generation };

        let run_names: Vec<String> = results.run_names().map(str::to_string).collect();
        let mut resolved = Vec::with_capacity(run_names.len());
        for run_name in run_names {
            let pending: BTreeSet<i64> = match results.row(&run_name) {
                Some(row) if !row.is_empty() => row.keys().copied().collect(),
                _ => {
                    debug!("No valid results left for run '{}', skipping", run_name);
                    continue;
                }
            };

            let run_lock = self.run_lock(plan_id, &run_name).await;
            let _guard = run_lock.lock().await;

            let run = self
                .resolve_run(&mut snapshot, &run_name, &pending, request)
                .await
                .map_err(|e| {
                    error!("Failed to resolve run '{}' in plan {}: {}", run_name, plan_id, e);
                    e.with_context(format!("run '{}' of plan {}", run_name, plan_id))
                })?;
            self.reconcile_membership(plan_id, &run, &pending)
                .await
                .map_err(|e| e.with_context(format!("run {} of plan {}", run.run_id, plan_id)))?;
            resolved.push((run_name, run.run_id));
        }

        for (run_name, run_id) in &resolved {
            let Some(row) = results.row(run_name) else {
                continue;
            };
            self.client
                .add_results(*run_id, row)
                .await
                .map_err(|e| e.with_context(format!("results for run {}", run_id)))?;
            info!(
                "Submitted {} results to run {} ('{}') of plan {}",
                row.len(),
                run_id,
                run_name,
                plan_id
            );
        }

        Ok(invalid)
    }

    /// Fetch the plan by id, or find an open plan by (cleaned) name, or create it.
    pub async fn verify_or_create_plan(
        &self,
        project_id: i64,
        plan_id: Option<i64>,
        plan_name: &str,
    ) -> TestRailResult<Plan> {
        if let Some(plan_id) = plan_id {
            return self.client.get_test_plan(plan_id).await;
        }

        let name = clean_plan_name(plan_name);
        if let Some(plan) = self.client.find_existing_test_plan(project_id, &name).await? {
            debug!("Using existing test plan {} '{}'", plan.id, plan.name);
            return Ok(plan);
        }

        let plan = self.client.create_test_plan(project_id, &name).await?;
        info!(
            "Created test plan {} '{}' in project {}",
            plan.id, plan.name, project_id
        );
        Ok(plan)
    }

    async fn run_lock(&self, plan_id: i64, run_name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.run_locks.lock().await;
        locks
            .entry((plan_id, run_name.to_string()))
            .or_default()
            .clone()
    }

    async fn refresh(&self, snapshot: &mut PlanSnapshot) -> TestRailResult<()> {
        let generation = self.entries_created.load(Ordering::Acquire);
        snapshot.plan = self.client.get_test_plan(snapshot.plan.id).await?;
        snapshot.generation = generation;
        Ok(())
    }

    /// Find the open run with this name in the plan, creating an entry when none exists.
    ///
    /// Callers hold the lock for this run name.
    async fn resolve_run(
        &self,
        snapshot: &mut PlanSnapshot,
        run_name: &str,
        pending: &BTreeSet<i64>,
        request: &ReconcileRequest,
    ) -> TestRailResult<ResolvedRun> {
        if snapshot.plan.entries.is_none() {
            trace!("Plan {} has no entries loaded, fetching", snapshot.plan.id);
            self.refresh(snapshot).await?;
        }

        if let Some(run) = find_run(&snapshot.plan, run_name) {
            return Ok(run);
        }

        // Another batch on this logger created an entry after the snapshot was taken.
        if self.entries_created.load(Ordering::Acquire) != snapshot.generation {
            trace!("Plan {} changed since last fetch, refreshing", snapshot.plan.id);
            self.refresh(snapshot).await?;
            if let Some(run) = find_run(&snapshot.plan, run_name) {
                return Ok(run);
            }
        }

        let plan_id = snapshot.plan.id;
        let entry = self
            .client
            .create_new_plan_entry(
                run_name,
                request.suite_id,
                plan_id,
                request.include_all,
                pending,
            )
            .await?;
        if self.entries_created.fetch_add(1, Ordering::AcqRel) == snapshot.generation {
            snapshot.generation += 1;
        }

        let run = entry.runs.first().ok_or_else(|| {
            TestRailError::UnknownError(format!(
                "Plan entry {} created for run '{}' contains no runs",
                entry.id, run_name
            ))
        })?;
        let resolved = ResolvedRun {
            run_id: run.id,
            entry_id: run.entry_id.clone().unwrap_or_else(|| entry.id.clone()),
        };
        info!(
            "Created run {} '{}' in plan {} with {} cases",
            resolved.run_id,
            run_name,
            plan_id,
            pending.len()
        );

        snapshot.plan.entries.get_or_insert_with(Vec::new).push(entry);
        Ok(resolved)
    }

    /// Add pending cases missing from the run to its entry, keeping existing ones.
    ///
    /// Callers hold the lock for this run name; the update replaces the entry's case list.
    async fn reconcile_membership(
        &self,
        plan_id: i64,
        run: &ResolvedRun,
        pending: &BTreeSet<i64>,
    ) -> TestRailResult<()> {
        let existing: BTreeSet<i64> = self
            .client
            .get_test_results_for_run(run.run_id, None)
            .await?
            .into_iter()
            .map(|t| t.case_id)
            .collect();

        let missing: BTreeSet<i64> = pending.difference(&existing).copied().collect();
        if missing.is_empty() {
            trace!("Run {} already contains all {} cases", run.run_id, pending.len());
            return Ok(());
        }

        debug!(
            "Adding {} cases to run {} (entry {}): {:?}",
            missing.len(),
            run.run_id,
            run.entry_id,
            missing
        );
        let case_ids: BTreeSet<i64> = existing.union(pending).copied().collect();
        self.client
            .update_existing_plan_entry(plan_id, &run.entry_id, &PlanEntryUpdate::case_ids(case_ids))
            .await?;
        Ok(())
    }
}

fn find_run(plan: &Plan, run_name: &str) -> Option<ResolvedRun> {
    plan.find_open_run(run_name).map(|(entry, run)| ResolvedRun {
        run_id: run.id,
        entry_id: run.entry_id.clone().unwrap_or_else(|| entry.id.clone()),
    })
}
