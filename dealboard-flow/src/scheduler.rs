//! Periodic execution of on_stay actions
//!
//! The scheduler runs on its own clock, independent of client-initiated
//! moves. Each `(action, task)` pair is serialized by its own async lock:
//! the due-check, execution, and counter update happen under the lock, so
//! concurrent ticks cannot double-count. Execution is at-least-once - a
//! failed run is retried on the next cycle and the counters only advance
//! on success.

use crate::action::{execute_single, ActionScope};
use crate::context::FlowContext;
use crate::error::Result;
use crate::transform::MappingContext;
use crate::types::{ActionId, TaskId, Trigger};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Pairs whose due-state was checked
    pub pairs_checked: usize,
    /// Actions actually executed
    pub executed: usize,
}

/// Background scheduler for on_stay actions
pub struct StayScheduler {
    ctx: Arc<FlowContext>,
    tick_interval: Duration,
    /// Per (action, task) serialization locks
    locks: DashMap<(ActionId, TaskId), Arc<Mutex<()>>>,
}

impl StayScheduler {
    /// Create a scheduler with the default five-minute tick
    pub fn new(ctx: Arc<FlowContext>) -> Self {
        Self {
            ctx,
            tick_interval: Duration::from_secs(300),
            locks: DashMap::new(),
        }
    }

    /// Override the tick interval
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Loop forever, ticking on the configured interval.
    ///
    /// A failing tick is logged and retried on the next cycle. Spawn this
    /// on the runtime and abort the handle to stop the scheduler.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.tick_interval);
        loop {
            interval.tick().await;
            match self.tick(Utc::now()).await {
                Ok(summary) => {
                    tracing::debug!(
                        checked = summary.pairs_checked,
                        executed = summary.executed,
                        "scheduler tick"
                    );
                }
                Err(err) => {
                    tracing::warn!(error = %err, "scheduler tick failed");
                }
            }
        }
    }

    /// Run one tick at the given instant.
    ///
    /// Visits every task resident in a column with active on_stay actions
    /// and executes each action that is due under its stay policy.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickSummary> {
        let actions: Vec<_> = self
            .ctx
            .read_all_actions()
            .await?
            .into_iter()
            .filter(|a| a.is_active && a.trigger == Trigger::OnStay)
            .collect();

        let mut summary = TickSummary::default();
        let empty_data = HashMap::new();
        let mapping = MappingContext::default();

        for action in &actions {
            let Some(policy) = action.stay else {
                // Enforced at store time; skip rather than guess an interval
                continue;
            };

            let column = self.ctx.collab.tasks.column(&action.column_id).await?;
            let task_ids = self.ctx.collab.tasks.tasks_in_column(&column.id).await?;

            for task_id in task_ids {
                let key = (action.id.clone(), task_id.clone());
                let lock = self
                    .locks
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone();
                let _guard = lock.lock().await;

                summary.pairs_checked += 1;
                let mut marker = self.ctx.read_marker(&action.id, &task_id).await?;
                if !marker.is_due(&policy, now) {
                    continue;
                }

                let task = self.ctx.collab.tasks.task(&task_id).await?;
                if task.column != action.column_id {
                    // The task left the column between listing and execution
                    drop(_guard);
                    self.locks.remove(&key);
                    continue;
                }

                let scope = ActionScope {
                    task: &task,
                    origin: None,
                    destination: &column,
                    mapping: &mapping,
                    action_data: &empty_data,
                    actor: Some("scheduler"),
                };
                let result = execute_single(&self.ctx, action, &scope).await;

                // Counters advance only on success; failures retry next tick
                if result.success {
                    marker.record_execution(now);
                    self.ctx.write_marker(&marker).await?;
                    summary.executed += 1;
                }
            }
        }

        Ok(summary)
    }
}
