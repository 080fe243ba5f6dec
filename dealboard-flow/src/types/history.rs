//! Per (action, task) execution bookkeeping

use super::action::StayPolicy;
use super::ids::{ActionId, EntityId, TaskId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of what an action has already done for one task.
///
/// Carries the idempotency handle for entity creation (the entity id) and
/// the periodic counters for `on_stay` execution. One marker file exists
/// per `(action, task)` pair; updates replace the whole file atomically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionMarker {
    pub action_id: ActionId,
    pub task_id: TaskId,
    /// Entity produced by a creation action; re-runs return this instead of
    /// creating a duplicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<EntityId>,
    #[serde(default)]
    pub execution_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execution_at: Option<DateTime<Utc>>,
}

impl ExecutionMarker {
    /// A marker for a pair that has never executed
    pub fn new(action_id: ActionId, task_id: TaskId) -> Self {
        Self {
            action_id,
            task_id,
            entity_id: None,
            execution_count: 0,
            last_execution_at: None,
        }
    }

    /// Record one execution at `now`
    pub fn record_execution(&mut self, now: DateTime<Utc>) {
        self.execution_count += 1;
        self.last_execution_at = Some(now);
    }

    /// Whether a periodic action is due for this pair at `now`.
    ///
    /// Never-executed pairs are due immediately. A zero `max_executions`
    /// means unlimited.
    pub fn is_due(&self, policy: &StayPolicy, now: DateTime<Utc>) -> bool {
        if policy.max_executions > 0 && self.execution_count >= policy.max_executions {
            return false;
        }
        match self.last_execution_at {
            None => true,
            Some(last) => now - last >= Duration::hours(i64::from(policy.interval_hours)),
        }
    }
}
