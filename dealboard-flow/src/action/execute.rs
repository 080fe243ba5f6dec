//! Action execution
//!
//! Actions run in ascending order and every applicable action is attempted:
//! one action's failure is isolated to its own result and never aborts its
//! siblings. Collaborator errors (timeouts, refusals) become failed results,
//! not propagated errors - by the time actions run, the move has already
//! committed.

use crate::collab::{EmailMessage, EntityKind};
use crate::context::FlowContext;
use crate::error::Result;
use crate::transform::{build_payload, MappingContext};
use crate::types::{
    Action, ActionId, ActionKind, ActionResult, Column, FieldMapping, FieldValue, Task, Trigger,
    DEFAULT_SCORE_POINTS,
};
use chrono::{Duration, Utc};
use dealboard_operations::LogEntry;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Everything one action execution can see
pub struct ActionScope<'a> {
    pub task: &'a Task,
    /// Move origin, for gate checks; none for scheduler ticks
    pub origin: Option<&'a Column>,
    /// Move destination (for on_stay, the column the task resides in)
    pub destination: &'a Column,
    pub mapping: &'a MappingContext,
    /// Caller-supplied per-action form data, keyed by action id
    pub action_data: &'a HashMap<ActionId, Value>,
    pub actor: Option<&'a str>,
}

/// Execute a column's actions for one trigger, in order.
///
/// Selection matches the validation evaluator: active actions on the column
/// whose trigger matches and whose origin gate applies.
pub async fn execute_actions(
    ctx: &FlowContext,
    trigger: Trigger,
    column: &Column,
    scope: &ActionScope<'_>,
) -> Result<Vec<ActionResult>> {
    let actions = ctx.column_actions(&column.id, false).await?;

    let mut results = Vec::new();
    for action in actions.iter().filter(|a| a.trigger == trigger) {
        if !action.gate.applies(scope.origin, scope.destination) {
            continue;
        }
        results.push(execute_single(ctx, action, scope).await);
    }
    Ok(results)
}

/// Execute one action, returning its result and recording it in the
/// action's history log. Never returns an error: failures are data.
pub async fn execute_single(
    ctx: &FlowContext,
    action: &Action,
    scope: &ActionScope<'_>,
) -> ActionResult {
    let start = std::time::Instant::now();

    let result = match dispatch(ctx, action, scope).await {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(
                action = %action.id,
                task = %scope.task.id,
                error = %err,
                "action execution failed"
            );
            ActionResult::failure(action, err.to_string())
        }
    };

    let outcome = if result.already_executed {
        "already_executed"
    } else if result.success {
        "executed"
    } else {
        "failed"
    };
    let entry = LogEntry::new(
        "run action",
        serde_json::json!({
            "task_id": scope.task.id,
            "trigger": super::trigger_name(action.trigger),
        }),
        serde_json::json!({ "outcome": outcome, "result": result }),
        scope.actor.map(String::from),
        start.elapsed().as_millis() as u64,
    );
    if let Err(err) = ctx.append_history(action.id.as_str(), &entry).await {
        tracing::warn!(action = %action.id, error = %err, "failed to record action history");
    }

    result
}

async fn dispatch(
    ctx: &FlowContext,
    action: &Action,
    scope: &ActionScope<'_>,
) -> Result<ActionResult> {
    let task = scope.task;

    match &action.kind {
        ActionKind::CreateProperty { mappings } => {
            create_entity(ctx, action, scope, EntityKind::Property, mappings).await
        }
        ActionKind::CreateClient { mappings } => {
            create_entity(ctx, action, scope, EntityKind::Client, mappings).await
        }
        ActionKind::CreateDocument { mappings } => {
            create_entity(ctx, action, scope, EntityKind::Document, mappings).await
        }
        ActionKind::AssignUser { user_id } => {
            ctx.collab.tasks.assign_user(&task.id, user_id).await?;
            Ok(ActionResult::success(action, format!("assigned {}", user_id)))
        }
        ActionKind::SetPriority { priority } => {
            ctx.collab
                .tasks
                .set_field(&task.id, "priority", FieldValue::Text(priority.wire_name().into()))
                .await?;
            Ok(ActionResult::success(action, format!("priority set to {}", priority.wire_name())))
        }
        ActionKind::SetDueDate { days_from_now } => {
            let due = (Utc::now() + Duration::days(*days_from_now)).date_naive();
            ctx.collab
                .tasks
                .set_field(&task.id, "due_date", FieldValue::Date(due))
                .await?;
            Ok(ActionResult::success(action, format!("due date set to {}", due)))
        }
        ActionKind::AddTag { tag } => {
            ctx.collab.tasks.add_tag(&task.id, tag).await?;
            Ok(ActionResult::success(action, format!("tagged {}", tag)))
        }
        ActionKind::SendEmail { recipient, subject, body } => {
            let email = resolve_email(action, scope, recipient, subject, body);
            ctx.collab.messenger.send_email(&email).await?;
            Ok(ActionResult::success(action, format!("email sent to {}", email.recipient)))
        }
        ActionKind::SendNotification { recipient, message } => {
            let recipient = resolve_text(action, scope, "recipient", recipient);
            let message = resolve_text(action, scope, "message", message);
            ctx.collab.messenger.send_notification(&recipient, &message).await?;
            Ok(ActionResult::success(action, format!("notified {}", recipient)))
        }
        ActionKind::ScheduleEmail { recipient, subject, body, delay_hours } => {
            let email = resolve_email(action, scope, recipient, subject, body);
            ctx.collab.messenger.schedule_email(&email, *delay_hours).await?;
            Ok(ActionResult::success(
                action,
                format!("email to {} scheduled in {}h", email.recipient, delay_hours),
            ))
        }
        ActionKind::StartEmailSequence { recipient, sequence_id } => {
            let recipient = resolve_text(action, scope, "recipient", recipient);
            ctx.collab.messenger.start_sequence(&recipient, sequence_id).await?;
            Ok(ActionResult::success(
                action,
                format!("sequence {} started for {}", sequence_id, recipient),
            ))
        }
        ActionKind::UpdateScore { points } => {
            let Some(actor) = task.owner.as_deref().or(scope.actor) else {
                return Ok(ActionResult::failure(action, "no actor to score"));
            };
            let points = points.unwrap_or(DEFAULT_SCORE_POINTS);
            ctx.collab
                .scores
                .apply_delta(actor, points, "column automation")
                .await?;
            Ok(ActionResult::success(action, format!("{} points applied to {}", points, actor)))
        }
    }
}

/// Create an entity, bypassing idempotently when this action already
/// produced one for this task
async fn create_entity(
    ctx: &FlowContext,
    action: &Action,
    scope: &ActionScope<'_>,
    kind: EntityKind,
    mappings: &[FieldMapping],
) -> Result<ActionResult> {
    let mut marker = ctx.read_marker(&action.id, &scope.task.id).await?;
    if let Some(entity_id) = marker.entity_id.clone() {
        return Ok(ActionResult::success(action, format!("{} already created", kind))
            .with_entity(entity_id)
            .bypassed());
    }

    let payload = build_payload(mappings, scope.task, scope.mapping)?;
    let entity_id = ctx.collab.entities.create_entity(kind, &payload).await?;

    marker.entity_id = Some(entity_id.clone());
    marker.record_execution(Utc::now());
    ctx.write_marker(&marker).await?;

    Ok(ActionResult::success(action, format!("{} created", kind)).with_entity(entity_id))
}

/// Caller override from action data, then template resolution
fn resolve_text(action: &Action, scope: &ActionScope<'_>, key: &str, configured: &str) -> String {
    let text = scope
        .action_data
        .get(&action.id)
        .and_then(|data| data.get(key))
        .and_then(Value::as_str)
        .unwrap_or(configured);
    render_template(text, scope.task, scope.mapping)
}

fn resolve_email(
    action: &Action,
    scope: &ActionScope<'_>,
    recipient: &str,
    subject: &str,
    body: &str,
) -> EmailMessage {
    EmailMessage {
        recipient: resolve_text(action, scope, "recipient", recipient),
        subject: resolve_text(action, scope, "subject", subject),
        body: resolve_text(action, scope, "body", body),
    }
}

/// Replace `{{scope.field}}` placeholders from the task and mapping context.
///
/// `task.*` and bare names read task fields; `user.*`/`project.*` read the
/// mapping context; `client.*`/`property.*` read the conventional
/// `client_*`/`property_*` task fields. Unknown placeholders are left
/// verbatim so broken templates stay visible.
fn render_template(template: &str, task: &Task, ctx: &MappingContext) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("valid regex"));

    re.replace_all(template, |caps: &regex::Captures<'_>| {
        lookup_placeholder(&caps[1], task, ctx).unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

fn lookup_placeholder(path: &str, task: &Task, ctx: &MappingContext) -> Option<String> {
    let (prefix, field) = match path.split_once('.') {
        Some((prefix, field)) => (prefix, field),
        None => ("task", path),
    };

    match prefix {
        "task" => task.field(field).map(|v| v.to_text()),
        "user" => ctx.user_fields.get(field).map(FieldValue::to_text),
        "project" => ctx.project_fields.get(field).map(FieldValue::to_text),
        "client" | "property" => task
            .field(&format!("{}_{}", prefix, field))
            .map(|v| v.to_text()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AddAction;
    use crate::context::MemoryCollaborators;
    use crate::types::StayPolicy;
    use dealboard_operations::Execute as _;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, FlowContext, MemoryCollaborators) {
        let temp = TempDir::new().unwrap();
        let (ctx, memory) = FlowContext::with_memory(temp.path().join(".dealboard"));
        (temp, ctx, memory)
    }

    fn scope<'a>(
        task: &'a Task,
        origin: Option<&'a Column>,
        destination: &'a Column,
        mapping: &'a MappingContext,
        action_data: &'a HashMap<ActionId, Value>,
    ) -> ActionScope<'a> {
        ActionScope {
            task,
            origin,
            destination,
            mapping,
            action_data,
            actor: Some("corretor1"),
        }
    }

    #[tokio::test]
    async fn test_create_entity_is_idempotent() {
        let (_temp, ctx, memory) = setup().await;
        let destination = Column::new("fechamento", "Fechamento", 3);

        AddAction::new(
            "fechamento",
            ActionKind::CreateClient {
                mappings: vec![FieldMapping::from_task_field("client_name", "name").required()],
            },
        )
        .execute(&ctx)
        .await
        .unwrap();

        let task = Task::new("t1", "Casa", "proposta").with_field("client_name", "Ana");
        memory.tasks.insert_task(task.clone());
        let mapping = MappingContext::default();
        let data = HashMap::new();
        let s = scope(&task, None, &destination, &mapping, &data);

        let first = execute_actions(&ctx, Trigger::OnEnter, &destination, &s)
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert!(first[0].success);
        assert!(!first[0].already_executed);
        let entity_id = first[0].created_entity_id.clone().unwrap();

        // Re-running the same action for the same task bypasses creation
        let second = execute_actions(&ctx, Trigger::OnEnter, &destination, &s)
            .await
            .unwrap();
        assert!(second[0].already_executed);
        assert_eq!(second[0].created_entity_id.as_ref(), Some(&entity_id));

        // Exactly one entity was created
        assert_eq!(memory.entities.created().len(), 1);
        assert_eq!(memory.entities.created()[0].2["name"], "Ana");
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_one_action() {
        let (_temp, ctx, memory) = setup().await;
        let destination = Column::new("fechamento", "Fechamento", 3);

        AddAction::new(
            "fechamento",
            ActionKind::SendEmail {
                recipient: "{{client.email}}".into(),
                subject: "Parabéns".into(),
                body: "Negócio fechado".into(),
            },
        )
        .execute(&ctx)
        .await
        .unwrap();
        AddAction::new("fechamento", ActionKind::AddTag { tag: "ganho".into() })
            .execute(&ctx)
            .await
            .unwrap();

        let task = Task::new("t1", "Casa", "proposta")
            .with_field("client_email", "ana@mail.com");
        memory.tasks.insert_task(task.clone());
        memory.messenger.fail_next();

        let mapping = MappingContext::default();
        let data = HashMap::new();
        let s = scope(&task, None, &destination, &mapping, &data);

        let results = execute_actions(&ctx, Trigger::OnEnter, &destination, &s)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap().contains("messenger"));
        // The sibling still ran
        assert!(results[1].success);
        let stored = memory.tasks.get_task(&task.id).unwrap();
        assert_eq!(
            stored.fields.get("tags"),
            Some(&FieldValue::List(vec!["ganho".into()]))
        );
    }

    #[tokio::test]
    async fn test_template_and_action_data_override() {
        let (_temp, ctx, memory) = setup().await;
        let destination = Column::new("proposta", "Proposta", 2);

        let added = AddAction::new(
            "proposta",
            ActionKind::SendEmail {
                recipient: "{{client.email}}".into(),
                subject: "Sobre {{task.title}}".into(),
                body: "Olá {{client.name}}".into(),
            },
        )
        .execute(&ctx)
        .await
        .unwrap();
        let action_id = ActionId::from_string(added["id"].as_str().unwrap());

        let task = Task::new("t1", "Casa na praia", "visita")
            .with_field("client_email", "ana@mail.com")
            .with_field("client_name", "Ana");
        memory.tasks.insert_task(task.clone());

        let mapping = MappingContext::default();
        let mut data = HashMap::new();
        data.insert(
            action_id,
            serde_json::json!({ "subject": "Proposta: {{task.title}}" }),
        );
        let s = scope(&task, None, &destination, &mapping, &data);

        let results = execute_actions(&ctx, Trigger::OnEnter, &destination, &s)
            .await
            .unwrap();
        assert!(results[0].success);

        let deliveries = memory.messenger.deliveries();
        match &deliveries[0] {
            crate::collab::memory::Delivery::Email(email) => {
                assert_eq!(email.recipient, "ana@mail.com");
                assert_eq!(email.subject, "Proposta: Casa na praia");
                assert_eq!(email.body, "Olá Ana");
            }
            other => panic!("unexpected delivery: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_task_mutation_actions() {
        let (_temp, ctx, memory) = setup().await;
        let destination = Column::new("visita", "Visita", 1);

        AddAction::new(
            "visita",
            ActionKind::AssignUser { user_id: "corretor2".into() },
        )
        .execute(&ctx)
        .await
        .unwrap();
        AddAction::new(
            "visita",
            ActionKind::SetPriority { priority: crate::types::Priority::High },
        )
        .execute(&ctx)
        .await
        .unwrap();
        AddAction::new("visita", ActionKind::SetDueDate { days_from_now: 7 })
            .execute(&ctx)
            .await
            .unwrap();

        let task = Task::new("t1", "Casa", "lead");
        memory.tasks.insert_task(task.clone());

        let mapping = MappingContext::default();
        let data = HashMap::new();
        let s = scope(&task, None, &destination, &mapping, &data);

        let results = execute_actions(&ctx, Trigger::OnEnter, &destination, &s)
            .await
            .unwrap();
        assert!(results.iter().all(|r| r.success));

        let stored = memory.tasks.get_task(&task.id).unwrap();
        assert_eq!(
            stored.fields.get("assigned_to"),
            Some(&FieldValue::Text("corretor2".into()))
        );
        assert_eq!(
            stored.fields.get("priority"),
            Some(&FieldValue::Text("high".into()))
        );
        assert!(matches!(stored.fields.get("due_date"), Some(FieldValue::Date(_))));
    }

    #[tokio::test]
    async fn test_update_score_uses_owner_then_actor() {
        let (_temp, ctx, memory) = setup().await;
        let destination = Column::new("fechamento", "Fechamento", 3);

        AddAction::new("fechamento", ActionKind::UpdateScore { points: Some(25) })
            .execute(&ctx)
            .await
            .unwrap();

        let owned = Task::new("t1", "Casa", "proposta").with_owner("corretor9");
        let mapping = MappingContext::default();
        let data = HashMap::new();
        let s = scope(&owned, None, &destination, &mapping, &data);

        let results = execute_actions(&ctx, Trigger::OnEnter, &destination, &s)
            .await
            .unwrap();
        assert!(results[0].success);
        assert_eq!(memory.scores.total("corretor9"), 25);

        // Without an owner, the acting user is scored
        let unowned = Task::new("t2", "Apto", "proposta");
        let s = scope(&unowned, None, &destination, &mapping, &data);
        execute_actions(&ctx, Trigger::OnEnter, &destination, &s)
            .await
            .unwrap();
        assert_eq!(memory.scores.total("corretor1"), 25);
    }

    #[tokio::test]
    async fn test_missing_required_mapping_fails_action_only() {
        let (_temp, ctx, memory) = setup().await;
        let destination = Column::new("fechamento", "Fechamento", 3);

        AddAction::new(
            "fechamento",
            ActionKind::CreateClient {
                mappings: vec![FieldMapping::from_task_field("client_name", "name").required()],
            },
        )
        .execute(&ctx)
        .await
        .unwrap();

        let task = Task::new("t1", "Casa", "proposta");
        let mapping = MappingContext::default();
        let data = HashMap::new();
        let s = scope(&task, None, &destination, &mapping, &data);

        let results = execute_actions(&ctx, Trigger::OnEnter, &destination, &s)
            .await
            .unwrap();
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap().contains("name"));
        assert!(memory.entities.created().is_empty());
    }

    #[tokio::test]
    async fn test_run_history_recorded() {
        let (_temp, ctx, _memory) = setup().await;
        let destination = Column::new("visita", "Visita", 1);

        let added = AddAction::new("visita", ActionKind::AddTag { tag: "visitado".into() })
            .execute(&ctx)
            .await
            .unwrap();
        let action_id = added["id"].as_str().unwrap().to_string();

        let task = Task::new("t1", "Casa", "lead");
        let mapping = MappingContext::default();
        let data = HashMap::new();
        let s = scope(&task, None, &destination, &mapping, &data);

        // The memory store has no such task, so add_tag fails; the failure
        // must still be recorded as a run
        let results = execute_actions(&ctx, Trigger::OnEnter, &destination, &s)
            .await
            .unwrap();
        assert!(!results[0].success);

        let history = ctx.read_history(&action_id).await.unwrap();
        assert_eq!(history[0].op, "run action");
        assert_eq!(history[0].output["outcome"], "failed");
        assert!(ctx.history_has_runs(&action_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_stay_actions_not_selected_for_enter() {
        let (_temp, ctx, _memory) = setup().await;
        let destination = Column::new("proposta", "Proposta", 2);

        AddAction::new(
            "proposta",
            ActionKind::SendNotification {
                recipient: "corretor".into(),
                message: "Parada".into(),
            },
        )
        .with_trigger(Trigger::OnStay)
        .with_stay(StayPolicy { interval_hours: 24, max_executions: 0 })
        .execute(&ctx)
        .await
        .unwrap();

        let task = Task::new("t1", "Casa", "visita");
        let mapping = MappingContext::default();
        let data = HashMap::new();
        let s = scope(&task, None, &destination, &mapping, &data);

        let results = execute_actions(&ctx, Trigger::OnEnter, &destination, &s)
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
