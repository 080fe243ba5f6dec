//! Action commands and execution

mod add;
mod delete;
mod execute;
mod get;
mod list;
mod reorder;
mod update;

pub use add::AddAction;
pub use delete::DeleteAction;
pub use execute::{execute_actions, execute_single, ActionScope};
pub use get::GetAction;
pub use list::ListActions;
pub use reorder::ReorderActions;
pub use update::UpdateAction;

use crate::error::{FlowError, Result};
use crate::types::{ActionKind, StayPolicy, Trigger};
use std::collections::HashSet;

/// Check an action configuration.
///
/// The trigger must be in the kind's allowed set, a stay policy must be
/// present exactly when the trigger is `on_stay`, and entity-creation
/// mappings must be non-empty with unique target fields. Rejected
/// configurations persist nothing.
pub(crate) fn checked_kind(
    kind: &ActionKind,
    trigger: Trigger,
    stay: Option<&StayPolicy>,
) -> Result<()> {
    if !kind.allowed_triggers().contains(&trigger) {
        return Err(FlowError::InvalidTrigger {
            action_type: kind.kind().into(),
            trigger: trigger_name(trigger).into(),
        });
    }

    match (trigger, stay) {
        (Trigger::OnStay, None) => {
            return Err(FlowError::invalid_value(
                "stay",
                "on_stay actions need an execution interval",
            ));
        }
        (Trigger::OnStay, Some(policy)) if policy.interval_hours == 0 => {
            return Err(FlowError::invalid_value(
                "stay.interval_hours",
                "interval must be at least one hour",
            ));
        }
        (Trigger::OnEnter | Trigger::OnExit, Some(_)) => {
            return Err(FlowError::invalid_value(
                "stay",
                "stay policy only applies to on_stay actions",
            ));
        }
        _ => {}
    }

    if let Some(mappings) = kind.mappings() {
        if mappings.is_empty() {
            return Err(FlowError::invalid_value(
                "mappings",
                "entity creation needs at least one field mapping",
            ));
        }
        let mut targets = HashSet::new();
        for mapping in mappings {
            if mapping.target_field.trim().is_empty() {
                return Err(FlowError::invalid_value("target_field", "must not be empty"));
            }
            if !targets.insert(mapping.target_field.as_str()) {
                return Err(FlowError::invalid_value(
                    "target_field",
                    format!("duplicate mapping target '{}'", mapping.target_field),
                ));
            }
        }
    }

    Ok(())
}

pub(crate) fn trigger_name(trigger: Trigger) -> &'static str {
    match trigger {
        Trigger::OnEnter => "on_enter",
        Trigger::OnExit => "on_exit",
        Trigger::OnStay => "on_stay",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldMapping;

    #[test]
    fn test_trigger_outside_allowed_set_rejected() {
        let kind = ActionKind::CreateClient {
            mappings: vec![FieldMapping::from_task_field("title", "name")],
        };
        let err = checked_kind(&kind, Trigger::OnExit, None);
        assert!(matches!(err, Err(FlowError::InvalidTrigger { .. })));

        assert!(checked_kind(&kind, Trigger::OnEnter, None).is_ok());
    }

    #[test]
    fn test_on_stay_requires_policy() {
        let kind = ActionKind::SendNotification {
            recipient: "corretor".into(),
            message: "Proposta parada há um dia".into(),
        };

        let err = checked_kind(&kind, Trigger::OnStay, None);
        assert!(matches!(err, Err(FlowError::InvalidValue { .. })));

        let policy = StayPolicy { interval_hours: 24, max_executions: 3 };
        assert!(checked_kind(&kind, Trigger::OnStay, Some(&policy)).is_ok());

        let zero = StayPolicy { interval_hours: 0, max_executions: 0 };
        let err = checked_kind(&kind, Trigger::OnStay, Some(&zero));
        assert!(matches!(err, Err(FlowError::InvalidValue { .. })));
    }

    #[test]
    fn test_stay_policy_rejected_elsewhere() {
        let kind = ActionKind::AddTag { tag: "quente".into() };
        let policy = StayPolicy { interval_hours: 24, max_executions: 0 };
        let err = checked_kind(&kind, Trigger::OnEnter, Some(&policy));
        assert!(matches!(err, Err(FlowError::InvalidValue { .. })));
    }

    #[test]
    fn test_duplicate_mapping_targets_rejected() {
        let kind = ActionKind::CreateProperty {
            mappings: vec![
                FieldMapping::from_task_field("title", "name"),
                FieldMapping::from_task_field("address", "name"),
            ],
        };
        let err = checked_kind(&kind, Trigger::OnEnter, None);
        assert!(matches!(err, Err(FlowError::InvalidValue { .. })));
    }

    #[test]
    fn test_empty_mappings_rejected() {
        let kind = ActionKind::CreateDocument { mappings: vec![] };
        let err = checked_kind(&kind, Trigger::OnEnter, None);
        assert!(matches!(err, Err(FlowError::InvalidValue { .. })));
    }
}
