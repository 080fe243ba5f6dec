//! Operation metadata and execution traits

use async_trait::async_trait;
use serde_json::Value;

/// Metadata describing an operation: what verb it applies to which noun.
///
/// Implement via the [`operation!`](crate::operation) macro rather than by hand
/// so every command carries the same canonical metadata shape.
pub trait Operation {
    /// The verb (e.g. "add", "move", "reorder")
    fn verb(&self) -> &'static str;

    /// The noun the verb acts on (e.g. "validation", "task")
    fn noun(&self) -> &'static str;

    /// One-line human description
    fn description(&self) -> &'static str;

    /// Canonical op string used in audit logs (e.g. "add validation")
    fn op_string(&self) -> String {
        format!("{} {}", self.verb(), self.noun())
    }
}

/// Execute an operation against a context, producing a JSON payload.
///
/// The context provides I/O primitives only; commands hold all the logic.
#[async_trait]
pub trait Execute<C, E>: Operation {
    async fn execute(&self, ctx: &C) -> Result<Value, E>;
}

/// Implement [`Operation`] for a command struct.
///
/// ```ignore
/// operation!(MoveTask, verb = "move", noun = "task",
///     description = "Move a task to a different column");
/// ```
#[macro_export]
macro_rules! operation {
    ($ty:ty, verb = $verb:literal, noun = $noun:literal, description = $desc:literal) => {
        impl $crate::Operation for $ty {
            fn verb(&self) -> &'static str {
                $verb
            }
            fn noun(&self) -> &'static str {
                $noun
            }
            fn description(&self) -> &'static str {
                $desc
            }
        }
    };
}
