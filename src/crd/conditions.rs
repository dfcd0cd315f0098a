//! # Status Conditions
//!
//! Shared condition machinery for all managed resource kinds.
//!
//! Every CRD in this operator tracks its lifecycle through a list of typed
//! conditions on the status subresource. At most one condition exists per
//! type; `lastTransitionTime` and `observedGeneration` only move when the
//! status, reason, or message actually change, so re-applying the same
//! condition is a no-op.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const CONDITION_TYPE_PROGRESSING: &str = "Progressing";
pub const CONDITION_TYPE_AVAILABLE: &str = "Available";
pub const CONDITION_TYPE_RECONCILE: &str = "Reconcile";

pub const CONDITION_REASON_PREPARING: &str = "Preparing";
pub const CONDITION_REASON_RUNNING: &str = "Running";

pub const CONDITION_TRUE: &str = "True";
pub const CONDITION_FALSE: &str = "False";

/// Condition represents a single observation of a resource's state
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (Progressing, Available, Reconcile)
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing the condition
    #[serde(default)]
    pub message: Option<String>,
    /// Spec generation this condition was last updated for
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// RFC3339 timestamp of the last status/reason/message change
    #[serde(default)]
    pub last_transition_time: Option<String>,
}

impl Condition {
    /// Build a condition without generation or transition time; both are
    /// filled in by [`StatusConditions::set_condition`].
    pub fn new(r#type: &str, status: &str, reason: &str, message: &str) -> Self {
        Self {
            r#type: r#type.to_string(),
            status: status.to_string(),
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            observed_generation: None,
            last_transition_time: None,
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Condition accessors and update semantics shared by all managed kinds.
///
/// Implementors provide the three accessors; the update logic lives in the
/// default methods so every kind behaves identically.
pub trait StatusConditions {
    fn conditions(&self) -> &[Condition];
    fn conditions_mut(&mut self) -> &mut Vec<Condition>;
    fn generation(&self) -> i64;

    fn find_condition(&self, r#type: &str) -> Option<&Condition> {
        self.conditions().iter().find(|c| c.r#type == r#type)
    }

    /// Insert or update the condition with the same type.
    ///
    /// `observedGeneration` and `lastTransitionTime` are touched only when
    /// the status, reason, or message differ from the stored condition.
    fn set_condition(&mut self, mut condition: Condition) {
        let generation = self.generation();
        let transition_time = now_rfc3339();
        let conditions = self.conditions_mut();
        if let Some(existing) = conditions
            .iter_mut()
            .find(|c| c.r#type == condition.r#type)
        {
            if existing.status != condition.status
                || existing.reason != condition.reason
                || existing.message != condition.message
            {
                existing.status = condition.status;
                existing.reason = condition.reason;
                existing.message = condition.message;
                existing.observed_generation = Some(generation);
                existing.last_transition_time = Some(transition_time);
            }
        } else {
            condition.observed_generation = Some(generation);
            condition.last_transition_time = Some(transition_time);
            conditions.push(condition);
        }
    }

    /// Reset conditions to the initial Preparing state for the current
    /// spec generation.
    fn init_conditions(&mut self, kind: &str) {
        let message = format!("{kind} is preparing");
        self.conditions_mut().clear();
        self.set_condition(Condition::new(
            CONDITION_TYPE_PROGRESSING,
            CONDITION_TRUE,
            CONDITION_REASON_PREPARING,
            &message,
        ));
        self.set_condition(Condition::new(
            CONDITION_TYPE_AVAILABLE,
            CONDITION_FALSE,
            CONDITION_REASON_PREPARING,
            &message,
        ));
    }

    /// True once the resource reached Available=True with reason Running.
    fn is_available(&self) -> bool {
        self.find_condition(CONDITION_TYPE_AVAILABLE)
            .is_some_and(|c| {
                c.status == CONDITION_TRUE
                    && c.reason.as_deref() == Some(CONDITION_REASON_RUNNING)
            })
    }

    /// True when the Progressing condition is missing or stale relative to
    /// the spec generation, meaning conditions must be re-initialized.
    fn needs_condition_reset(&self) -> bool {
        match self.find_condition(CONDITION_TYPE_PROGRESSING) {
            Some(c) => c.observed_generation != Some(self.generation()),
            None => true,
        }
    }

    /// Mark the resource available with reason Running.
    fn set_available(&mut self, message: &str) {
        self.set_condition(Condition::new(
            CONDITION_TYPE_AVAILABLE,
            CONDITION_TRUE,
            CONDITION_REASON_RUNNING,
            message,
        ));
    }
}

/// Wire a CRD type up to [`StatusConditions`] through its status struct.
macro_rules! impl_status_conditions {
    ($kind:ty, $status:ty) => {
        impl $crate::crd::conditions::StatusConditions for $kind {
            fn conditions(&self) -> &[$crate::crd::conditions::Condition] {
                self.status
                    .as_ref()
                    .map(|s| s.conditions.as_slice())
                    .unwrap_or(&[])
            }

            fn conditions_mut(
                &mut self,
            ) -> &mut Vec<$crate::crd::conditions::Condition> {
                &mut self.status.get_or_insert_with(<$status>::default).conditions
            }

            fn generation(&self) -> i64 {
                self.metadata.generation.unwrap_or(0)
            }
        }
    };
}

pub(crate) use impl_status_conditions;
