// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Observed-state feedback written to the application's status subresource.

use crate::domain::application::crd::{ApplicationCondition, SpringBootApplicationStatus};
use crate::domain::application::resolver::ResolvedSpec;
use crate::infrastructure::constants::CONDITION_READY;

const STATUS_TRUE: &str = "True";
const STATUS_FALSE: &str = "False";

/// A `Ready` condition without a transition time; `next_status` stamps it.
pub fn ready_condition(ready: bool, reason: &str, message: impl Into<String>) -> ApplicationCondition {
    ApplicationCondition {
        type_: CONDITION_READY.to_string(),
        status: if ready { STATUS_TRUE } else { STATUS_FALSE }.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.into()),
        last_transition_time: None,
    }
}

/// Status after a reconciliation pass.
///
/// `resolved` is the spec that was applied; when absent the image, replica
/// count and service name of the previous status are kept, so they always
/// describe the last successful rollout. The transition time only moves when
/// the condition's status flips.
pub fn next_status(
    previous: Option<&SpringBootApplicationStatus>,
    observed_generation: Option<i64>,
    resolved: Option<&ResolvedSpec>,
    mut condition: ApplicationCondition,
    now: &str,
) -> SpringBootApplicationStatus {
    let previous_condition = previous.and_then(|status| {
        status
            .conditions
            .iter()
            .find(|c| c.type_ == condition.type_)
    });
    condition.last_transition_time = match previous_condition {
        Some(c) if c.status == condition.status && c.last_transition_time.is_some() => {
            c.last_transition_time.clone()
        }
        _ => Some(now.to_string()),
    };

    let mut status = previous.cloned().unwrap_or_default();
    status.observed_generation = observed_generation;
    if let Some(resolved) = resolved {
        status.image = Some(resolved.image.clone());
        status.replicas = Some(resolved.replicas);
        status.service_name = Some(resolved.name.clone());
    }
    status.conditions.retain(|c| c.type_ != condition.type_);
    status.conditions.push(condition);
    status.last_reconcile_time = Some(now.to_string());
    status
}

/// Whether writing `next` would change anything besides timestamps.
pub fn status_changed(previous: Option<&SpringBootApplicationStatus>, next: &SpringBootApplicationStatus) -> bool {
    match previous {
        Some(previous) => without_timestamps(previous) != without_timestamps(next),
        None => true,
    }
}

fn without_timestamps(status: &SpringBootApplicationStatus) -> SpringBootApplicationStatus {
    let mut status = status.clone();
    status.last_reconcile_time = None;
    for condition in &mut status.conditions {
        condition.last_transition_time = None;
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::application::crd::SpringBoot;
    use crate::domain::application::resolver::resolve;
    use crate::domain::config::OperatorConfig;
    use crate::infrastructure::constants::{REASON_RECONCILED, REASON_SERVICE_FAILED};

    const T1: &str = "2025-01-01T00:00:00Z";
    const T2: &str = "2025-01-01T00:05:00Z";

    fn resolved() -> ResolvedSpec {
        let spec = SpringBoot {
            version: "1.2.0".to_string(),
            ..SpringBoot::default()
        };
        resolve(&spec, &OperatorConfig::default(), "orders").unwrap()
    }

    #[test]
    fn first_success_fills_everything() {
        let resolved = resolved();
        let status = next_status(
            None,
            Some(2),
            Some(&resolved),
            ready_condition(true, REASON_RECONCILED, "service created, deployment created"),
            T1,
        );

        assert_eq!(status.observed_generation, Some(2));
        assert_eq!(status.image.as_deref(), Some("/orders:1.2.0"));
        assert_eq!(status.replicas, Some(3));
        assert_eq!(status.service_name.as_deref(), Some("orders"));
        assert_eq!(status.conditions.len(), 1);
        assert_eq!(status.conditions[0].status, "True");
        assert_eq!(status.conditions[0].last_transition_time.as_deref(), Some(T1));
    }

    #[test]
    fn repeated_success_is_not_a_change() {
        let resolved = resolved();
        let first = next_status(
            None,
            Some(1),
            Some(&resolved),
            ready_condition(true, REASON_RECONCILED, "ok"),
            T1,
        );
        let second = next_status(
            Some(&first),
            Some(1),
            Some(&resolved),
            ready_condition(true, REASON_RECONCILED, "ok"),
            T2,
        );

        assert!(!status_changed(Some(&first), &second));
        assert_eq!(second.conditions[0].last_transition_time.as_deref(), Some(T1));
    }

    #[test]
    fn failure_keeps_last_rollout_and_moves_transition_time() {
        let resolved = resolved();
        let first = next_status(
            None,
            Some(1),
            Some(&resolved),
            ready_condition(true, REASON_RECONCILED, "ok"),
            T1,
        );
        let failed = next_status(
            Some(&first),
            Some(2),
            None,
            ready_condition(false, REASON_SERVICE_FAILED, "boom"),
            T2,
        );

        assert!(status_changed(Some(&first), &failed));
        assert_eq!(failed.image, first.image);
        assert_eq!(failed.conditions.len(), 1);
        assert_eq!(failed.conditions[0].status, "False");
        assert_eq!(failed.conditions[0].reason.as_deref(), Some("ServiceFailed"));
        assert_eq!(failed.conditions[0].last_transition_time.as_deref(), Some(T2));
    }
}
