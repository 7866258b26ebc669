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

//! Idempotent create-or-update of the application's children.
//!
//! Each write is computed as "existing object with the owned fields replaced"
//! so fields the API server or other controllers own survive, and immutable
//! fields such as selectors are never sent with a new value.

use crate::infrastructure::constants::{
    CONFLICT_RETRY_MAX_DELAY_MS, CONFLICT_RETRY_MAX_TIMES, CONFLICT_RETRY_MIN_DELAY_MS,
};
use crate::infrastructure::kubernetes::client::SpringBootKubeClient;
use crate::infrastructure::kubernetes::owner::set_controller_reference;
use crate::shared::error::{OperatorError, Result};
use backon::{ExponentialBuilder, Retryable};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentStrategy};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Unchanged,
    Created,
    Updated,
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationResult::Unchanged => write!(f, "unchanged"),
            OperationResult::Created => write!(f, "created"),
            OperationResult::Updated => write!(f, "updated"),
        }
    }
}

/// A child kind the operator owns, with its store operations and merge rule.
#[async_trait::async_trait]
pub trait ChildResource: Resource<DynamicType = ()> + Clone + PartialEq + Send + Sync {
    /// Copies the fields the operator owns from `desired` onto `existing`.
    fn merge(existing: &Self, desired: &Self) -> Result<Self>;

    async fn fetch(
        client: &dyn SpringBootKubeClient,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Self>>;

    async fn create(client: &dyn SpringBootKubeClient, object: &Self) -> Result<Self>;

    async fn replace(client: &dyn SpringBootKubeClient, object: &Self) -> Result<Self>;
}

#[async_trait::async_trait]
impl ChildResource for Service {
    fn merge(existing: &Self, desired: &Self) -> Result<Self> {
        merge_service(existing, desired)
    }

    async fn fetch(
        client: &dyn SpringBootKubeClient,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Self>> {
        client.get_service(namespace, name).await
    }

    async fn create(client: &dyn SpringBootKubeClient, object: &Self) -> Result<Self> {
        client.create_service(object).await
    }

    async fn replace(client: &dyn SpringBootKubeClient, object: &Self) -> Result<Self> {
        client.replace_service(object).await
    }
}

#[async_trait::async_trait]
impl ChildResource for Deployment {
    fn merge(existing: &Self, desired: &Self) -> Result<Self> {
        merge_deployment(existing, desired)
    }

    async fn fetch(
        client: &dyn SpringBootKubeClient,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Self>> {
        client.get_deployment(namespace, name).await
    }

    async fn create(client: &dyn SpringBootKubeClient, object: &Self) -> Result<Self> {
        client.create_deployment(object).await
    }

    async fn replace(client: &dyn SpringBootKubeClient, object: &Self) -> Result<Self> {
        client.replace_deployment(object).await
    }
}

/// Creates `desired` when absent, otherwise replaces the merged object if it differs.
///
/// Conflicts restart the whole read/merge/write step a few times before the
/// conflict is returned to the caller.
pub async fn create_or_update<K: ChildResource>(
    client: &dyn SpringBootKubeClient,
    desired: &K,
) -> Result<OperationResult> {
    let kind = K::kind(&()).to_string();
    let meta = desired.meta();
    let (namespace, name) = match (&meta.namespace, &meta.name) {
        (Some(namespace), Some(name)) => (namespace.clone(), name.clone()),
        _ => {
            return Err(OperatorError::InvalidResource(format!(
                "{} must have a name and namespace",
                kind
            )))
        }
    };

    let backoff = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(CONFLICT_RETRY_MIN_DELAY_MS))
        .with_max_delay(Duration::from_millis(CONFLICT_RETRY_MAX_DELAY_MS))
        .with_max_times(CONFLICT_RETRY_MAX_TIMES);

    let result = (|| apply_once(client, desired, &namespace, &name))
        .retry(&backoff)
        .sleep(tokio::time::sleep)
        .when(|e| matches!(e, OperatorError::Conflict { .. }))
        .notify(|err, delay| {
            debug!(
                kind = %kind,
                %namespace,
                %name,
                ?delay,
                "Retrying after conflict: {}",
                err
            )
        })
        .await?;

    info!(kind = %kind, %namespace, %name, operation = %result, "Reconciled child resource");
    Ok(result)
}

async fn apply_once<K: ChildResource>(
    client: &dyn SpringBootKubeClient,
    desired: &K,
    namespace: &str,
    name: &str,
) -> Result<OperationResult> {
    match K::fetch(client, namespace, name).await? {
        None => {
            K::create(client, desired).await?;
            Ok(OperationResult::Created)
        }
        Some(existing) => {
            let merged = K::merge(&existing, desired)?;
            if merged == existing {
                return Ok(OperationResult::Unchanged);
            }
            // `merged` still carries the observed resourceVersion.
            K::replace(client, &merged).await?;
            Ok(OperationResult::Updated)
        }
    }
}

/// Labels are added on top of the existing ones; owner references are upserted.
fn merge_metadata(existing: &mut ObjectMeta, desired: &ObjectMeta) -> Result<()> {
    if let Some(labels) = &desired.labels {
        let merged = existing.labels.get_or_insert_with(Default::default);
        for (key, value) in labels {
            merged.insert(key.clone(), value.clone());
        }
    }
    for owner in desired.owner_references.iter().flatten() {
        set_controller_reference(owner, existing)?;
    }
    Ok(())
}

/// Ports always follow the desired state. Cluster IP only when one was asked
/// for, and the selector only when the existing service has none.
pub fn merge_service(existing: &Service, desired: &Service) -> Result<Service> {
    let mut merged = existing.clone();
    merge_metadata(&mut merged.metadata, &desired.metadata)?;

    let desired_spec = desired.spec.clone().unwrap_or_default();
    let spec = merged.spec.get_or_insert_with(Default::default);
    spec.ports = desired_spec.ports;
    if desired_spec.cluster_ip.is_some() {
        spec.cluster_ip = desired_spec.cluster_ip;
    }
    if spec.selector.as_ref().map_or(true, |selector| selector.is_empty()) {
        spec.selector = desired_spec.selector;
    }
    Ok(merged)
}

/// Replicas, pod template, strategy and history limit follow the desired state;
/// the label selector of an existing deployment is never touched.
pub fn merge_deployment(existing: &Deployment, desired: &Deployment) -> Result<Deployment> {
    let mut merged = existing.clone();
    merge_metadata(&mut merged.metadata, &desired.metadata)?;

    let desired_spec = desired.spec.clone().unwrap_or_default();
    match merged.spec.as_mut() {
        Some(spec) => {
            spec.replicas = desired_spec.replicas;
            spec.template = desired_spec.template;
            spec.revision_history_limit = desired_spec.revision_history_limit;
            spec.strategy = merge_strategy(spec.strategy.take(), desired_spec.strategy);
        }
        None => merged.spec = Some(desired_spec),
    }
    Ok(merged)
}

/// Rolling-update parameters left unset in the desired strategy keep the values
/// the API server defaulted, so they are not reported as drift.
fn merge_strategy(
    existing: Option<DeploymentStrategy>,
    desired: Option<DeploymentStrategy>,
) -> Option<DeploymentStrategy> {
    let Some(mut desired) = desired else {
        return existing;
    };
    let existing_rolling = existing.and_then(|strategy| strategy.rolling_update);
    if let (Some(current), Some(wanted)) = (existing_rolling, desired.rolling_update.as_mut()) {
        if wanted.max_surge.is_none() {
            wanted.max_surge = current.max_surge;
        }
        if wanted.max_unavailable.is_none() {
            wanted.max_unavailable = current.max_unavailable;
        }
    }
    Some(desired)
}
