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

//! Hooks the reconciler into `kube::runtime::Controller`, which watches the
//! applications plus the Services and Deployments they own and serialises
//! passes per object.

use crate::domain::application::crd::{AppIdentity, SpringBootApplication};
use crate::domain::application::reconciler::ApplicationReconciler;
use crate::domain::config::OperatorConfig;
use crate::infrastructure::constants::RETRY_REQUEUE_SECS;
use crate::infrastructure::kubernetes::client::SpringBootKubeClientImpl;
use crate::shared::error::{OperatorError, Result};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::runtime::controller::Action;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Runs until SIGINT/SIGTERM. `namespace` limits every watch to one namespace.
pub async fn run_controller(
    client: Client,
    config: Arc<OperatorConfig>,
    namespace: Option<String>,
) -> Result<()> {
    let (applications, services, deployments) = match &namespace {
        Some(ns) => (
            Api::<SpringBootApplication>::namespaced(client.clone(), ns),
            Api::<Service>::namespaced(client.clone(), ns),
            Api::<Deployment>::namespaced(client.clone(), ns),
        ),
        None => (
            Api::<SpringBootApplication>::all(client.clone()),
            Api::<Service>::all(client.clone()),
            Api::<Deployment>::all(client.clone()),
        ),
    };

    // Fail fast when the CRD is not installed instead of looping on watch errors.
    applications
        .list(&kube::api::ListParams::default().limit(1))
        .await
        .map_err(|e| {
            OperatorError::Kube(format!(
                "SpringBootApplication CRD is not queryable, is it installed? {}",
                e
            ))
        })?;

    let kube_client = Arc::new(SpringBootKubeClientImpl::from_client(client));
    let context = Arc::new(ApplicationReconciler::new(kube_client, config));

    info!(
        namespace = namespace.as_deref().unwrap_or("<all>"),
        "Starting SpringBootApplication controller"
    );

    Controller::new(applications, WatcherConfig::default())
        .owns(services, WatcherConfig::default())
        .owns(deployments, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => debug!("Reconciled {}", object),
                Err(err) => warn!("Reconcile loop error: {}", err),
            }
        })
        .await;

    info!("Controller stopped");
    Ok(())
}

async fn reconcile(
    app: Arc<SpringBootApplication>,
    reconciler: Arc<ApplicationReconciler>,
) -> Result<Action> {
    let identity = AppIdentity::new(app.namespace().unwrap_or_default(), app.name_any());
    let outcome = reconciler.reconcile(&identity).await?;
    debug!(%identity, ?outcome, "Reconciliation finished");
    Ok(Action::await_change())
}

fn error_policy(
    app: Arc<SpringBootApplication>,
    err: &OperatorError,
    _reconciler: Arc<ApplicationReconciler>,
) -> Action {
    if err.is_retryable() {
        warn!(
            "Reconciling {}/{} failed, retrying in {}s: {}",
            app.namespace().unwrap_or_default(),
            app.name_any(),
            RETRY_REQUEUE_SECS,
            err
        );
        Action::requeue(Duration::from_secs(RETRY_REQUEUE_SECS))
    } else {
        error!(
            "Reconciling {}/{} failed: {}",
            app.namespace().unwrap_or_default(),
            app.name_any(),
            err
        );
        Action::await_change()
    }
}
