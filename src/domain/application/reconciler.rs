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

use crate::domain::application::crd::{AppIdentity, SpringBootApplication};
use crate::domain::application::resolver::{resolve, ResolvedSpec};
use crate::domain::application::status::{next_status, ready_condition, status_changed};
use crate::domain::config::OperatorConfig;
use crate::infrastructure::constants::{
    REASON_DEPLOYMENT_FAILED, REASON_INVALID_SPEC, REASON_RECONCILED, REASON_SERVICE_FAILED,
};
use crate::infrastructure::kubernetes::apply::{create_or_update, OperationResult};
use crate::infrastructure::kubernetes::client::SpringBootKubeClient;
use crate::infrastructure::kubernetes::owner::{controller_owner_reference, set_controller_reference};
use crate::infrastructure::kubernetes::resources::synthesize;
use crate::shared::error::{OperatorError, Result};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// How a single reconciliation pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The application no longer exists; its children are garbage collected.
    Deleted,
    /// The application is being deleted.
    Terminating,
    /// The spec could not be resolved; no child was written.
    Invalid { reason: String },
    /// Writing the Service failed; the Deployment was not touched.
    ServiceFailed { error: String },
    DeploymentFailed {
        service: OperationResult,
        error: String,
    },
    Applied {
        service: OperationResult,
        deployment: OperationResult,
    },
}

/// Drives one application toward its desired Service and Deployment.
///
/// Holds no per-application state: every pass starts from what the API
/// server returns, so duplicate or late triggers are harmless.
pub struct ApplicationReconciler {
    client: Arc<dyn SpringBootKubeClient>,
    config: Arc<OperatorConfig>,
}

impl ApplicationReconciler {
    pub fn new(client: Arc<dyn SpringBootKubeClient>, config: Arc<OperatorConfig>) -> Self {
        Self { client, config }
    }

    /// Fetch, resolve, synthesize, then write the Service and the Deployment in
    /// that order.
    ///
    /// Store write failures end the pass with an `Ok` outcome and a failed
    /// status condition. Conflicts that survive the internal retry and
    /// ownership errors are returned as `Err` so the caller can requeue.
    #[instrument(skip(self), fields(namespace = %identity.namespace, name = %identity.name))]
    pub async fn reconcile(&self, identity: &AppIdentity) -> Result<ReconcileOutcome> {
        let Some(app) = self
            .client
            .get_application(&identity.namespace, &identity.name)
            .await?
        else {
            info!("SpringBootApplication not found, nothing to do");
            return Ok(ReconcileOutcome::Deleted);
        };

        if app.metadata.deletion_timestamp.is_some() {
            info!("SpringBootApplication is being deleted, skipping");
            return Ok(ReconcileOutcome::Terminating);
        }

        let resolved = match resolve(&app.spec.spring_boot, &self.config, &identity.name) {
            Ok(resolved) => resolved,
            Err(err) => {
                let reason = err.to_string();
                warn!("Failed to resolve spec: {}", reason);
                self.record_status(&app, None, false, REASON_INVALID_SPEC, &reason)
                    .await;
                return Ok(ReconcileOutcome::Invalid { reason });
            }
        };

        let owner = controller_owner_reference(&app)?;
        let mut children = synthesize(&resolved, identity);
        set_controller_reference(&owner, &mut children.service.metadata)?;
        set_controller_reference(&owner, &mut children.deployment.metadata)?;

        let service = match create_or_update(self.client.as_ref(), &children.service).await {
            Ok(result) => result,
            Err(err) => {
                error!("Failed to reconcile Service: {}", err);
                let message = format!("service: {}", err);
                self.record_status(&app, None, false, REASON_SERVICE_FAILED, &message)
                    .await;
                if escalates(&err) {
                    return Err(err);
                }
                return Ok(ReconcileOutcome::ServiceFailed {
                    error: err.to_string(),
                });
            }
        };

        let deployment = match create_or_update(self.client.as_ref(), &children.deployment).await
        {
            Ok(result) => result,
            Err(err) => {
                error!("Failed to reconcile Deployment: {}", err);
                let message = format!("deployment: {}", err);
                self.record_status(&app, None, false, REASON_DEPLOYMENT_FAILED, &message)
                    .await;
                if escalates(&err) {
                    return Err(err);
                }
                return Ok(ReconcileOutcome::DeploymentFailed {
                    service,
                    error: err.to_string(),
                });
            }
        };

        info!(%service, %deployment, image = %resolved.image, "Reconciled");
        self.record_status(
            &app,
            Some(&resolved),
            true,
            REASON_RECONCILED,
            "Service and Deployment are up to date",
        )
        .await;

        Ok(ReconcileOutcome::Applied {
            service,
            deployment,
        })
    }

    /// Best effort: a failed status write is logged and never fails the pass.
    async fn record_status(
        &self,
        app: &SpringBootApplication,
        resolved: Option<&ResolvedSpec>,
        ready: bool,
        reason: &str,
        message: &str,
    ) {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let status = next_status(
            app.status.as_ref(),
            app.metadata.generation,
            resolved,
            ready_condition(ready, reason, message),
            &now,
        );
        if !status_changed(app.status.as_ref(), &status) {
            return;
        }

        let namespace = app.metadata.namespace.as_deref().unwrap_or_default();
        let name = app.metadata.name.as_deref().unwrap_or_default();
        if let Err(err) = self
            .client
            .patch_application_status(namespace, name, &status)
            .await
        {
            warn!("Failed to update status: {}", err);
        }
    }
}

/// Conflicts and ownership errors are handed back to the trigger substrate.
fn escalates(err: &OperatorError) -> bool {
    matches!(
        err,
        OperatorError::Conflict { .. } | OperatorError::OwnerReference(_)
    )
}
