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

//! Turns a resolved application into the Service and Deployment it should own.

use crate::domain::application::crd::AppIdentity;
use crate::domain::application::resolver::ResolvedSpec;
use crate::infrastructure::kubernetes::resources::{DeploymentBuilder, ServiceBuilder};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;

/// Desired child shapes, recomputed on every reconciliation and never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildResources {
    pub service: Service,
    pub deployment: Deployment,
}

/// Pure: no I/O and no owner linkage, which the reconciler attaches afterwards.
pub fn synthesize(resolved: &ResolvedSpec, identity: &AppIdentity) -> ChildResources {
    ChildResources {
        service: ServiceBuilder::new(resolved, identity.namespace.clone()).build(),
        deployment: DeploymentBuilder::new(resolved, identity.namespace.clone()).build(),
    }
}
