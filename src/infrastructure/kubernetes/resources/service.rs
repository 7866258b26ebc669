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

use crate::domain::application::resolver::ResolvedSpec;
use crate::infrastructure::constants::PROTOCOL_TCP;
use crate::infrastructure::kubernetes::resources::pod::LabeledResourceBuilder;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

pub struct ServiceBuilder<'a> {
    resolved: &'a ResolvedSpec,
    namespace: String,
}

impl LabeledResourceBuilder for ServiceBuilder<'_> {
    fn app_name(&self) -> &str {
        &self.resolved.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl<'a> ServiceBuilder<'a> {
    pub fn new(resolved: &'a ResolvedSpec, namespace: impl Into<String>) -> Self {
        Self {
            resolved,
            namespace: namespace.into(),
        }
    }

    pub fn build(&self) -> Service {
        Service {
            metadata: self.build_metadata(),
            spec: Some(ServiceSpec {
                ports: Some(vec![self.create_service_port()]),
                selector: Some(self.get_selector_labels()),
                // An empty cluster IP lets the API server allocate one.
                cluster_ip: self.resolved.cluster_ip.clone(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Protocol and target port are spelled out so they match what the API
    /// server would default, keeping repeated reconciliations write-free.
    fn create_service_port(&self) -> ServicePort {
        ServicePort {
            name: Some(self.resolved.name.clone()),
            port: self.resolved.port,
            target_port: Some(IntOrString::Int(self.resolved.port)),
            protocol: Some(PROTOCOL_TCP.to_string()),
            ..Default::default()
        }
    }
}
