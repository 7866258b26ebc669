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

//! In-memory stand-in for the API server used by the integration tests.
//!
//! Writes bump a resourceVersion and are rejected when stale, the way the
//! real server rejects them. Deployment selectors and assigned cluster IPs
//! are immutable. Omitted fields are defaulted on every write the way the
//! API server defaults them. Failures can be injected per child kind.

#![allow(dead_code)]

use k8s_openapi::api::apps::v1::{Deployment, RollingUpdateDeployment};
use k8s_openapi::api::core::v1::{HTTPGetAction, PodSecurityContext, Probe, Service};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use springboot_operator::domain::application::crd::{
    SpringBoot, SpringBootApplication, SpringBootApplicationSpec, SpringBootApplicationStatus,
};
use springboot_operator::domain::config::OperatorConfig;
use springboot_operator::{OperatorError, Result, SpringBootKubeClient};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

type Key = (String, String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    pub service_creates: usize,
    pub service_replaces: usize,
    pub deployment_creates: usize,
    pub deployment_replaces: usize,
    pub status_patches: usize,
}

impl WriteCounts {
    pub fn child_writes(&self) -> usize {
        self.service_creates + self.service_replaces + self.deployment_creates + self.deployment_replaces
    }
}

#[derive(Default)]
struct State {
    applications: BTreeMap<Key, SpringBootApplication>,
    services: BTreeMap<Key, Service>,
    deployments: BTreeMap<Key, Deployment>,
    version: u64,
    writes: WriteCounts,
    service_failure: Option<String>,
    deployment_failure: Option<String>,
    deployment_conflicts: usize,
}

impl State {
    fn next_version(&mut self) -> String {
        self.version += 1;
        self.version.to_string()
    }
}

#[derive(Default, Clone)]
pub struct FakeCluster {
    state: Arc<Mutex<State>>,
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

fn meta_key(meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta) -> Key {
    key(
        meta.namespace.as_deref().unwrap_or_default(),
        meta.name.as_deref().unwrap_or_default(),
    )
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an application the way the API server would after a create.
    pub fn add_application(&self, mut app: SpringBootApplication) -> SpringBootApplication {
        let mut state = self.state.lock().unwrap();
        let version = state.next_version();
        let k = meta_key(&app.metadata);
        app.metadata.uid = Some(format!("uid-{}", k.1));
        app.metadata.resource_version = Some(version);
        app.metadata.generation = Some(app.metadata.generation.map_or(1, |g| g + 1));
        state.applications.insert(k, app.clone());
        app
    }

    /// Replaces the spec of a stored application and bumps its generation.
    pub fn update_spec(&self, namespace: &str, name: &str, spring_boot: SpringBoot) {
        let mut state = self.state.lock().unwrap();
        let version = state.next_version();
        let app = state
            .applications
            .get_mut(&key(namespace, name))
            .expect("application exists");
        app.spec.spring_boot = spring_boot;
        app.metadata.generation = app.metadata.generation.map(|g| g + 1);
        app.metadata.resource_version = Some(version);
    }

    pub fn mutate_application(&self, namespace: &str, name: &str, f: impl FnOnce(&mut SpringBootApplication)) {
        let mut state = self.state.lock().unwrap();
        if let Some(app) = state.applications.get_mut(&key(namespace, name)) {
            f(app);
        }
    }

    pub fn insert_service(&self, mut service: Service) {
        let mut state = self.state.lock().unwrap();
        service.metadata.resource_version = Some(state.next_version());
        state.services.insert(meta_key(&service.metadata), service);
    }

    pub fn insert_deployment(&self, mut deployment: Deployment) {
        let mut state = self.state.lock().unwrap();
        deployment.metadata.resource_version = Some(state.next_version());
        state.deployments.insert(meta_key(&deployment.metadata), deployment);
    }

    pub fn application(&self, namespace: &str, name: &str) -> Option<SpringBootApplication> {
        self.state.lock().unwrap().applications.get(&key(namespace, name)).cloned()
    }

    pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
        self.state.lock().unwrap().services.get(&key(namespace, name)).cloned()
    }

    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.state.lock().unwrap().deployments.get(&key(namespace, name)).cloned()
    }

    pub fn writes(&self) -> WriteCounts {
        self.state.lock().unwrap().writes
    }

    pub fn fail_service_writes(&self, message: &str) {
        self.state.lock().unwrap().service_failure = Some(message.to_string());
    }

    pub fn fail_deployment_writes(&self, message: &str) {
        self.state.lock().unwrap().deployment_failure = Some(message.to_string());
    }

    /// The next `count` deployment replaces race with a concurrent writer.
    pub fn race_deployment_replaces(&self, count: usize) {
        self.state.lock().unwrap().deployment_conflicts = count;
    }
}

fn conflict(kind: &str, k: &Key, message: &str) -> OperatorError {
    OperatorError::conflict(kind, k.1.as_str(), k.0.as_str(), message)
}

fn missing(kind: &str, k: &Key) -> OperatorError {
    OperatorError::Kube(format!("{} {}/{} not found", kind, k.0, k.1))
}

fn default_str(field: &mut Option<String>, value: &str) {
    if field.is_none() {
        *field = Some(value.to_string());
    }
}

fn default_http_get(action: &mut HTTPGetAction) {
    default_str(&mut action.scheme, "HTTP");
}

fn default_probe(probe: &mut Probe) {
    probe.timeout_seconds.get_or_insert(1);
    probe.period_seconds.get_or_insert(10);
    probe.success_threshold.get_or_insert(1);
    probe.failure_threshold.get_or_insert(3);
    if let Some(action) = probe.http_get.as_mut() {
        default_http_get(action);
    }
}

/// Fills what the API server fills when a Deployment is written.
fn apply_deployment_defaults(deployment: &mut Deployment) {
    let Some(spec) = deployment.spec.as_mut() else {
        return;
    };
    spec.progress_deadline_seconds.get_or_insert(600);
    spec.revision_history_limit.get_or_insert(10);
    let strategy = spec.strategy.get_or_insert_with(Default::default);
    default_str(&mut strategy.type_, "RollingUpdate");
    if strategy.type_.as_deref() == Some("RollingUpdate") {
        let rolling = strategy
            .rolling_update
            .get_or_insert_with(RollingUpdateDeployment::default);
        rolling
            .max_surge
            .get_or_insert(IntOrString::String("25%".to_string()));
        rolling
            .max_unavailable
            .get_or_insert(IntOrString::String("25%".to_string()));
    }

    let Some(pod) = spec.template.spec.as_mut() else {
        return;
    };
    default_str(&mut pod.restart_policy, "Always");
    default_str(&mut pod.dns_policy, "ClusterFirst");
    default_str(&mut pod.scheduler_name, "default-scheduler");
    pod.termination_grace_period_seconds.get_or_insert(30);
    pod.security_context.get_or_insert_with(PodSecurityContext::default);
    for container in pod.containers.iter_mut() {
        default_str(&mut container.termination_message_path, "/dev/termination-log");
        default_str(&mut container.termination_message_policy, "File");
        default_str(&mut container.image_pull_policy, "IfNotPresent");
        for port in container.ports.iter_mut().flatten() {
            default_str(&mut port.protocol, "TCP");
        }
        for probe in [&mut container.liveness_probe, &mut container.readiness_probe] {
            if let Some(probe) = probe.as_mut() {
                default_probe(probe);
            }
        }
        if let Some(action) = container
            .lifecycle
            .as_mut()
            .and_then(|l| l.pre_stop.as_mut())
            .and_then(|h| h.http_get.as_mut())
        {
            default_http_get(action);
        }
    }
}

/// Fills what the API server fills when a Service is written.
fn apply_service_defaults(service: &mut Service) {
    let spec = service.spec.get_or_insert_with(Default::default);
    default_str(&mut spec.type_, "ClusterIP");
    default_str(&mut spec.session_affinity, "None");
    for port in spec.ports.iter_mut().flatten() {
        default_str(&mut port.protocol, "TCP");
        if port.target_port.is_none() {
            port.target_port = Some(IntOrString::Int(port.port));
        }
    }
}

#[async_trait::async_trait]
impl SpringBootKubeClient for FakeCluster {
    async fn get_application(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SpringBootApplication>> {
        Ok(self.application(namespace, name))
    }

    async fn patch_application_status(
        &self,
        namespace: &str,
        name: &str,
        status: &SpringBootApplicationStatus,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let version = state.next_version();
        let app = state
            .applications
            .get_mut(&key(namespace, name))
            .ok_or_else(|| missing("SpringBootApplication", &key(namespace, name)))?;
        app.status = Some(status.clone());
        app.metadata.resource_version = Some(version);
        state.writes.status_patches += 1;
        Ok(())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        Ok(self.service(namespace, name))
    }

    async fn create_service(&self, service: &Service) -> Result<Service> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.service_failure {
            return Err(OperatorError::Kube(message.clone()));
        }
        let k = meta_key(&service.metadata);
        if state.services.contains_key(&k) {
            return Err(conflict("Service", &k, "already exists"));
        }

        let mut stored = service.clone();
        stored.metadata.resource_version = Some(state.next_version());
        stored.metadata.uid = Some(format!("svc-{}", k.1));
        apply_service_defaults(&mut stored);
        let spec = stored.spec.get_or_insert_with(Default::default);
        if spec.cluster_ip.is_none() {
            spec.cluster_ip = Some("10.96.0.10".to_string());
        }
        state.services.insert(k, stored.clone());
        state.writes.service_creates += 1;
        Ok(stored)
    }

    async fn replace_service(&self, service: &Service) -> Result<Service> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.service_failure {
            return Err(OperatorError::Kube(message.clone()));
        }
        let k = meta_key(&service.metadata);
        let current = state
            .services
            .get(&k)
            .ok_or_else(|| missing("Service", &k))?;
        if current.metadata.resource_version != service.metadata.resource_version {
            return Err(conflict("Service", &k, "resourceVersion is stale"));
        }
        let current_ip = current.spec.as_ref().and_then(|s| s.cluster_ip.clone());
        let new_ip = service.spec.as_ref().and_then(|s| s.cluster_ip.clone());
        if current_ip.is_some() && current_ip != new_ip {
            return Err(OperatorError::Kube(
                "spec.clusterIP: Invalid value: field is immutable".to_string(),
            ));
        }

        let mut stored = service.clone();
        stored.metadata.resource_version = Some(state.next_version());
        apply_service_defaults(&mut stored);
        state.services.insert(k, stored.clone());
        state.writes.service_replaces += 1;
        Ok(stored)
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Option<Deployment>> {
        Ok(self.deployment(namespace, name))
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.deployment_failure {
            return Err(OperatorError::Kube(message.clone()));
        }
        let k = meta_key(&deployment.metadata);
        if state.deployments.contains_key(&k) {
            return Err(conflict("Deployment", &k, "already exists"));
        }

        let mut stored = deployment.clone();
        stored.metadata.resource_version = Some(state.next_version());
        stored.metadata.uid = Some(format!("deploy-{}", k.1));
        stored.metadata.generation = Some(1);
        apply_deployment_defaults(&mut stored);
        state.deployments.insert(k, stored.clone());
        state.writes.deployment_creates += 1;
        Ok(stored)
    }

    async fn replace_deployment(&self, deployment: &Deployment) -> Result<Deployment> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.deployment_failure {
            return Err(OperatorError::Kube(message.clone()));
        }
        let k = meta_key(&deployment.metadata);

        if state.deployment_conflicts > 0 {
            state.deployment_conflicts -= 1;
            let version = state.next_version();
            if let Some(current) = state.deployments.get_mut(&k) {
                current.metadata.resource_version = Some(version);
            }
        }

        let current = state
            .deployments
            .get(&k)
            .ok_or_else(|| missing("Deployment", &k))?;
        if current.metadata.resource_version != deployment.metadata.resource_version {
            return Err(conflict("Deployment", &k, "resourceVersion is stale"));
        }
        let current_selector = current.spec.as_ref().map(|s| s.selector.clone());
        let new_selector = deployment.spec.as_ref().map(|s| s.selector.clone());
        if current_selector != new_selector {
            return Err(OperatorError::Kube(
                "spec.selector: Invalid value: field is immutable".to_string(),
            ));
        }

        let generation = current.metadata.generation.unwrap_or(0);
        let current_spec = current.spec.clone();

        let mut stored = deployment.clone();
        stored.metadata.resource_version = Some(state.next_version());
        apply_deployment_defaults(&mut stored);
        if stored.spec != current_spec {
            stored.metadata.generation = Some(generation + 1);
        }
        state.deployments.insert(k, stored.clone());
        state.writes.deployment_replaces += 1;
        Ok(stored)
    }
}

/// Configuration from the end-to-end scenario: registry set, everything else defaulted.
pub fn scenario_config() -> Arc<OperatorConfig> {
    Arc::new(OperatorConfig {
        image_repository: "registry.example.com".to_string(),
        ..OperatorConfig::default()
    })
}

pub fn application(namespace: &str, name: &str, spring_boot: SpringBoot) -> SpringBootApplication {
    let mut app = SpringBootApplication::new(name, SpringBootApplicationSpec { spring_boot });
    app.metadata.namespace = Some(namespace.to_string());
    app
}

pub fn versioned(version: &str) -> SpringBoot {
    SpringBoot {
        version: version.to_string(),
        port: Some(0),
        ..SpringBoot::default()
    }
}
