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
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::resources::pod::{
    AffinityBuilder, EnvironmentBuilder, LabeledResourceBuilder, LifecycleBuilder, ProbeBuilder,
};
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, DeploymentStrategy, RollingUpdateDeployment,
};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, HostPathVolumeSource, LocalObjectReference, PodSecurityContext,
    PodSpec, PodTemplateSpec, ResourceRequirements, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

pub struct DeploymentBuilder<'a> {
    resolved: &'a ResolvedSpec,
    namespace: String,
}

impl LabeledResourceBuilder for DeploymentBuilder<'_> {
    fn app_name(&self) -> &str {
        &self.resolved.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl<'a> DeploymentBuilder<'a> {
    pub fn new(resolved: &'a ResolvedSpec, namespace: impl Into<String>) -> Self {
        Self {
            resolved,
            namespace: namespace.into(),
        }
    }

    pub fn build(&self) -> Deployment {
        Deployment {
            metadata: self.build_metadata(),
            spec: Some(DeploymentSpec {
                replicas: Some(self.resolved.replicas),
                revision_history_limit: Some(REVISION_HISTORY_LIMIT),
                selector: LabelSelector {
                    match_labels: Some(self.get_selector_labels()),
                    ..Default::default()
                },
                template: self.build_pod_template(),
                // No surge/unavailable overrides, the API server defaults apply.
                strategy: Some(DeploymentStrategy {
                    type_: Some(STRATEGY_TYPE_ROLLING_UPDATE.to_string()),
                    rolling_update: Some(RollingUpdateDeployment::default()),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// The pod template is replaced wholesale on update, so every field the API
    /// server would default is set here explicitly.
    pub fn build_pod_template(&self) -> PodTemplateSpec {
        let resolved = self.resolved;
        let image_pull_secrets = if resolved.image_pull_secrets.is_empty() {
            None
        } else {
            Some(
                resolved
                    .image_pull_secrets
                    .iter()
                    .map(|name| LocalObjectReference { name: name.clone() })
                    .collect(),
            )
        };
        let volumes = self.build_volumes();

        PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(self.get_labels()),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                containers: vec![self.build_container()],
                affinity: Some(
                    AffinityBuilder::new(&resolved.name)
                        .with_node_affinity(resolved.node_affinity.as_ref())
                        .build(),
                ),
                image_pull_secrets,
                volumes: if volumes.is_empty() { None } else { Some(volumes) },
                restart_policy: Some(RESTART_POLICY_ALWAYS.to_string()),
                dns_policy: Some(DNS_POLICY_CLUSTER_FIRST.to_string()),
                scheduler_name: Some(DEFAULT_SCHEDULER_NAME.to_string()),
                termination_grace_period_seconds: Some(TERMINATION_GRACE_PERIOD_SECONDS),
                security_context: Some(PodSecurityContext::default()),
                ..Default::default()
            }),
        }
    }

    fn build_container(&self) -> Container {
        let resolved = self.resolved;
        let mounts = self.build_volume_mounts();

        Container {
            name: resolved.name.clone(),
            image: Some(resolved.image.clone()),
            image_pull_policy: Some(IMAGE_PULL_POLICY_IF_NOT_PRESENT.to_string()),
            ports: Some(vec![ContainerPort {
                container_port: resolved.port,
                protocol: Some(PROTOCOL_TCP.to_string()),
                ..Default::default()
            }]),
            env: EnvironmentBuilder::new().with_vars(&resolved.env).build(),
            resources: Some(self.build_resources()),
            lifecycle: Some(LifecycleBuilder::build_graceful_shutdown(
                &resolved.paths.shutdown,
                resolved.port,
            )),
            liveness_probe: Some(ProbeBuilder::http_get(&resolved.paths.liveness, resolved.port)),
            readiness_probe: Some(ProbeBuilder::http_get(
                &resolved.paths.readiness,
                resolved.port,
            )),
            volume_mounts: if mounts.is_empty() { None } else { Some(mounts) },
            termination_message_path: Some(TERMINATION_MESSAGE_PATH.to_string()),
            termination_message_policy: Some(TERMINATION_MESSAGE_POLICY_FILE.to_string()),
            ..Default::default()
        }
    }

    /// Requests always carry cpu and memory. Limits always carry memory; cpu only
    /// when a limit was resolved, otherwise CPU stays unlimited.
    pub fn build_resources(&self) -> ResourceRequirements {
        let resources = &self.resolved.resources;

        let mut requests = BTreeMap::new();
        requests.insert(
            RESOURCE_CPU.to_string(),
            Quantity(resources.cpu_request.clone()),
        );
        requests.insert(
            RESOURCE_MEMORY.to_string(),
            Quantity(resources.memory_request.clone()),
        );

        let mut limits = BTreeMap::new();
        limits.insert(
            RESOURCE_MEMORY.to_string(),
            Quantity(resources.memory_limit.clone()),
        );
        if let Some(cpu_limit) = &resources.cpu_limit {
            limits.insert(RESOURCE_CPU.to_string(), Quantity(cpu_limit.clone()));
        }

        ResourceRequirements {
            requests: Some(requests),
            limits: Some(limits),
            ..Default::default()
        }
    }

    pub fn build_volumes(&self) -> Vec<Volume> {
        let mut volumes = Vec::new();

        if let Some(host_log) = &self.resolved.paths.host_log {
            volumes.push(Volume {
                name: VOLUME_NAME_APP_LOG.to_string(),
                host_path: Some(HostPathVolumeSource {
                    path: host_log.clone(),
                    type_: Some(VOLUME_TYPE_DIRECTORY_OR_CREATE.to_string()),
                }),
                ..Default::default()
            });
        }

        volumes
    }

    pub fn build_volume_mounts(&self) -> Vec<VolumeMount> {
        let mut mounts = Vec::new();

        if let Some(host_log) = &self.resolved.paths.host_log {
            mounts.push(VolumeMount {
                name: VOLUME_NAME_APP_LOG.to_string(),
                mount_path: host_log.clone(),
                read_only: Some(false),
                ..Default::default()
            });
        }

        mounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::application::crd::{EnvVarSpec, NodeAffinitySpec, SpringBoot};
    use crate::domain::application::resolver::resolve;
    use crate::domain::config::OperatorConfig;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    fn versioned() -> SpringBoot {
        SpringBoot {
            version: "1.2.0".to_string(),
            ..SpringBoot::default()
        }
    }

    fn config() -> OperatorConfig {
        OperatorConfig {
            image_repository: "registry.example.com".to_string(),
            ..OperatorConfig::default()
        }
    }

    fn container(deployment: &Deployment) -> &Container {
        &deployment
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap()
            .containers[0]
    }

    #[test]
    fn deployment_carries_defaults() {
        let resolved = resolve(&versioned(), &config(), "orders").unwrap();
        let deployment = DeploymentBuilder::new(&resolved, "shop").build();

        let spec = deployment.spec.as_ref().unwrap();
        assert_eq!(spec.replicas, Some(3));
        assert_eq!(spec.revision_history_limit, Some(10));
        assert_eq!(
            spec.strategy.as_ref().unwrap().type_.as_deref(),
            Some("RollingUpdate")
        );
        assert_eq!(
            spec.selector.match_labels.as_ref().unwrap().get("k8s-app").map(String::as_str),
            Some("orders")
        );
        assert_eq!(
            spec.template
                .metadata
                .as_ref()
                .unwrap()
                .labels
                .as_ref()
                .unwrap()
                .get("k8s-app")
                .map(String::as_str),
            Some("orders")
        );

        let container = container(&deployment);
        assert_eq!(container.name, "orders");
        assert_eq!(
            container.image.as_deref(),
            Some("registry.example.com/orders:1.2.0")
        );
        assert_eq!(container.image_pull_policy.as_deref(), Some("IfNotPresent"));
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 8080);
        assert_eq!(container.env, None);

        let liveness = container.liveness_probe.as_ref().unwrap().http_get.as_ref().unwrap();
        assert_eq!(liveness.path.as_deref(), Some("/actuator/health"));
        assert_eq!(liveness.port, IntOrString::Int(8080));

        let pre_stop = container
            .lifecycle
            .as_ref()
            .unwrap()
            .pre_stop
            .as_ref()
            .unwrap()
            .http_get
            .as_ref()
            .unwrap();
        assert_eq!(pre_stop.path.as_deref(), Some("/spring/shutdown"));
    }

    #[test]
    fn server_defaulted_fields_are_explicit() {
        let resolved = resolve(&versioned(), &config(), "orders").unwrap();
        let deployment = DeploymentBuilder::new(&resolved, "shop").build();

        let pod = deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap();
        assert_eq!(pod.restart_policy.as_deref(), Some("Always"));
        assert_eq!(pod.dns_policy.as_deref(), Some("ClusterFirst"));
        assert_eq!(pod.scheduler_name.as_deref(), Some("default-scheduler"));
        assert_eq!(pod.termination_grace_period_seconds, Some(30));
        assert_eq!(pod.security_context, Some(PodSecurityContext::default()));

        let container = container(&deployment);
        assert_eq!(
            container.termination_message_path.as_deref(),
            Some("/dev/termination-log")
        );
        assert_eq!(container.termination_message_policy.as_deref(), Some("File"));
        assert_eq!(container.ports.as_ref().unwrap()[0].protocol.as_deref(), Some("TCP"));

        for probe in [&container.liveness_probe, &container.readiness_probe] {
            let probe = probe.as_ref().unwrap();
            assert_eq!(probe.timeout_seconds, Some(1));
            assert_eq!(probe.period_seconds, Some(10));
            assert_eq!(probe.success_threshold, Some(1));
            assert_eq!(probe.failure_threshold, Some(3));
            assert_eq!(
                probe.http_get.as_ref().unwrap().scheme.as_deref(),
                Some("HTTP")
            );
        }
        let pre_stop = container.lifecycle.as_ref().unwrap().pre_stop.as_ref().unwrap();
        assert_eq!(
            pre_stop.http_get.as_ref().unwrap().scheme.as_deref(),
            Some("HTTP")
        );
    }

    #[test]
    fn cpu_limit_is_omitted_unless_set() {
        let resolved = resolve(&versioned(), &config(), "orders").unwrap();
        let resources = DeploymentBuilder::new(&resolved, "shop").build_resources();
        let requests = resources.requests.unwrap();
        let limits = resources.limits.unwrap();
        assert_eq!(requests.get("cpu"), Some(&Quantity("50m".to_string())));
        assert_eq!(requests.get("memory"), Some(&Quantity("2Gi".to_string())));
        assert_eq!(limits.get("memory"), Some(&Quantity("2Gi".to_string())));
        assert!(!limits.contains_key("cpu"));

        let mut spec = versioned();
        spec.resource.cpu.limit = "1".to_string();
        let resolved = resolve(&spec, &config(), "orders").unwrap();
        let limits = DeploymentBuilder::new(&resolved, "shop")
            .build_resources()
            .limits
            .unwrap();
        assert_eq!(limits.get("cpu"), Some(&Quantity("1".to_string())));
    }

    #[test]
    fn host_log_is_mounted_at_the_same_path() {
        let resolved = resolve(&versioned(), &config(), "orders").unwrap();
        let builder = DeploymentBuilder::new(&resolved, "shop");

        let volumes = builder.build_volumes();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].name, "applogpath");
        let host_path = volumes[0].host_path.as_ref().unwrap();
        assert_eq!(host_path.path, "/var/applog");
        assert_eq!(host_path.type_.as_deref(), Some("DirectoryOrCreate"));

        let mounts = builder.build_volume_mounts();
        assert_eq!(mounts[0].name, "applogpath");
        assert_eq!(mounts[0].mount_path, "/var/applog");
        assert_eq!(mounts[0].read_only, Some(false));
    }

    #[test]
    fn env_secrets_and_affinity_reach_the_pod() {
        let mut cfg = config();
        cfg.image_pull_secrets = vec!["regcred".to_string()];
        let mut spec = versioned();
        spec.env = vec![EnvVarSpec::new("PROFILE", "prod")];
        spec.node_affinity = NodeAffinitySpec {
            key: "zone".to_string(),
            operator: "In".to_string(),
            values: vec!["a".to_string()],
        };
        let resolved = resolve(&spec, &cfg, "orders").unwrap();
        let deployment = DeploymentBuilder::new(&resolved, "shop").build();

        let env = container(&deployment).env.as_ref().unwrap();
        assert_eq!(env[0].name, "PROFILE");
        assert_eq!(env[0].value.as_deref(), Some("prod"));

        let pod = deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap();
        assert_eq!(
            pod.image_pull_secrets.as_ref().unwrap()[0].name,
            "regcred".to_string()
        );
        let affinity = pod.affinity.as_ref().unwrap();
        assert!(affinity.pod_anti_affinity.is_some());
        let terms = &affinity
            .node_affinity
            .as_ref()
            .unwrap()
            .required_during_scheduling_ignored_during_execution
            .as_ref()
            .unwrap()
            .node_selector_terms;
        let requirement = &terms[0].match_expressions.as_ref().unwrap()[0];
        assert_eq!(requirement.key, "zone");
        assert_eq!(requirement.values, Some(vec!["a".to_string()]));
    }
}
