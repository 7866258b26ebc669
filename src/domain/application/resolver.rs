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

//! Defaulting cascade: desired spec + operator configuration -> fully resolved spec.

use crate::domain::application::crd::{EnvVarSpec, NodeAffinitySpec, SpringBoot};
use crate::domain::application::validator::{
    validate_host_path, validate_node_affinity, validate_port, validate_quantity,
    validate_replicas,
};
use crate::domain::config::OperatorConfig;
use crate::infrastructure::constants::DEFAULT_NODE_SELECTOR_OPERATOR;
use crate::shared::error::{OperatorError, Result};
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResources {
    pub cpu_request: String,
    /// `None` leaves CPU unlimited.
    pub cpu_limit: Option<String>,
    pub memory_request: String,
    pub memory_limit: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub liveness: String,
    pub readiness: String,
    pub shutdown: String,
    pub host_log: Option<String>,
}

/// A SpringBoot spec with every defaultable field filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpec {
    pub name: String,
    pub image: String,
    pub port: i32,
    pub cluster_ip: Option<String>,
    pub replicas: i32,
    pub resources: ResolvedResources,
    pub paths: ResolvedPaths,
    pub image_pull_secrets: Vec<String>,
    pub env: Vec<EnvVarSpec>,
    pub node_affinity: Option<NodeAffinitySpec>,
}

pub fn resolve(spec: &SpringBoot, config: &OperatorConfig, name: &str) -> Result<ResolvedSpec> {
    let invalid = |reason: String| OperatorError::resolve_error(name, reason);

    let image = if spec.image.is_empty() {
        if spec.version.is_empty() {
            return Err(invalid(
                "either image or version must be set".to_string(),
            ));
        }
        if config.image_repository.is_empty() {
            warn!(
                app = name,
                "IMAGE_REPOSITORY is not configured, derived image reference has no registry"
            );
        }
        format!("{}/{}:{}", config.image_repository, name, spec.version)
    } else {
        spec.image.clone()
    };

    let port = match spec.port {
        Some(port) if port != 0 => port,
        _ => config.port,
    };
    validate_port(port).map_err(invalid)?;

    let replicas = spec.replicas.unwrap_or(config.replicas);
    validate_replicas(replicas).map_err(invalid)?;

    let resources = ResolvedResources {
        cpu_request: or_default(&spec.resource.cpu.request, &config.request_cpu),
        cpu_limit: Some(or_default(&spec.resource.cpu.limit, &config.limit_cpu))
            .filter(|limit| !limit.is_empty()),
        memory_request: or_default(&spec.resource.memory.request, &config.request_memory),
        memory_limit: or_default(&spec.resource.memory.limit, &config.limit_memory),
    };
    validate_quantity("cpu request", &resources.cpu_request).map_err(invalid)?;
    if let Some(limit) = &resources.cpu_limit {
        validate_quantity("cpu limit", limit).map_err(invalid)?;
    }
    validate_quantity("memory request", &resources.memory_request).map_err(invalid)?;
    validate_quantity("memory limit", &resources.memory_limit).map_err(invalid)?;

    let paths = ResolvedPaths {
        liveness: or_default(&spec.path.liveness, &config.liveness_path),
        readiness: or_default(&spec.path.readiness, &config.readiness_path),
        shutdown: or_default(&spec.path.shutdown, &config.shutdown_path),
        host_log: Some(or_default(&spec.path.host_log, &config.host_log_path))
            .filter(|path| !path.is_empty()),
    };
    if let Some(host_log) = &paths.host_log {
        validate_host_path(host_log).map_err(invalid)?;
    }

    let node_affinity = resolve_node_affinity(spec, config);
    if let Some(affinity) = &node_affinity {
        validate_node_affinity(&affinity.key, &affinity.operator, &affinity.values)
            .map_err(invalid)?;
    }

    Ok(ResolvedSpec {
        name: name.to_string(),
        image,
        port,
        cluster_ip: Some(spec.cluster_ip.clone()).filter(|ip| !ip.is_empty()),
        replicas,
        resources,
        paths,
        image_pull_secrets: merge_pull_secrets(&spec.image_pull_secrets, &config.image_pull_secrets),
        env: merge_env(&spec.env, config),
        node_affinity,
    })
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// User entries first, in their order; configuration only fills names the user did not set.
fn merge_env(user: &[EnvVarSpec], config: &OperatorConfig) -> Vec<EnvVarSpec> {
    let present: HashSet<&str> = user.iter().map(|e| e.name.as_str()).collect();
    let mut env = user.to_vec();
    env.extend(
        config
            .env
            .iter()
            .filter(|(name, _)| !present.contains(name.as_str()))
            .map(|(name, value)| EnvVarSpec::new(name.clone(), value.clone())),
    );
    env
}

/// User secrets followed by every configured one. Duplicates are kept.
fn merge_pull_secrets(user: &[String], configured: &[String]) -> Vec<String> {
    user.iter().chain(configured).cloned().collect()
}

fn resolve_node_affinity(spec: &SpringBoot, config: &OperatorConfig) -> Option<NodeAffinitySpec> {
    let (key, operator, values) = if !spec.node_affinity.key.is_empty() {
        (
            &spec.node_affinity.key,
            &spec.node_affinity.operator,
            &spec.node_affinity.values,
        )
    } else if !config.node_affinity_key.is_empty() {
        (
            &config.node_affinity_key,
            &config.node_affinity_operator,
            &config.node_affinity_values,
        )
    } else {
        return None;
    };

    Some(NodeAffinitySpec {
        key: key.clone(),
        operator: or_default(operator, DEFAULT_NODE_SELECTOR_OPERATOR),
        values: values.clone(),
    })
}
