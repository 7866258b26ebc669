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

//! Process-wide fallback values for SpringBootApplication defaulting.
//!
//! The configuration is read from the environment once at startup and is
//! immutable afterwards. Reconciliations receive it by reference.

use crate::shared::error::{OperatorError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{error, info};

pub const ENV_IMAGE_REPOSITORY: &str = "IMAGE_REPOSITORY";
pub const ENV_REQUEST_CPU: &str = "REQUEST_CPU";
pub const ENV_LIMIT_CPU: &str = "LIMIT_CPU";
pub const ENV_REQUEST_MEMORY: &str = "REQUEST_MEMORY";
pub const ENV_LIMIT_MEMORY: &str = "LIMIT_MEMORY";
pub const ENV_READINESS_PATH: &str = "READINESS_PATH";
pub const ENV_LIVENESS_PATH: &str = "LIVENESS_PATH";
pub const ENV_SHUTDOWN_PATH: &str = "SHUTDOWN_PATH";
pub const ENV_HOST_LOG_PATH: &str = "HOST_LOG_PATH";
pub const ENV_REPLICAS: &str = "REPLICAS";
pub const ENV_DEFAULT_PORT: &str = "SPRING_BOOT_DEFAULT_PORT";
pub const ENV_IMAGE_PULL_SECRETS: &str = "IMAGE_PULL_SECRETS";
pub const ENV_ENV_MAP: &str = "Env";
pub const ENV_NODE_AFFINITY_KEY: &str = "NODE_AFFINITY_KEY";
pub const ENV_NODE_AFFINITY_VALUES: &str = "NODE_AFFINITY_VALUES";
pub const ENV_NODE_AFFINITY_OPERATOR: &str = "NODE_AFFINITY_OPERATOR";

pub const DEFAULT_REQUEST_CPU: &str = "50m";
pub const DEFAULT_REQUEST_MEMORY: &str = "2Gi";
pub const DEFAULT_LIMIT_MEMORY: &str = "2Gi";
pub const DEFAULT_HEALTH_PATH: &str = "/actuator/health";
pub const DEFAULT_SHUTDOWN_PATH: &str = "/spring/shutdown";
pub const DEFAULT_HOST_LOG_PATH: &str = "/var/applog";
pub const DEFAULT_REPLICAS: i32 = 3;
pub const DEFAULT_PORT: i32 = 8080;

static SHARED: OnceLock<OperatorConfig> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    /// Registry prefix for images derived from the application name. May be empty.
    pub image_repository: String,
    pub request_cpu: String,
    /// Empty means no CPU limit.
    pub limit_cpu: String,
    pub request_memory: String,
    pub limit_memory: String,
    pub liveness_path: String,
    pub readiness_path: String,
    pub shutdown_path: String,
    pub host_log_path: String,
    pub replicas: i32,
    pub port: i32,
    pub env: BTreeMap<String, String>,
    pub image_pull_secrets: Vec<String>,
    /// Empty means no node affinity rule is added.
    pub node_affinity_key: String,
    pub node_affinity_operator: String,
    pub node_affinity_values: Vec<String>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            image_repository: String::new(),
            request_cpu: DEFAULT_REQUEST_CPU.to_string(),
            limit_cpu: String::new(),
            request_memory: DEFAULT_REQUEST_MEMORY.to_string(),
            limit_memory: DEFAULT_LIMIT_MEMORY.to_string(),
            liveness_path: DEFAULT_HEALTH_PATH.to_string(),
            readiness_path: DEFAULT_HEALTH_PATH.to_string(),
            shutdown_path: DEFAULT_SHUTDOWN_PATH.to_string(),
            host_log_path: DEFAULT_HOST_LOG_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            port: DEFAULT_PORT,
            env: BTreeMap::new(),
            image_pull_secrets: Vec::new(),
            node_affinity_key: String::new(),
            node_affinity_operator: String::new(),
            node_affinity_values: Vec::new(),
        }
    }
}

impl OperatorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary setting source.
    ///
    /// Empty values count as unset. Numeric settings that do not parse, or
    /// fall outside their valid range, are fatal.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let image_repository = match read(ENV_IMAGE_REPOSITORY) {
            Some(value) => {
                info!(setting = ENV_IMAGE_REPOSITORY, %value, "Using configured value");
                value
            }
            None => {
                error!(
                    setting = ENV_IMAGE_REPOSITORY,
                    "Not set, images derived from the application name will have no registry prefix"
                );
                String::new()
            }
        };

        let limit_cpu = match read(ENV_LIMIT_CPU) {
            Some(value) => {
                info!(setting = ENV_LIMIT_CPU, %value, "Using configured value");
                value
            }
            None => {
                info!(setting = ENV_LIMIT_CPU, "Not set, CPU is unlimited by default");
                String::new()
            }
        };

        let replicas = numeric_setting(read(ENV_REPLICAS), ENV_REPLICAS, DEFAULT_REPLICAS)?;
        if replicas < 0 {
            return Err(OperatorError::config_error(format!(
                "{} must not be negative, got {}",
                ENV_REPLICAS, replicas
            )));
        }

        let port = numeric_setting(read(ENV_DEFAULT_PORT), ENV_DEFAULT_PORT, DEFAULT_PORT)?;
        if !(1..=65535).contains(&port) {
            return Err(OperatorError::config_error(format!(
                "{} must be between 1 and 65535, got {}",
                ENV_DEFAULT_PORT, port
            )));
        }

        let image_pull_secrets = optional_setting(read(ENV_IMAGE_PULL_SECRETS), ENV_IMAGE_PULL_SECRETS)
            .map(|v| parse_list(&v))
            .unwrap_or_default();
        let env = optional_setting(read(ENV_ENV_MAP), ENV_ENV_MAP)
            .map(|v| parse_env_map(&v))
            .unwrap_or_default();
        let node_affinity_key =
            optional_setting(read(ENV_NODE_AFFINITY_KEY), ENV_NODE_AFFINITY_KEY).unwrap_or_default();
        let node_affinity_values =
            optional_setting(read(ENV_NODE_AFFINITY_VALUES), ENV_NODE_AFFINITY_VALUES)
                .map(|v| parse_list(&v))
                .unwrap_or_default();
        let node_affinity_operator =
            optional_setting(read(ENV_NODE_AFFINITY_OPERATOR), ENV_NODE_AFFINITY_OPERATOR)
                .unwrap_or_default();

        let config = Self {
            image_repository,
            request_cpu: string_setting(read(ENV_REQUEST_CPU), ENV_REQUEST_CPU, DEFAULT_REQUEST_CPU),
            limit_cpu,
            request_memory: string_setting(
                read(ENV_REQUEST_MEMORY),
                ENV_REQUEST_MEMORY,
                DEFAULT_REQUEST_MEMORY,
            ),
            limit_memory: string_setting(read(ENV_LIMIT_MEMORY), ENV_LIMIT_MEMORY, DEFAULT_LIMIT_MEMORY),
            liveness_path: string_setting(read(ENV_LIVENESS_PATH), ENV_LIVENESS_PATH, DEFAULT_HEALTH_PATH),
            readiness_path: string_setting(
                read(ENV_READINESS_PATH),
                ENV_READINESS_PATH,
                DEFAULT_HEALTH_PATH,
            ),
            shutdown_path: string_setting(
                read(ENV_SHUTDOWN_PATH),
                ENV_SHUTDOWN_PATH,
                DEFAULT_SHUTDOWN_PATH,
            ),
            host_log_path: string_setting(
                read(ENV_HOST_LOG_PATH),
                ENV_HOST_LOG_PATH,
                DEFAULT_HOST_LOG_PATH,
            ),
            replicas,
            port,
            env,
            image_pull_secrets,
            node_affinity_key,
            node_affinity_operator,
            node_affinity_values,
        };

        let rendered = serde_json::to_string(&config)?;
        info!(config = %rendered, "Operator configuration loaded");
        Ok(config)
    }

    /// Loads the shared configuration from the environment on first call.
    /// Later calls return the same instance without reading the environment again.
    pub fn initialize() -> Result<&'static OperatorConfig> {
        if let Some(config) = SHARED.get() {
            return Ok(config);
        }
        let config = Self::from_env()?;
        Ok(SHARED.get_or_init(|| config))
    }

    pub fn get() -> Option<&'static OperatorConfig> {
        SHARED.get()
    }
}

fn string_setting(value: Option<String>, key: &str, default: &str) -> String {
    match value {
        Some(value) => {
            info!(setting = key, %value, "Using configured value");
            value
        }
        None => {
            info!(setting = key, default, "Not set, using default");
            default.to_string()
        }
    }
}

fn optional_setting(value: Option<String>, key: &str) -> Option<String> {
    match &value {
        Some(v) => info!(setting = key, value = %v, "Using configured value"),
        None => info!(setting = key, "Not set"),
    }
    value
}

fn numeric_setting(value: Option<String>, key: &str, default: i32) -> Result<i32> {
    match value {
        Some(raw) => {
            info!(setting = key, value = %raw, "Using configured value");
            raw.parse::<i32>().map_err(|e| {
                OperatorError::config_error(format!("{} is not a number ({}): {}", key, raw, e))
            })
        }
        None => {
            info!(setting = key, default, "Not set, using default");
            Ok(default)
        }
    }
}

/// Splits a comma-separated setting, dropping blank items.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `key=value,key2=value2`. A bare `key` maps to an empty value.
pub fn parse_env_map(value: &str) -> BTreeMap<String, String> {
    parse_list(value)
        .into_iter()
        .filter_map(|pair| {
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (pair.as_str(), ""),
            };
            if key.is_empty() {
                None
            } else {
                Some((key.to_string(), value.to_string()))
            }
        })
        .collect()
}
