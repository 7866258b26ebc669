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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, OperatorError>;

#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Kubernetes API error: {0}")]
    Kube(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid SpringBootApplication '{name}': {reason}")]
    ResolveError { name: String, reason: String },

    #[error("Conflict writing {resource_type} '{name}' in namespace '{namespace}': {message}")]
    Conflict {
        resource_type: String,
        name: String,
        namespace: String,
        message: String,
    },

    #[error("Owner reference error: {0}")]
    OwnerReference(String),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::Error> for OperatorError {
    fn from(err: kube::Error) -> Self {
        OperatorError::Kube(err.to_string())
    }
}

impl OperatorError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn resolve_error(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResolveError {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn conflict(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            resource_type: resource_type.into(),
            name: name.into(),
            namespace: namespace.into(),
            message: message.into(),
        }
    }

    /// Errors the trigger substrate should requeue rather than wait for the next change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Kube(_))
    }
}
