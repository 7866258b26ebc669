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

use crate::domain::application::crd::SpringBootApplication;
use crate::shared::error::{OperatorError, Result};
use kube::core::TypeMeta;
use kube::Resource;
use std::path::PathBuf;

/// Reads a single SpringBootApplication manifest from disk.
pub fn load_application_from_file(file_path: &str) -> Result<SpringBootApplication> {
    let path = resolve_manifest_path(file_path)?;

    if !path.exists() {
        return Err(OperatorError::ConfigError(format!(
            "Manifest file does not exist: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        OperatorError::ConfigError(format!(
            "Failed to read manifest file {}: {}",
            path.display(),
            e
        ))
    })?;

    let types: TypeMeta = serde_yaml::from_str(&content).map_err(|e| {
        OperatorError::ConfigError(format!(
            "Failed to parse manifest file {}: {}",
            path.display(),
            e
        ))
    })?;

    let expected_kind = SpringBootApplication::kind(&());
    let expected_api_version = SpringBootApplication::api_version(&());
    if types.kind != expected_kind || types.api_version != expected_api_version {
        return Err(OperatorError::InvalidResource(format!(
            "{} contains {} ({}), expected {} ({})",
            path.display(),
            types.kind,
            types.api_version,
            expected_kind,
            expected_api_version
        )));
    }

    let app: SpringBootApplication = serde_yaml::from_str(&content).map_err(|e| {
        OperatorError::ConfigError(format!(
            "Failed to parse manifest file {}: {}",
            path.display(),
            e
        ))
    })?;

    if app.metadata.name.as_deref().unwrap_or_default().is_empty() {
        return Err(OperatorError::InvalidResource(format!(
            "{} is missing metadata.name",
            path.display()
        )));
    }

    Ok(app)
}

pub fn resolve_manifest_path(path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(path);

    if path.is_absolute() {
        Ok(path)
    } else {
        std::env::current_dir()
            .map_err(|e| OperatorError::ConfigError(format!("Cannot get current directory: {}", e)))?
            .join(path)
            .canonicalize()
            .map_err(|e| OperatorError::ConfigError(format!("Cannot resolve manifest path: {}", e)))
    }
}
