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

//! Environment variables for the application container.

use crate::domain::application::crd::EnvVarSpec;
use k8s_openapi::api::core::v1::EnvVar;

#[derive(Default)]
pub struct EnvironmentBuilder {
    vars: Vec<EnvVarSpec>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars(mut self, vars: &[EnvVarSpec]) -> Self {
        self.vars.extend_from_slice(vars);
        self
    }

    /// Keeps declaration order. `None` when there is nothing to set.
    pub fn build(self) -> Option<Vec<EnvVar>> {
        if self.vars.is_empty() {
            return None;
        }

        Some(
            self.vars
                .into_iter()
                .map(|var| EnvVar {
                    name: var.name,
                    value: Some(var.value),
                    ..Default::default()
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_environment_is_omitted() {
        assert_eq!(EnvironmentBuilder::new().with_vars(&[]).build(), None);
    }

    #[test]
    fn bare_names_get_an_empty_value() {
        let env = EnvironmentBuilder::new()
            .with_vars(&[EnvVarSpec::new("DEBUG", ""), EnvVarSpec::new("A", "1")])
            .build()
            .unwrap();
        assert_eq!(env[0].name, "DEBUG");
        assert_eq!(env[0].value.as_deref(), Some(""));
        assert_eq!(env[1].name, "A");
    }
}
