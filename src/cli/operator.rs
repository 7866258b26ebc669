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

//! Operator commands

use crate::domain::application::crd::{AppIdentity, SpringBootApplication};
use crate::domain::application::manifest::load_application_from_file;
use crate::domain::application::resolver::resolve;
use crate::domain::config::OperatorConfig;
use crate::infrastructure::kubernetes::resources::synthesize;
use crate::infrastructure::kubernetes::{run_controller, SpringBootKubeClientImpl};
use clap::Parser;
use kube::{CustomResourceExt, ResourceExt};
use std::sync::Arc;

const DEFAULT_NAMESPACE: &str = "default";

#[derive(Parser, Debug, Clone)]
pub struct RunCommand {
    /// Only watch this namespace (default: all namespaces)
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Kubeconfig file path
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context
    #[arg(long)]
    pub context: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CrdCommand {}

#[derive(Parser, Debug, Clone)]
pub struct RenderCommand {
    /// SpringBootApplication manifest (YAML)
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: String,

    /// Namespace to render into (default: the manifest's, then "default")
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,
}

impl RunCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let config = OperatorConfig::initialize()?;

        let client =
            SpringBootKubeClientImpl::new_with_config(self.kubeconfig.clone(), self.context.clone())
                .await?;

        run_controller(
            client.get_client(),
            Arc::new(config.clone()),
            self.namespace.clone(),
        )
        .await?;
        Ok(())
    }
}

impl CrdCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        print!("{}", render_crd()?);
        Ok(())
    }
}

impl RenderCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let config = OperatorConfig::from_env()?;
        let app = load_application_from_file(&self.file)?;
        print!("{}", self.render(&app, &config)?);
        Ok(())
    }

    /// Multi-document YAML with the Service first, as it is applied.
    pub fn render(&self, app: &SpringBootApplication, config: &OperatorConfig) -> anyhow::Result<String> {
        let namespace = self
            .namespace
            .clone()
            .or_else(|| app.namespace())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let identity = AppIdentity::new(namespace, app.name_any());

        let resolved = resolve(&app.spec.spring_boot, config, &identity.name)?;
        let children = synthesize(&resolved, &identity);

        Ok(format!(
            "---\n{}---\n{}",
            serde_yaml::to_string(&children.service)?,
            serde_yaml::to_string(&children.deployment)?
        ))
    }
}

pub fn render_crd() -> anyhow::Result<String> {
    Ok(serde_yaml::to_string(&SpringBootApplication::crd())?)
}
