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

use crate::domain::application::crd::{SpringBootApplication, SpringBootApplicationStatus};
use crate::infrastructure::constants::CONTROLLER_NAME;
use crate::shared::error::{OperatorError, Result};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// The narrow slice of the API server the reconciler needs.
///
/// Reads return `None` for missing objects. Writes carry the object's
/// `resourceVersion`, so a stale replace fails with `OperatorError::Conflict`.
#[async_trait::async_trait]
pub trait SpringBootKubeClient: Send + Sync {
    async fn get_application(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SpringBootApplication>>;

    async fn patch_application_status(
        &self,
        namespace: &str,
        name: &str,
        status: &SpringBootApplicationStatus,
    ) -> Result<()>;

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>>;

    async fn create_service(&self, service: &Service) -> Result<Service>;

    async fn replace_service(&self, service: &Service) -> Result<Service>;

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Option<Deployment>>;

    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment>;

    async fn replace_deployment(&self, deployment: &Deployment) -> Result<Deployment>;
}

pub struct SpringBootKubeClientImpl {
    client: Client,
}

impl SpringBootKubeClientImpl {
    pub async fn new() -> Result<Self> {
        let client = Client::try_default().await.map_err(|e| {
            OperatorError::Kube(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn get_client(&self) -> Client {
        self.client.clone()
    }

    pub async fn new_with_config(
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        // Nothing to select from: fall back to in-cluster / default discovery.
        if kubeconfig_path.is_none() && context.is_none() {
            return Self::new().await;
        }

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path)
                .map_err(|e| OperatorError::Kube(format!("Failed to load kubeconfig: {}", e)))?
        } else {
            Kubeconfig::read()
                .map_err(|e| OperatorError::Kube(format!("Failed to load kubeconfig: {}", e)))?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                OperatorError::Kube(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            OperatorError::Kube(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client })
    }

    fn write_params() -> PostParams {
        PostParams {
            field_manager: Some(CONTROLLER_NAME.to_string()),
            ..Default::default()
        }
    }

    async fn get_namespaced<K>(&self, namespace: &str, name: &str) -> Result<Option<K>>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await.map_err(OperatorError::from)
    }

    async fn create_namespaced<K>(&self, object: &K) -> Result<K>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Serialize
            + DeserializeOwned
            + Debug,
    {
        let (namespace, name) = object_key(object)?;
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        api.create(&Self::write_params(), object)
            .await
            .map_err(|e| write_error::<K>(e, &name, &namespace))
    }

    async fn replace_namespaced<K>(&self, object: &K) -> Result<K>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Serialize
            + DeserializeOwned
            + Debug,
    {
        let (namespace, name) = object_key(object)?;
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        api.replace(&name, &Self::write_params(), object)
            .await
            .map_err(|e| write_error::<K>(e, &name, &namespace))
    }
}

fn object_key<K: Resource<DynamicType = ()>>(object: &K) -> Result<(String, String)> {
    let meta = object.meta();
    let name = meta
        .name
        .clone()
        .ok_or_else(|| OperatorError::InvalidResource(format!("{} name is required", K::kind(&()))))?;
    let namespace = meta.namespace.clone().ok_or_else(|| {
        OperatorError::InvalidResource(format!("{} '{}' has no namespace", K::kind(&()), name))
    })?;
    Ok((namespace, name))
}

/// 409 means the object changed (or appeared) since it was read.
fn write_error<K: Resource<DynamicType = ()>>(
    err: kube::Error,
    name: &str,
    namespace: &str,
) -> OperatorError {
    match err {
        kube::Error::Api(ae) if ae.code == 409 => {
            OperatorError::conflict(K::kind(&()), name, namespace, ae.message)
        }
        other => OperatorError::from(other),
    }
}

#[async_trait::async_trait]
impl SpringBootKubeClient for SpringBootKubeClientImpl {
    async fn get_application(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SpringBootApplication>> {
        self.get_namespaced(namespace, name).await
    }

    async fn patch_application_status(
        &self,
        namespace: &str,
        name: &str,
        status: &SpringBootApplicationStatus,
    ) -> Result<()> {
        let api: Api<SpringBootApplication> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        self.get_namespaced(namespace, name).await
    }

    async fn create_service(&self, service: &Service) -> Result<Service> {
        self.create_namespaced(service).await
    }

    async fn replace_service(&self, service: &Service) -> Result<Service> {
        self.replace_namespaced(service).await
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Option<Deployment>> {
        self.get_namespaced(namespace, name).await
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment> {
        self.create_namespaced(deployment).await
    }

    async fn replace_deployment(&self, deployment: &Deployment) -> Result<Deployment> {
        self.replace_namespaced(deployment).await
    }
}
