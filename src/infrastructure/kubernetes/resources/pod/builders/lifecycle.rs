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

use crate::infrastructure::constants::SCHEME_HTTP;
use k8s_openapi::api::core::v1::{HTTPGetAction, Lifecycle, LifecycleHandler};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

pub struct LifecycleBuilder;

impl LifecycleBuilder {
    /// preStop hook calling the application's shutdown endpoint so it can drain
    /// before the container is stopped.
    pub fn build_graceful_shutdown(shutdown_path: &str, port: i32) -> Lifecycle {
        Lifecycle {
            pre_stop: Some(LifecycleHandler {
                http_get: Some(HTTPGetAction {
                    path: Some(shutdown_path.to_string()),
                    port: IntOrString::Int(port),
                    scheme: Some(SCHEME_HTTP.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
