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

use crate::infrastructure::constants::{
    PROBE_FAILURE_THRESHOLD, PROBE_PERIOD_SECONDS, PROBE_SUCCESS_THRESHOLD, PROBE_TIMEOUT_SECONDS,
    SCHEME_HTTP,
};
use k8s_openapi::api::core::v1::{HTTPGetAction, Probe};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

pub struct ProbeBuilder;

impl ProbeBuilder {
    pub fn http_get(path: &str, port: i32) -> Probe {
        Probe {
            http_get: Some(HTTPGetAction {
                path: Some(path.to_string()),
                port: IntOrString::Int(port),
                scheme: Some(SCHEME_HTTP.to_string()),
                ..Default::default()
            }),
            timeout_seconds: Some(PROBE_TIMEOUT_SECONDS),
            period_seconds: Some(PROBE_PERIOD_SECONDS),
            success_threshold: Some(PROBE_SUCCESS_THRESHOLD),
            failure_threshold: Some(PROBE_FAILURE_THRESHOLD),
            ..Default::default()
        }
    }
}
