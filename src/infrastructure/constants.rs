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

/// Field manager / controller name used for logs and writes
pub const CONTROLLER_NAME: &str = "springboot-operator";

/// Resource labels
pub const LABEL_APP: &str = "k8s-app";

/// Affinity
pub const TOPOLOGY_KEY_HOSTNAME: &str = "kubernetes.io/hostname";
pub const ANTI_AFFINITY_WEIGHT: i32 = 1;
pub const LABEL_SELECTOR_OPERATOR_IN: &str = "In";

/// Node selector operators accepted by the scheduler
pub const NODE_SELECTOR_OPERATORS: &[&str] = &["In", "NotIn", "Exists", "DoesNotExist", "Gt", "Lt"];
pub const DEFAULT_NODE_SELECTOR_OPERATOR: &str = "In";

/// Container settings
pub const IMAGE_PULL_POLICY_IF_NOT_PRESENT: &str = "IfNotPresent";

/// Resource names
pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";

/// Deployment strategy
pub const STRATEGY_TYPE_ROLLING_UPDATE: &str = "RollingUpdate";
pub const REVISION_HISTORY_LIMIT: i32 = 10;

/// Values the API server fills in when omitted. Rendering them keeps the
/// desired Deployment equal to what a read returns.
pub const TERMINATION_MESSAGE_PATH: &str = "/dev/termination-log";
pub const TERMINATION_MESSAGE_POLICY_FILE: &str = "File";
pub const PROTOCOL_TCP: &str = "TCP";
pub const SCHEME_HTTP: &str = "HTTP";
pub const PROBE_TIMEOUT_SECONDS: i32 = 1;
pub const PROBE_PERIOD_SECONDS: i32 = 10;
pub const PROBE_SUCCESS_THRESHOLD: i32 = 1;
pub const PROBE_FAILURE_THRESHOLD: i32 = 3;
pub const RESTART_POLICY_ALWAYS: &str = "Always";
pub const DNS_POLICY_CLUSTER_FIRST: &str = "ClusterFirst";
pub const DEFAULT_SCHEDULER_NAME: &str = "default-scheduler";
pub const TERMINATION_GRACE_PERIOD_SECONDS: i64 = 30;

/// Host log volume
pub const VOLUME_NAME_APP_LOG: &str = "applogpath";
pub const VOLUME_TYPE_DIRECTORY_OR_CREATE: &str = "DirectoryOrCreate";

/// Status condition
pub const CONDITION_READY: &str = "Ready";
pub const REASON_RECONCILED: &str = "Reconciled";
pub const REASON_INVALID_SPEC: &str = "InvalidSpec";
pub const REASON_SERVICE_FAILED: &str = "ServiceFailed";
pub const REASON_DEPLOYMENT_FAILED: &str = "DeploymentFailed";

/// Controller requeue delay for retryable errors (seconds)
pub const RETRY_REQUEUE_SECS: u64 = 15;

/// Conflict retry inside create-or-update
pub const CONFLICT_RETRY_MAX_TIMES: usize = 3;
pub const CONFLICT_RETRY_MIN_DELAY_MS: u64 = 50;
pub const CONFLICT_RETRY_MAX_DELAY_MS: u64 = 1000;
