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

//! Pod scheduling rules: spread replicas across hosts, optionally pin to nodes.

use crate::domain::application::crd::NodeAffinitySpec;
use crate::infrastructure::constants::{
    ANTI_AFFINITY_WEIGHT, LABEL_APP, LABEL_SELECTOR_OPERATOR_IN, TOPOLOGY_KEY_HOSTNAME,
};
use k8s_openapi::api::core::v1::{
    Affinity, NodeAffinity, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm,
    PodAffinityTerm, PodAntiAffinity, WeightedPodAffinityTerm,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};

pub struct AffinityBuilder<'a> {
    app_name: &'a str,
    node_affinity: Option<&'a NodeAffinitySpec>,
}

impl<'a> AffinityBuilder<'a> {
    pub fn new(app_name: &'a str) -> Self {
        Self {
            app_name,
            node_affinity: None,
        }
    }

    pub fn with_node_affinity(mut self, node_affinity: Option<&'a NodeAffinitySpec>) -> Self {
        self.node_affinity = node_affinity;
        self
    }

    pub fn build(&self) -> Affinity {
        Affinity {
            pod_anti_affinity: Some(self.build_pod_anti_affinity()),
            node_affinity: self.build_node_affinity(),
            ..Default::default()
        }
    }

    /// Soft preference: the scheduler may still co-locate replicas when it has to.
    fn build_pod_anti_affinity(&self) -> PodAntiAffinity {
        PodAntiAffinity {
            preferred_during_scheduling_ignored_during_execution: Some(vec![
                WeightedPodAffinityTerm {
                    weight: ANTI_AFFINITY_WEIGHT,
                    pod_affinity_term: PodAffinityTerm {
                        label_selector: Some(LabelSelector {
                            match_expressions: Some(vec![LabelSelectorRequirement {
                                key: LABEL_APP.to_string(),
                                operator: LABEL_SELECTOR_OPERATOR_IN.to_string(),
                                values: Some(vec![self.app_name.to_string()]),
                            }]),
                            ..Default::default()
                        }),
                        topology_key: TOPOLOGY_KEY_HOSTNAME.to_string(),
                        ..Default::default()
                    },
                },
            ]),
            ..Default::default()
        }
    }

    /// Hard requirement, only when a node affinity key was resolved.
    fn build_node_affinity(&self) -> Option<NodeAffinity> {
        let spec = self.node_affinity.filter(|spec| !spec.key.is_empty())?;

        Some(NodeAffinity {
            required_during_scheduling_ignored_during_execution: Some(NodeSelector {
                node_selector_terms: vec![NodeSelectorTerm {
                    match_expressions: Some(vec![NodeSelectorRequirement {
                        key: spec.key.clone(),
                        operator: spec.operator.clone(),
                        values: if spec.values.is_empty() {
                            None
                        } else {
                            Some(spec.values.clone())
                        },
                    }]),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        })
    }
}
