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

use crate::infrastructure::constants::LABEL_APP;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Shared naming and labelling for the children of one application.
pub trait LabeledResourceBuilder {
    fn app_name(&self) -> &str;

    fn namespace(&self) -> &str;

    fn get_labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert(LABEL_APP.to_string(), self.app_name().to_string());
        labels
    }

    /// Service selector and Deployment match labels. Must never change once created.
    fn get_selector_labels(&self) -> BTreeMap<String, String> {
        self.get_labels()
    }

    /// Owner references are attached later, once the owner's uid is known.
    fn build_metadata(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.app_name().to_string()),
            namespace: Some(self.namespace().to_string()),
            labels: Some(self.get_labels()),
            ..Default::default()
        }
    }
}
