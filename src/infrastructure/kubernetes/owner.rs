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

//! Controller ownership linkage between an application and its children.

use crate::domain::application::crd::SpringBootApplication;
use crate::shared::error::{OperatorError, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};

/// Controller reference pointing at `app`; needs the uid the API server assigned.
pub fn controller_owner_reference(app: &SpringBootApplication) -> Result<OwnerReference> {
    app.controller_owner_ref(&()).ok_or_else(|| {
        OperatorError::OwnerReference(format!(
            "SpringBootApplication '{}' has no uid yet",
            app.name_any()
        ))
    })
}

/// Marks `owner` as the managing controller of the object described by `meta`.
///
/// A reference to the same owner is replaced in place, other non-controller
/// references are left alone. Fails when a different controller already owns
/// the object, since an object can have only one.
pub fn set_controller_reference(owner: &OwnerReference, meta: &mut ObjectMeta) -> Result<()> {
    if owner.uid.is_empty() || owner.name.is_empty() {
        return Err(OperatorError::OwnerReference(format!(
            "owner {} has no name or uid",
            owner.kind
        )));
    }

    let mut owner = owner.clone();
    owner.controller = Some(true);
    owner.block_owner_deletion = Some(true);

    let references = meta.owner_references.get_or_insert_with(Vec::new);
    if let Some(other) = references
        .iter()
        .find(|r| r.controller == Some(true) && !refers_to_same_object(r, &owner))
    {
        return Err(OperatorError::OwnerReference(format!(
            "{} is already controlled by {} '{}'",
            meta.name.as_deref().unwrap_or_default(),
            other.kind,
            other.name
        )));
    }

    match references
        .iter_mut()
        .find(|r| refers_to_same_object(r, &owner))
    {
        Some(existing) => *existing = owner,
        None => references.push(owner),
    }
    Ok(())
}

/// Owner identity is group + kind + name; the version part of apiVersion may differ.
fn refers_to_same_object(a: &OwnerReference, b: &OwnerReference) -> bool {
    api_group(&a.api_version) == api_group(&b.api_version) && a.kind == b.kind && a.name == b.name
}

fn api_group(api_version: &str) -> &str {
    api_version
        .split_once('/')
        .map(|(group, _)| group)
        .unwrap_or_default()
}
