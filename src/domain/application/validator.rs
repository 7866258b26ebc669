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

//! Checks applied while resolving a SpringBootApplication, so that malformed
//! values are rejected before any child resource is written.

use crate::infrastructure::constants::NODE_SELECTOR_OPERATORS;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Kubernetes quantity: a non-negative decimal with an optional binary-SI,
/// decimal-SI or exponent suffix.
static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?(?:\d+(?:\.\d*)?|\.\d+)(?:Ki|Mi|Gi|Ti|Pi|Ei|n|u|m|k|M|G|T|P|E|[eE][+-]?\d+)?$")
        .expect("quantity pattern is valid")
});

pub fn validate_quantity(field: &str, value: &str) -> Result<(), String> {
    if QUANTITY_RE.is_match(value) {
        Ok(())
    } else {
        Err(format!(
            "invalid {} '{}': expected a quantity such as 500m, 2, 512Mi or 2Gi",
            field, value
        ))
    }
}

pub fn validate_port(port: i32) -> Result<(), String> {
    if (1..=65535).contains(&port) {
        Ok(())
    } else {
        Err(format!("port {} is outside 1-65535", port))
    }
}

pub fn validate_replicas(replicas: i32) -> Result<(), String> {
    if replicas < 0 {
        Err(format!("replicas must not be negative, got {}", replicas))
    } else {
        Ok(())
    }
}

pub fn validate_host_path(path: &str) -> Result<(), String> {
    if Path::new(path).is_absolute() {
        Ok(())
    } else {
        Err(format!("host log path '{}' must be absolute", path))
    }
}

/// Mirrors the API server's NodeSelectorRequirement validation.
pub fn validate_node_affinity(key: &str, operator: &str, values: &[String]) -> Result<(), String> {
    if key.is_empty() {
        return Err("node affinity key must not be empty".to_string());
    }
    if !NODE_SELECTOR_OPERATORS.contains(&operator) {
        return Err(format!(
            "unsupported node affinity operator '{}', expected one of {}",
            operator,
            NODE_SELECTOR_OPERATORS.join(", ")
        ));
    }

    match operator {
        "In" | "NotIn" if values.is_empty() => Err(format!(
            "node affinity operator '{}' requires at least one value",
            operator
        )),
        "Exists" | "DoesNotExist" if !values.is_empty() => Err(format!(
            "node affinity operator '{}' must not have values",
            operator
        )),
        "Gt" | "Lt" => {
            if values.len() != 1 || values[0].parse::<i64>().is_err() {
                Err(format!(
                    "node affinity operator '{}' requires exactly one integer value",
                    operator
                ))
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_quantities() {
        for q in ["50m", "1", "0.5", "2Gi", "512Mi", "1e3", "100k", ".5", "+1"] {
            assert!(validate_quantity("cpu request", q).is_ok(), "{}", q);
        }
    }

    #[test]
    fn rejects_malformed_quantities() {
        for q in ["", "lots", "2GB", "-1", "1.2.3", "Gi", "2 Gi"] {
            assert!(validate_quantity("memory limit", q).is_err(), "{}", q);
        }
    }

    #[test]
    fn node_affinity_operator_rules() {
        let vals = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(validate_node_affinity("zone", "In", &vals(&["a", "b"])).is_ok());
        assert!(validate_node_affinity("zone", "In", &[]).is_err());
        assert!(validate_node_affinity("zone", "Exists", &[]).is_ok());
        assert!(validate_node_affinity("zone", "Exists", &vals(&["a"])).is_err());
        assert!(validate_node_affinity("cores", "Gt", &vals(&["4"])).is_ok());
        assert!(validate_node_affinity("cores", "Gt", &vals(&["four"])).is_err());
        assert!(validate_node_affinity("zone", "Near", &vals(&["a"])).is_err());
        assert!(validate_node_affinity("", "In", &vals(&["a"])).is_err());
    }

    #[test]
    fn ports_and_paths() {
        assert!(validate_port(8080).is_ok());
        assert!(validate_port(0).is_err());
        assert!(validate_port(65536).is_err());
        assert!(validate_host_path("/var/applog").is_ok());
        assert!(validate_host_path("var/applog").is_err());
        assert!(validate_replicas(0).is_ok());
        assert!(validate_replicas(-2).is_err());
    }
}
