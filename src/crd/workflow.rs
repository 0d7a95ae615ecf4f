//! # Workflow
//!
//! The `Workflow` custom resource. The controller only reads and mutates
//! `status.nodes`; `spec` belongs to users and the workflow operator.

use crate::crd::{NodeStatus, Template};
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Workflow Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: argoproj.io/v1alpha1
/// kind: Workflow
/// metadata:
///   name: hello-world
/// spec:
///   entrypoint: whalesay
///   templates:
///     - name: whalesay
///       container:
///         image: docker/whalesay
/// ```
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Workflow",
    group = "argoproj.io",
    version = "v1alpha1",
    namespaced,
    status = "WorkflowStatus",
    shortname = "wf",
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSpec {
    /// Name of the template the workflow starts from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    /// Step templates referenced by the workflow
    #[serde(default)]
    #[schemars(schema_with = "preserve_unknown_templates")]
    pub templates: Vec<Template>,
}

/// Templates carry far more than the fields modelled here; keep them intact
fn preserve_unknown_templates(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "array",
        "items": {
            "type": "object",
            "x-kubernetes-preserve-unknown-fields": true
        }
    })
}

/// Recorded progress of a workflow
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    /// Node status keyed by node id (the name of the pod running the step)
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeStatus>,
}

impl Workflow {
    /// Look up the recorded status of a node
    pub fn node(&self, node_id: &str) -> Option<&NodeStatus> {
        self.status.as_ref().and_then(|s| s.nodes.get(node_id))
    }

    /// Store a node status, creating the status block if needed
    pub fn set_node(&mut self, node_id: &str, node: NodeStatus) {
        self.status
            .get_or_insert_with(WorkflowStatus::default)
            .nodes
            .insert(node_id.to_string(), node);
    }
}
