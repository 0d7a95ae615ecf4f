//! # Node Status
//!
//! Per-step status recorded in `status.nodes` of a workflow.

use crate::crd::Outputs;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a workflow node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, schemars::JsonSchema)]
pub enum NodePhase {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Error,
}

impl NodePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Error => "Error",
        }
    }

    /// Whether the node has finished, successfully or not
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Error)
    }
}

impl fmt::Display for NodePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single workflow node
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// Node id, equal to the name of the pod running the step
    pub id: String,
    /// Human readable node name
    pub name: String,
    /// Current status of the node
    #[serde(default)]
    pub status: NodePhase,
    /// IP of the pod running the step, empty if unknown
    #[serde(default, rename = "podIP", skip_serializing_if = "String::is_empty")]
    pub pod_ip: String,
    /// Set to `true` once a daemon step is ready. Unset and `false` both mean
    /// "not daemoned"; the controller only ever writes `Some(true)` or `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemoned: Option<bool>,
    /// Outputs produced by the step. Written once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Outputs>,
}

impl NodeStatus {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the node is currently marked as daemoned
    pub fn is_daemoned(&self) -> bool {
        self.daemoned.unwrap_or(false)
    }
}
