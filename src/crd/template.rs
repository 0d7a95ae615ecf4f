//! # Template
//!
//! Step template. The workflow operator serializes the template of each step
//! into an annotation on the pod it creates; the reconciler only needs to know
//! whether the step is a daemon.

use serde::{Deserialize, Serialize};

/// Step template
///
/// Only the fields the controller acts on are modelled. Everything else
/// (container, inputs, outputs, ...) is kept verbatim in `rest` so templates
/// survive a read-modify-write of the workflow unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Template name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// A daemon step is complete once its pod is ready, rather than once it terminates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon: Option<bool>,
    #[serde(flatten)]
    #[schemars(skip)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl Template {
    pub fn is_daemon(&self) -> bool {
        self.daemon.unwrap_or(false)
    }
}
