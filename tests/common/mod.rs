//! Shared fixtures for integration tests
//!
//! Builders for workflow pods and workflows with a single node, plus a store
//! preloaded with such a workflow.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use k8s_openapi::api::core::v1::{ContainerStatus, Pod, PodStatus};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;
use workflow_controller::constants::{
    ANNOTATION_KEY_OUTPUTS, ANNOTATION_KEY_TEMPLATE, LABEL_KEY_WORKFLOW,
};
use workflow_controller::crd::{NodePhase, NodeStatus, Workflow, WorkflowSpec};
use workflow_controller::store::MemoryStore;

pub const WORKFLOW: &str = "hello-world";
pub const POD: &str = "hello-world-1234";
pub const POD_IP: &str = "10.1.2.3";

pub const DAEMON_TEMPLATE: &str = r#"{"name":"nginx","daemon":true,"container":{"image":"nginx"}}"#;
pub const PLAIN_TEMPLATE: &str = r#"{"name":"whalesay","container":{"image":"docker/whalesay"}}"#;

/// Builder for a pod belonging to `WORKFLOW`
#[derive(Debug, Clone)]
pub struct PodBuilder {
    pod: Pod,
}

impl PodBuilder {
    pub fn new(phase: &str) -> Self {
        Self {
            pod: Pod {
                metadata: ObjectMeta {
                    name: Some(POD.to_string()),
                    labels: Some(BTreeMap::from([(
                        LABEL_KEY_WORKFLOW.to_string(),
                        WORKFLOW.to_string(),
                    )])),
                    annotations: Some(BTreeMap::new()),
                    ..ObjectMeta::default()
                },
                status: Some(PodStatus {
                    phase: Some(phase.to_string()),
                    pod_ip: Some(POD_IP.to_string()),
                    ..PodStatus::default()
                }),
                ..Pod::default()
            },
        }
    }

    pub fn template(self, template: &str) -> Self {
        self.annotation(ANNOTATION_KEY_TEMPLATE, template)
    }

    pub fn outputs(self, outputs: &str) -> Self {
        self.annotation(ANNOTATION_KEY_OUTPUTS, outputs)
    }

    pub fn containers_ready(mut self, ready: &[bool]) -> Self {
        let statuses = ready
            .iter()
            .enumerate()
            .map(|(i, ready)| ContainerStatus {
                name: format!("main-{i}"),
                ready: *ready,
                ..ContainerStatus::default()
            })
            .collect();
        if let Some(status) = self.pod.status.as_mut() {
            status.container_statuses = Some(statuses);
        }
        self
    }

    pub fn without_workflow_label(mut self) -> Self {
        self.pod.metadata.labels = None;
        self
    }

    pub fn build(self) -> Pod {
        self.pod
    }

    fn annotation(mut self, key: &str, value: &str) -> Self {
        self.pod
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }
}

/// `WORKFLOW` with a single node for `POD`
pub fn workflow_with_node(node: NodeStatus) -> Workflow {
    let mut wf = Workflow::new(WORKFLOW, WorkflowSpec::default());
    wf.set_node(POD, node);
    wf
}

pub fn node(status: NodePhase) -> NodeStatus {
    NodeStatus {
        status,
        pod_ip: POD_IP.to_string(),
        ..NodeStatus::new(POD, "hello-world[0].step")
    }
}

/// Store holding `WORKFLOW` with the given node
pub fn store_with(node: NodeStatus) -> Arc<MemoryStore<Workflow>> {
    let store = Arc::new(MemoryStore::new());
    store.insert(workflow_with_node(node));
    store
}

/// The node for `POD` as currently stored
pub fn stored_node(store: &MemoryStore<Workflow>) -> NodeStatus {
    store
        .peek(WORKFLOW)
        .and_then(|wf| wf.node(POD).cloned())
        .expect("workflow node should be stored")
}
