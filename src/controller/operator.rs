//! # Workflow Operator
//!
//! Hook through which workflow notifications leave the control loop. Driving a
//! workflow forward (creating pods for the next steps) lives behind this trait.

use crate::config::WorkflowControllerConfig;
use crate::crd::Workflow;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Drives a workflow forward after it changes
///
/// Called from the control loop, one workflow at a time, with the
/// configuration that was active when the notification was taken.
#[async_trait]
pub trait WorkflowOperator: Send + Sync {
    async fn operate_workflow(&self, workflow: Workflow, config: Arc<WorkflowControllerConfig>);
}

/// Operator that only records the workflows it is handed
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingOperator;

#[async_trait]
impl WorkflowOperator for LoggingOperator {
    async fn operate_workflow(&self, workflow: Workflow, config: Arc<WorkflowControllerConfig>) {
        let nodes = workflow.status.as_ref().map_or(0, |s| s.nodes.len());
        info!(
            workflow.name = workflow.metadata.name.as_deref().unwrap_or_default(),
            nodes,
            executor_image = %config.executor_image,
            "operating workflow"
        );
    }
}
