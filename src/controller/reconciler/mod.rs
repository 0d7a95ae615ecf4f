//! # Pod Reconciler
//!
//! Folds pod lifecycle changes into the node statuses of the owning workflow.
//!
//! ## Reconciliation Flow
//!
//! 1. Drop pods without the workflow label
//! 2. Decide the candidate node status from the pod alone (`transition`)
//! 3. Fetch the workflow named by the label and find the node named after the pod
//! 4. Diff and apply the candidate (`apply`)
//! 5. Write the workflow status back if the node changed
//!
//! Failures are reported to the caller and never retried here; the next watch
//! notification for the pod, or the watch's periodic relist, runs the
//! reconciliation again against fresh state.

pub mod apply;
pub mod transition;

pub use apply::apply_updates;
pub use transition::{step_transition, PodPhase, SkipReason, StepTransition};

use crate::constants::LABEL_KEY_WORKFLOW;
use crate::crd::Workflow;
use crate::observability::metrics;
use crate::store::{ResourceStore, StoreError};
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("workflow '{workflow}' for pod '{pod}' not found")]
    WorkflowNotFound { pod: String, workflow: String },
    #[error("workflow '{workflow}' has no node for pod '{pod}'")]
    NodeNotFound { pod: String, workflow: String },
    #[error("failed to fetch workflow '{workflow}': {source}")]
    Lookup {
        workflow: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to update workflow '{workflow}': {source}")]
    Persist {
        workflow: String,
        #[source]
        source: StoreError,
    },
}

impl ReconcilerError {
    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::WorkflowNotFound { .. } => "workflow_not_found",
            Self::NodeNotFound { .. } => "node_not_found",
            Self::Lookup { .. } => "lookup",
            Self::Persist { source, .. } if source.is_conflict() => "conflict",
            Self::Persist { .. } => "persist",
        }
    }
}

/// Result of a successful reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Decided from the pod alone; the workflow was not read
    Skipped(SkipReason),
    /// The node already reflected the pod
    Unchanged,
    /// The node changed and the workflow was written back
    Updated,
}

/// Applies pod notifications to workflow node statuses
pub struct PodReconciler {
    workflows: Arc<dyn ResourceStore<Workflow>>,
}

impl std::fmt::Debug for PodReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodReconciler").finish_non_exhaustive()
    }
}

impl PodReconciler {
    pub fn new(workflows: Arc<dyn ResourceStore<Workflow>>) -> Self {
        Self { workflows }
    }

    /// Reconcile one pod notification, recording metrics for the outcome
    pub async fn handle_pod_update(&self, pod: &Pod) -> Result<ReconcileOutcome, ReconcilerError> {
        let pod_name = pod.metadata.name.as_deref().unwrap_or_default();
        let span = info_span!("reconcile_pod", pod.name = pod_name);

        let start = Instant::now();
        let result = self.reconcile(pod).instrument(span).await;
        metrics::observe_reconcile_duration(start.elapsed().as_secs_f64());

        match &result {
            Ok(ReconcileOutcome::Skipped(reason)) => {
                metrics::increment_reconcile_skips(reason.as_str());
            }
            Ok(ReconcileOutcome::Updated) => metrics::increment_node_updates(),
            Ok(ReconcileOutcome::Unchanged) => {}
            Err(e) => metrics::increment_reconcile_errors(e.reason()),
        }
        result
    }

    async fn reconcile(&self, pod: &Pod) -> Result<ReconcileOutcome, ReconcilerError> {
        let Some(workflow_name) = pod
            .metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(LABEL_KEY_WORKFLOW))
        else {
            debug!("pod has no workflow label, ignoring");
            return Ok(ReconcileOutcome::Skipped(SkipReason::NotWorkflowPod));
        };

        let (status, daemoned) = match step_transition(pod) {
            StepTransition::Skip(reason) => {
                debug!(reason = reason.as_str(), "no node change possible");
                return Ok(ReconcileOutcome::Skipped(reason));
            }
            StepTransition::Candidate { status, daemoned } => (status, daemoned),
        };

        let pod_name = pod.metadata.name.clone().unwrap_or_default();
        let mut workflow = match self.workflows.get(workflow_name).await {
            Ok(wf) => wf,
            Err(e) if e.is_not_found() => {
                return Err(ReconcilerError::WorkflowNotFound {
                    pod: pod_name,
                    workflow: workflow_name.clone(),
                });
            }
            Err(source) => {
                return Err(ReconcilerError::Lookup {
                    workflow: workflow_name.clone(),
                    source,
                });
            }
        };

        let Some(mut node) = workflow.node(&pod_name).cloned() else {
            return Err(ReconcilerError::NodeNotFound {
                pod: pod_name,
                workflow: workflow_name.clone(),
            });
        };

        if !apply_updates(pod, &mut node, status, daemoned) {
            debug!(workflow.name = %workflow_name, "node already up to date");
            return Ok(ReconcileOutcome::Unchanged);
        }

        workflow.set_node(&pod_name, node);
        self.workflows
            .replace_status(&workflow)
            .await
            .map_err(|source| ReconcilerError::Persist {
                workflow: workflow_name.clone(),
                source,
            })?;

        info!(workflow.name = %workflow_name, "updated workflow node status");
        Ok(ReconcileOutcome::Updated)
    }
}
