//! # Control Loop
//!
//! Single consumer of the watch bridge. Takes one notification at a time,
//! from whichever channel is ready, and handles it to completion before
//! taking the next:
//!
//! - workflows go to the `WorkflowOperator` with the current configuration
//! - pods go to the `PodReconciler`
//!
//! When both channels have an item waiting the pick is random. Failures are
//! logged and the loop moves on. Cancellation is observed between items; the
//! item being handled is finished first, anything still queued is left behind.

use crate::config::{current_config, SharedControllerConfig};
use crate::controller::bridge::EventChannels;
use crate::controller::operator::WorkflowOperator;
use crate::controller::reconciler::{PodReconciler, ReconcileOutcome, ReconcilerError};
use crate::crd::Workflow;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

enum Notification {
    Workflow(Workflow),
    Pod(Pod),
}

/// Dispatches bridge notifications to the operator and the pod reconciler
pub struct ControlLoop {
    operator: Arc<dyn WorkflowOperator>,
    reconciler: PodReconciler,
    config: SharedControllerConfig,
}

impl std::fmt::Debug for ControlLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

impl ControlLoop {
    pub fn new(
        operator: Arc<dyn WorkflowOperator>,
        reconciler: PodReconciler,
        config: SharedControllerConfig,
    ) -> Self {
        Self {
            operator,
            reconciler,
            config,
        }
    }

    /// Run until `cancel` fires or both channels are closed
    pub async fn run(&self, mut channels: EventChannels, cancel: CancellationToken) {
        let mut workflows_open = true;
        let mut pods_open = true;

        info!("control loop started");
        while workflows_open || pods_open {
            if cancel.is_cancelled() {
                break;
            }

            let notification = tokio::select! {
                () = cancel.cancelled() => break,
                received = channels.workflows.recv(), if workflows_open => match received {
                    Some(wf) => Notification::Workflow(wf),
                    None => {
                        warn!("workflow channel closed");
                        workflows_open = false;
                        continue;
                    }
                },
                received = channels.pods.recv(), if pods_open => match received {
                    Some(pod) => Notification::Pod(pod),
                    None => {
                        warn!("pod channel closed");
                        pods_open = false;
                        continue;
                    }
                },
            };

            match notification {
                Notification::Workflow(wf) => self.handle_workflow(wf).await,
                Notification::Pod(pod) => self.handle_pod(&pod).await,
            }
        }
        info!("control loop stopped");
    }

    async fn handle_workflow(&self, wf: Workflow) {
        debug!(workflow.name = %wf.name_any(), "workflow notification");
        let config = current_config(&self.config).await;
        self.operator.operate_workflow(wf, config).await;
    }

    async fn handle_pod(&self, pod: &Pod) {
        match self.reconciler.handle_pod_update(pod).await {
            Ok(ReconcileOutcome::Updated) => {}
            Ok(outcome) => debug!(pod.name = %pod.name_any(), ?outcome, "pod reconciled"),
            Err(e @ ReconcilerError::Persist { .. }) => {
                error!(pod.name = %pod.name_any(), error = %e, "failed to persist node status");
            }
            Err(e) => warn!(pod.name = %pod.name_any(), error = %e, "pod reconciliation failed"),
        }
    }
}
