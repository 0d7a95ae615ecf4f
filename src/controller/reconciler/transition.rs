//! # Step Transitions
//!
//! Maps the lifecycle of a pod to the status its workflow node should have.
//!
//! | Pod phase | Result |
//! |---|---|
//! | Pending | skip |
//! | Succeeded | Succeeded, not daemoned |
//! | Failed | Failed, not daemoned |
//! | Running, template missing or unreadable | skip |
//! | Running, not a daemon | skip |
//! | Running, daemon, some container not ready | skip |
//! | Running, daemon, all containers ready | Succeeded, daemoned |
//! | anything else | Error, daemon flag untouched |
//!
//! Skips are decided from the pod alone, so they never cost a workflow lookup.

use crate::constants::ANNOTATION_KEY_TEMPLATE;
use crate::crd::{NodePhase, Template};
use k8s_openapi::api::core::v1::Pod;
use std::fmt;
use tracing::warn;

/// Pod phase as reported in `status.phase`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Any other value, including `Unknown` and an absent phase
    Other(String),
}

impl PodPhase {
    pub fn of(pod: &Pod) -> Self {
        let phase = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .unwrap_or_default();
        match phase {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Running => f.write_str("Running"),
            Self::Succeeded => f.write_str("Succeeded"),
            Self::Failed => f.write_str("Failed"),
            Self::Other(phase) if phase.is_empty() => f.write_str("<none>"),
            Self::Other(phase) => f.write_str(phase),
        }
    }
}

/// Why a pod notification required no workflow lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The pod does not carry the workflow label
    NotWorkflowPod,
    PodPending,
    TemplateMissing,
    TemplateUnreadable,
    /// Running, and not a daemon: nothing about the node can have changed
    NotDaemon,
    /// Daemon pod whose containers are not all ready yet
    DaemonNotReady,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotWorkflowPod => "not_workflow_pod",
            Self::PodPending => "pod_pending",
            Self::TemplateMissing => "template_missing",
            Self::TemplateUnreadable => "template_unreadable",
            Self::NotDaemon => "not_daemon",
            Self::DaemonNotReady => "daemon_not_ready",
        }
    }
}

/// What a pod notification means for its node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTransition {
    Skip(SkipReason),
    /// The node should have `status`; `daemoned` is `None` when the
    /// notification says nothing about the daemon flag
    Candidate {
        status: NodePhase,
        daemoned: Option<bool>,
    },
}

/// Decide the candidate node status for a pod
pub fn step_transition(pod: &Pod) -> StepTransition {
    match PodPhase::of(pod) {
        PodPhase::Pending => StepTransition::Skip(SkipReason::PodPending),
        PodPhase::Succeeded => StepTransition::Candidate {
            status: NodePhase::Succeeded,
            daemoned: Some(false),
        },
        PodPhase::Failed => StepTransition::Candidate {
            status: NodePhase::Failed,
            daemoned: Some(false),
        },
        PodPhase::Running => running_transition(pod),
        PodPhase::Other(_) => StepTransition::Candidate {
            status: NodePhase::Error,
            daemoned: None,
        },
    }
}

fn running_transition(pod: &Pod) -> StepTransition {
    let pod_name = pod.metadata.name.as_deref().unwrap_or_default();

    let Some(raw) = pod
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(ANNOTATION_KEY_TEMPLATE))
    else {
        warn!(pod.name = pod_name, "pod is missing the template annotation");
        return StepTransition::Skip(SkipReason::TemplateMissing);
    };

    let template: Template = match serde_json::from_str(raw) {
        Ok(template) => template,
        Err(e) => {
            warn!(pod.name = pod_name, error = %e, "template annotation unreadable");
            return StepTransition::Skip(SkipReason::TemplateUnreadable);
        }
    };

    if !template.is_daemon() {
        return StepTransition::Skip(SkipReason::NotDaemon);
    }
    if !all_containers_ready(pod) {
        return StepTransition::Skip(SkipReason::DaemonNotReady);
    }

    StepTransition::Candidate {
        status: NodePhase::Succeeded,
        daemoned: Some(true),
    }
}

/// Every reported container is ready. A pod reporting no containers counts as ready.
fn all_containers_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .is_none_or(|statuses| statuses.iter().all(|c| c.ready))
}
