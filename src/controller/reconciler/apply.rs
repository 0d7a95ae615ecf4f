//! # Node Updates
//!
//! Diffs a candidate status against the stored node and applies the changes
//! in place. The return value says whether anything changed, which decides
//! if the workflow gets written back.

use crate::constants::ANNOTATION_KEY_OUTPUTS;
use crate::crd::{NodePhase, NodeStatus, Outputs};
use k8s_openapi::api::core::v1::Pod;
use tracing::{debug, info, warn};

/// Apply a candidate status to `node`, returning `true` if the node changed
///
/// An unreadable outputs annotation overrides the candidate with `Error`.
pub fn apply_updates(
    pod: &Pod,
    node: &mut NodeStatus,
    status: NodePhase,
    daemoned: Option<bool>,
) -> bool {
    let mut dirty = false;

    let (outputs, status) = match new_outputs(pod, node) {
        Ok(outputs) => (outputs, status),
        Err(e) => {
            warn!(node.id = %node.id, error = %e, "outputs annotation unreadable, failing node");
            (None, NodePhase::Error)
        }
    };

    if node.status != status {
        info!(
            node.id = %node.id,
            from = %node.status,
            to = %status,
            "updating node status"
        );
        node.status = status;
        dirty = true;
    }

    let pod_ip = pod
        .status
        .as_ref()
        .and_then(|s| s.pod_ip.as_deref())
        .unwrap_or_default();
    if node.pod_ip != pod_ip {
        debug!(node.id = %node.id, pod_ip, "updating node pod IP");
        node.pod_ip = pod_ip.to_string();
        dirty = true;
    }

    // Unset and false are the same state; only `Some(true)` is ever stored
    if let Some(want) = daemoned {
        if node.is_daemoned() != want {
            debug!(node.id = %node.id, daemoned = want, "updating node daemon flag");
            node.daemoned = want.then_some(true);
            dirty = true;
        }
    }

    if let Some(outputs) = outputs {
        debug!(node.id = %node.id, "recording node outputs");
        node.outputs = Some(outputs);
        dirty = true;
    }

    dirty
}

/// Outputs to record on the node. `Ok(None)` when the node already has
/// outputs or the pod reports none.
fn new_outputs(pod: &Pod, node: &NodeStatus) -> Result<Option<Outputs>, serde_json::Error> {
    if node.outputs.is_some() {
        return Ok(None);
    }
    pod.metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(ANNOTATION_KEY_OUTPUTS))
        .map(|raw| serde_json::from_str(raw))
        .transpose()
}
