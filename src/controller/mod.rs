//! # Controller
//!
//! Workflow controller core.
//!
//! - `bridge`: workflow and pod watches feeding the control loop
//! - `control_loop`: single consumer dispatching notifications
//! - `handoff`: rendezvous channel between the bridge and the loop
//! - `operator`: hook for driving workflows forward
//! - `reconciler`: folds pod state into workflow node statuses

pub mod bridge;
pub mod control_loop;
pub mod handoff;
pub mod operator;
pub mod reconciler;

pub use bridge::{start_watches, BridgeError, EventChannels, NotificationKind, WatchBridge};
pub use control_loop::ControlLoop;
pub use handoff::{handoff, HandoffClosed, HandoffReceiver, HandoffSender};
pub use operator::{LoggingOperator, WorkflowOperator};
pub use reconciler::{PodReconciler, ReconcileOutcome, ReconcilerError};
