//! # Prelude
//!
//! Commonly used types, importable with `use workflow_controller::prelude::*;`

pub use crate::crd::*;

pub use crate::controller::reconciler::{
    apply_updates, step_transition, PodReconciler, ReconcileOutcome, ReconcilerError, SkipReason,
    StepTransition,
};
pub use crate::controller::{
    handoff, ControlLoop, EventChannels, LoggingOperator, WorkflowOperator,
};

pub use crate::config::{
    ConfigError, ConfigResynchronizer, ControllerSettings, SharedControllerConfig,
    WorkflowControllerConfig,
};

pub use crate::store::{KubeStore, MemoryStore, ResourceStore, StoreError};
