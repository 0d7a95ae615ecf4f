//! # Custom Resource Definitions
//!
//! Types for the `Workflow` custom resource and the structures embedded in it
//! or carried by pod annotations.
//!
//! ## Module Structure
//!
//! - `workflow.rs` - `Workflow` CRD specification and status
//! - `node.rs` - Per-node status recorded in `status.nodes`
//! - `template.rs` - Step template carried in the pod template annotation
//! - `outputs.rs` - Step outputs carried in the pod outputs annotation

mod node;
mod outputs;
mod template;
mod workflow;

// Re-export all public types
pub use node::{NodePhase, NodeStatus};
pub use outputs::{Artifact, Outputs, Parameter};
pub use template::Template;
pub use workflow::{Workflow, WorkflowSpec, WorkflowStatus};
