//! Workflow Controller Library
//!
//! Reconciles the node statuses of `Workflow` resources from the lifecycle of
//! the pods running their steps, and keeps the controller configuration in
//! sync with its ConfigMap.
//!
//! ## Quick Start
//!
//! ```rust
//! use workflow_controller::prelude::*;
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod server;
pub mod store;
