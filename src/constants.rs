//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Label on a pod naming the workflow that owns it
pub const LABEL_KEY_WORKFLOW: &str = "workflows.argoproj.io/workflow";

/// Annotation on a pod carrying the JSON-serialized step template
pub const ANNOTATION_KEY_TEMPLATE: &str = "workflows.argoproj.io/template";

/// Annotation on a pod carrying the JSON-serialized step outputs
pub const ANNOTATION_KEY_OUTPUTS: &str = "workflows.argoproj.io/outputs";

/// Key inside the controller ConfigMap holding the YAML configuration blob
pub const WORKFLOW_CONTROLLER_CONFIG_MAP_KEY: &str = "config";

/// Default name of the controller ConfigMap
pub const DEFAULT_CONFIG_MAP_NAME: &str = "workflow-controller-configmap";

/// Default namespace watched by the controller
pub const DEFAULT_NAMESPACE: &str = "default";

/// Executor image repository; the tag is the controller version
pub const DEFAULT_EXECUTOR_IMAGE_REPOSITORY: &str = "argoproj/argoexec";

/// Controller version, used to derive the default executor image tag
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default log format (`text` or `json`)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "workflow_controller=info";
