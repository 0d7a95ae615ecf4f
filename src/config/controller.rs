//! # Workflow Controller Configuration
//!
//! Configuration parsed from the controller ConfigMap.

use crate::constants::{DEFAULT_EXECUTOR_IMAGE_REPOSITORY, VERSION};
use serde::{Deserialize, Serialize};

/// Controller configuration
///
/// Loaded from the `config` key of the controller ConfigMap, e.g.
///
/// ```yaml
/// executorImage: argoproj/argoexec:v2.0.0
/// artifactRepository:
///   s3:
///     bucket: my-bucket
///     endpoint: s3.amazonaws.com
///     keyPrefix: workflows
///     accessKeySecret:
///       name: my-s3-credentials
///       key: accessKey
///     secretKeySecret:
///       name: my-s3-credentials
///       key: secretKey
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowControllerConfig {
    /// Image used for the executor sidecar. Defaults to the controller's own version.
    #[serde(default)]
    pub executor_image: String,
    /// Where step artifacts are stored
    #[serde(default)]
    pub artifact_repository: ArtifactRepository,
}

/// Artifact repository in which the controller stores step artifacts
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRepository {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3ArtifactRepository>,
}

/// S3-compatible artifact repository
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3ArtifactRepository {
    #[serde(flatten)]
    pub bucket: S3Bucket,
    /// Prefix prepended to every key the controller writes in the bucket
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_prefix: String,
}

/// Location of and credentials for an S3 bucket
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Bucket {
    pub bucket: String,
    pub endpoint: String,
    /// Use plain HTTP instead of HTTPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    pub access_key_secret: SecretKeySelector,
    pub secret_key_secret: SecretKeySelector,
}

/// Reference to a key inside a Secret in the controller namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecretKeySelector {
    pub name: String,
    pub key: String,
}

impl WorkflowControllerConfig {
    /// Parse the YAML configuration blob
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty blob is a valid, empty configuration
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Fill in values the ConfigMap left unset
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        if self.executor_image.is_empty() {
            self.executor_image = default_executor_image();
        }
        self
    }
}

/// Executor image matching the controller version
pub fn default_executor_image() -> String {
    format!("{DEFAULT_EXECUTOR_IMAGE_REPOSITORY}:v{VERSION}")
}
