//! # Artifact Repository Validation
//!
//! Verifies that the secrets an artifact repository refers to exist and hold
//! the referenced keys. Read-only, no retries.

use crate::config::{ConfigError, S3ArtifactRepository, SecretKeySelector};
use crate::store::{ResourceStore, StoreError};
use k8s_openapi::api::core::v1::Secret;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// RFC 1123 subdomain, the format of a Secret name
static SECRET_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("secret name regex is valid")
});

/// Valid Secret data key: alphanumerics, `-`, `_` and `.`
static SECRET_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-._a-zA-Z0-9]+$").expect("secret key regex is valid"));

/// Validate an S3 artifact repository
///
/// Both the access key and the secret key selector must point at an existing
/// Secret whose referenced key is present and non-empty.
pub async fn validate_s3_repository(
    secrets: &dyn ResourceStore<Secret>,
    repo: &S3ArtifactRepository,
) -> Result<(), ConfigError> {
    for selector in [&repo.bucket.access_key_secret, &repo.bucket.secret_key_secret] {
        validate_secret_key_selector(secrets, selector).await?;
    }
    Ok(())
}

async fn validate_secret_key_selector(
    secrets: &dyn ResourceStore<Secret>,
    selector: &SecretKeySelector,
) -> Result<(), ConfigError> {
    validate_selector_format(selector)?;

    let secret = secrets.get(&selector.name).await.map_err(|e| match e {
        StoreError::NotFound { .. } => ConfigError::SecretNotFound {
            name: selector.name.clone(),
        },
        other => ConfigError::SecretFetch {
            name: selector.name.clone(),
            source: other,
        },
    })?;

    let has_value = secret
        .data
        .as_ref()
        .and_then(|data| data.get(&selector.key))
        .is_some_and(|value| !value.0.is_empty());
    if !has_value {
        return Err(ConfigError::EmptySecretKey {
            name: selector.name.clone(),
            key: selector.key.clone(),
        });
    }

    debug!(secret.name = %selector.name, secret.key = %selector.key, "secret reference validated");
    Ok(())
}

fn validate_selector_format(selector: &SecretKeySelector) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSecretRef {
        name: selector.name.clone(),
        key: selector.key.clone(),
        reason,
    };

    if selector.name.is_empty() {
        return Err(invalid("secret name cannot be empty".to_string()));
    }
    if selector.name.len() > 253 || !SECRET_NAME_REGEX.is_match(&selector.name) {
        return Err(invalid(format!(
            "'{}' must be a valid Kubernetes name (lowercase alphanumeric, hyphens, dots; at most 253 characters)",
            selector.name
        )));
    }
    if selector.key.is_empty() {
        return Err(invalid("secret key cannot be empty".to_string()));
    }
    if !SECRET_KEY_REGEX.is_match(&selector.key) {
        return Err(invalid(format!(
            "'{}' may only contain alphanumerics, '-', '_' and '.'",
            selector.key
        )));
    }
    Ok(())
}
