//! # Config Resynchronizer
//!
//! Reloads the workflow controller configuration from its ConfigMap.

use crate::config::{
    publish_config, validate_s3_repository, ConfigError, SharedControllerConfig,
    WorkflowControllerConfig,
};
use crate::constants::WORKFLOW_CONTROLLER_CONFIG_MAP_KEY;
use crate::observability::metrics;
use crate::store::{ResourceStore, StoreError};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use std::sync::Arc;
use tracing::{info, warn};

/// Loads, validates and publishes the controller configuration
///
/// Any failure leaves the previously published configuration in place.
pub struct ConfigResynchronizer {
    config_maps: Arc<dyn ResourceStore<ConfigMap>>,
    secrets: Arc<dyn ResourceStore<Secret>>,
    config_map_name: String,
    shared: SharedControllerConfig,
}

impl std::fmt::Debug for ConfigResynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResynchronizer")
            .field("config_map_name", &self.config_map_name)
            .finish_non_exhaustive()
    }
}

impl ConfigResynchronizer {
    pub fn new(
        config_maps: Arc<dyn ResourceStore<ConfigMap>>,
        secrets: Arc<dyn ResourceStore<Secret>>,
        config_map_name: impl Into<String>,
        shared: SharedControllerConfig,
    ) -> Self {
        Self {
            config_maps,
            secrets,
            config_map_name: config_map_name.into(),
            shared,
        }
    }

    pub fn config_map_name(&self) -> &str {
        &self.config_map_name
    }

    /// Fetch the ConfigMap and apply it
    pub async fn resync(&self) -> Result<Arc<WorkflowControllerConfig>, ConfigError> {
        let config_map = match self.config_maps.get(&self.config_map_name).await {
            Ok(cm) => cm,
            Err(e) => {
                let err = match e {
                    StoreError::NotFound { .. } => ConfigError::ConfigMapNotFound {
                        name: self.config_map_name.clone(),
                    },
                    other => ConfigError::ConfigMapFetch {
                        name: self.config_map_name.clone(),
                        source: other,
                    },
                };
                metrics::increment_config_resyncs("error");
                return Err(err);
            }
        };
        self.apply(&config_map).await
    }

    /// Parse, validate and publish the configuration held by `config_map`
    pub async fn apply(
        &self,
        config_map: &ConfigMap,
    ) -> Result<Arc<WorkflowControllerConfig>, ConfigError> {
        match self.load(config_map).await {
            Ok(config) => {
                let config = Arc::new(config);
                publish_config(&self.shared, Arc::clone(&config)).await;
                metrics::increment_config_resyncs("success");
                info!(
                    config_map = %self.config_map_name,
                    executor_image = %config.executor_image,
                    s3_repository = config.artifact_repository.s3.is_some(),
                    "workflow controller configuration loaded"
                );
                Ok(config)
            }
            Err(e) => {
                metrics::increment_config_resyncs("error");
                warn!(config_map = %self.config_map_name, error = %e, "configuration rejected, keeping previous configuration");
                Err(e)
            }
        }
    }

    async fn load(&self, config_map: &ConfigMap) -> Result<WorkflowControllerConfig, ConfigError> {
        let raw = config_map
            .data
            .as_ref()
            .and_then(|data| data.get(WORKFLOW_CONTROLLER_CONFIG_MAP_KEY))
            .ok_or_else(|| ConfigError::MissingKey {
                name: self.config_map_name.clone(),
                key: WORKFLOW_CONTROLLER_CONFIG_MAP_KEY.to_string(),
            })?;

        let config =
            WorkflowControllerConfig::from_yaml(raw).map_err(|source| ConfigError::Parse {
                name: self.config_map_name.clone(),
                source,
            })?;

        if let Some(s3) = &config.artifact_repository.s3 {
            validate_s3_repository(self.secrets.as_ref(), s3).await?;
        }

        Ok(config.with_defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{create_shared_config, current_config};
    use crate::store::MemoryStore;
    use k8s_openapi::ByteString;
    use kube::api::ObjectMeta;
    use std::collections::BTreeMap;

    const S3_CONFIG: &str = r"
executorImage: registry.local/argoexec:dev
artifactRepository:
  s3:
    bucket: artifacts
    endpoint: minio:9000
    accessKeySecret:
      name: minio-creds
      key: accesskey
    secretKeySecret:
      name: minio-creds
      key: secretkey
";

    fn config_map(data: Option<(&str, &str)>) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some("workflow-controller-configmap".to_string()),
                ..ObjectMeta::default()
            },
            data: data.map(|(k, v)| BTreeMap::from([(k.to_string(), v.to_string())])),
            ..ConfigMap::default()
        }
    }

    fn creds(secret_value: &str) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some("minio-creds".to_string()),
                ..ObjectMeta::default()
            },
            data: Some(BTreeMap::from([
                ("accesskey".to_string(), ByteString(b"admin".to_vec())),
                (
                    "secretkey".to_string(),
                    ByteString(secret_value.as_bytes().to_vec()),
                ),
            ])),
            ..Secret::default()
        }
    }

    struct Fixture {
        config_maps: Arc<MemoryStore<ConfigMap>>,
        secrets: Arc<MemoryStore<Secret>>,
        shared: SharedControllerConfig,
        resync: ConfigResynchronizer,
    }

    fn fixture() -> Fixture {
        let config_maps = Arc::new(MemoryStore::new());
        let secrets = Arc::new(MemoryStore::new());
        let shared = create_shared_config();
        let resync = ConfigResynchronizer::new(
            Arc::clone(&config_maps) as Arc<dyn ResourceStore<ConfigMap>>,
            Arc::clone(&secrets) as Arc<dyn ResourceStore<Secret>>,
            "workflow-controller-configmap",
            Arc::clone(&shared),
        );
        Fixture {
            config_maps,
            secrets,
            shared,
            resync,
        }
    }

    #[tokio::test]
    async fn test_resync_publishes_validated_config() {
        let f = fixture();
        f.config_maps.insert(config_map(Some(("config", S3_CONFIG))));
        f.secrets.insert(creds("password"));

        let config = f.resync.resync().await.unwrap();
        assert_eq!(config.executor_image, "registry.local/argoexec:dev");
        assert_eq!(*current_config(&f.shared).await, *config);
    }

    #[tokio::test]
    async fn test_resync_defaults_executor_image() {
        let f = fixture();
        f.config_maps.insert(config_map(Some(("config", "artifactRepository: {}"))));

        let config = f.resync.resync().await.unwrap();
        assert!(config.executor_image.starts_with("argoproj/argoexec:v"));
        // No S3 section, so no secret lookups
        assert_eq!(f.secrets.get_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_validation_keeps_previous_config() {
        let f = fixture();
        f.config_maps.insert(config_map(Some(("config", S3_CONFIG))));
        f.secrets.insert(creds("password"));
        f.resync.resync().await.unwrap();

        // Secret key emptied: the next resync must fail and change nothing
        f.secrets.insert(creds(""));
        f.config_maps.insert(config_map(Some((
            "config",
            &S3_CONFIG.replace("registry.local/argoexec:dev", "registry.local/argoexec:next"),
        ))));

        let err = f.resync.resync().await.unwrap_err();
        assert!(matches!(err, ConfigError::EmptySecretKey { .. }));
        assert_eq!(
            current_config(&f.shared).await.executor_image,
            "registry.local/argoexec:dev"
        );
    }

    #[tokio::test]
    async fn test_missing_config_map() {
        let f = fixture();
        let before = current_config(&f.shared).await;

        let err = f.resync.resync().await.unwrap_err();
        assert!(matches!(err, ConfigError::ConfigMapNotFound { .. }));
        assert_eq!(*current_config(&f.shared).await, *before);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let f = fixture();
        f.config_maps.insert(config_map(Some(("other", "x: 1"))));

        let err = f.resync.resync().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "ConfigMap 'workflow-controller-configmap' does not have key 'config'"
        );

        f.config_maps.insert(config_map(None));
        let err = f.resync.resync().await.unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));
    }

    #[tokio::test]
    async fn test_unparseable_config() {
        let f = fixture();
        f.config_maps.insert(config_map(Some(("config", "executorImage: [oops"))));

        let err = f.resync.resync().await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
