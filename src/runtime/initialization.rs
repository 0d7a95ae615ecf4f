//! # Initialization
//!
//! Brings the controller up in order: rustls, tracing, metrics, HTTP server,
//! Kubernetes client, initial configuration, ConfigMap watch, then the
//! workflow and pod watches. The initial configuration and the watches are
//! required; failing either aborts startup.

use crate::config::{
    create_shared_config, start_configmap_watch, ConfigResynchronizer, ControllerSettings,
    SharedControllerConfig,
};
use crate::controller::{start_watches, PodReconciler, WatchBridge};
use crate::crd::Workflow;
use crate::observability;
use crate::server::{start_server, ServerState};
use crate::store::KubeStore;
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret};
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Everything the control loop needs once startup has finished
pub struct InitializationResult {
    pub reconciler: PodReconciler,
    pub bridge: WatchBridge,
    pub controller_config: SharedControllerConfig,
    pub server_state: Arc<ServerState>,
    pub cancel: CancellationToken,
    pub background: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .finish_non_exhaustive()
    }
}

pub async fn initialize(settings: &ControllerSettings) -> Result<InitializationResult> {
    // ring is the only provider compiled in; an Err means one is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();

    observability::logging::init_tracing(settings)?;

    info!("Starting workflow controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        namespace = %settings.namespace,
        config_map = %settings.config_map_name,
        metrics_port = settings.metrics_port,
        config_watch = settings.config_watch_enabled,
        "controller settings"
    );

    observability::metrics::register_metrics()?;

    let cancel = CancellationToken::new();
    let server_state = Arc::new(ServerState::default());
    let mut background = Vec::new();

    let server_port = settings.metrics_port;
    let server_state_clone = Arc::clone(&server_state);
    let server_shutdown = cancel.clone();
    background.push(tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone, server_shutdown).await {
            error!("HTTP server error: {e}");
        }
    }));

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let namespace = settings.namespace.as_str();

    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let workflows: Api<Workflow> = Api::namespaced(client.clone(), namespace);
    let pods: Api<Pod> = Api::namespaced(client, namespace);

    let controller_config = create_shared_config();
    let resync = Arc::new(ConfigResynchronizer::new(
        Arc::new(KubeStore::new(config_maps.clone())),
        Arc::new(KubeStore::new(secrets)),
        settings.config_map_name.clone(),
        Arc::clone(&controller_config),
    ));
    resync
        .resync()
        .await
        .context("Failed to load workflow controller configuration")?;

    if settings.config_watch_enabled {
        background.push(start_configmap_watch(
            config_maps,
            Arc::clone(&resync),
            cancel.clone(),
        ));
    } else {
        info!("ConfigMap watch disabled - configuration changes require a restart");
    }

    let reconciler = PodReconciler::new(Arc::new(KubeStore::new(workflows.clone())));
    let bridge = start_watches(workflows, pods, cancel.clone())
        .await
        .context("Failed to start watches")?;

    server_state.set_ready(true);
    info!("Controller initialized, starting control loop");

    Ok(InitializationResult {
        reconciler,
        bridge,
        controller_config,
        server_state,
        cancel,
        background,
    })
}
