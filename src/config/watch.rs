//! # ConfigMap Watch
//!
//! Watches the controller ConfigMap and re-runs the resynchronizer when it changes.

use crate::config::ConfigResynchronizer;
use futures::{pin_mut, StreamExt};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::Api;
use kube_runtime::{watcher, WatchStreamExt};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Start watching the controller ConfigMap
///
/// Every applied version of the ConfigMap is handed to the resynchronizer.
/// A rejected configuration is logged and the previous one stays active; a
/// deleted ConfigMap is logged and changes nothing.
pub fn start_configmap_watch(
    config_maps: Api<ConfigMap>,
    resync: Arc<ConfigResynchronizer>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = resync.config_map_name().to_string();
        let watcher_config = watcher::Config::default().fields(&format!("metadata.name={name}"));
        let stream = watcher(config_maps, watcher_config).default_backoff();
        pin_mut!(stream);

        info!(config_map = %name, "watching ConfigMap for configuration changes");

        loop {
            let event_result = tokio::select! {
                () = cancel.cancelled() => break,
                next = stream.next() => match next {
                    Some(result) => result,
                    None => break,
                },
            };
            match event_result {
                Ok(watcher::Event::Apply(config_map) | watcher::Event::InitApply(config_map)) => {
                    if config_map.metadata.name.as_deref() != Some(name.as_str()) {
                        continue;
                    }
                    info!(config_map = %name, "ConfigMap changed, reloading configuration");
                    // Errors are logged inside apply(); the previous config stays active
                    let _ = resync.apply(&config_map).await;
                }
                Ok(watcher::Event::Delete(_)) => {
                    warn!(config_map = %name, "ConfigMap was deleted, keeping current configuration");
                }
                Ok(watcher::Event::Init | watcher::Event::InitDone) => {}
                Err(e) => {
                    // The stream backs off and re-establishes the watch itself
                    error!(config_map = %name, error = %e, "error watching ConfigMap");
                }
            }
        }

        info!(config_map = %name, "ConfigMap watch stopped");
    })
}
