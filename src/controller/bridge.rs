//! # Watch Bridge
//!
//! Turns the workflow and pod watches into two handoff channels consumed by
//! the control loop.
//!
//! Each kind is watched by its own task, and every notification is handed
//! over before the next one is read, so a slow reconciliation holds back
//! notifications of that kind only. Reconnects and relists are left to the
//! watcher's backoff; a relist redelivers every object as `Added`.

use crate::constants::LABEL_KEY_WORKFLOW;
use crate::controller::handoff::{handoff, HandoffReceiver, HandoffSender};
use crate::crd::Workflow;
use crate::observability::metrics;
use futures::{pin_mut, Stream, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::{Resource, ResourceExt};
use kube_runtime::{watcher, WatchStreamExt};
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to subscribe to {kind} notifications: {source}")]
    Subscribe {
        kind: String,
        #[source]
        source: kube::Error,
    },
}

/// Notification types forwarded by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Added,
    Updated,
    Deleted,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Updated => "Updated",
            Self::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiving ends of the bridge, one per watched kind
#[derive(Debug)]
pub struct EventChannels {
    pub workflows: HandoffReceiver<Workflow>,
    pub pods: HandoffReceiver<Pod>,
}

/// A running bridge: the channels plus the tasks feeding them
#[derive(Debug)]
pub struct WatchBridge {
    pub channels: EventChannels,
    pub tasks: Vec<JoinHandle<()>>,
}

/// Subscribe to workflows and workflow pods and start forwarding notifications
///
/// Each subscription is checked with a one-item list first; a failure there
/// is returned and nothing is started.
pub async fn start_watches(
    workflows: Api<Workflow>,
    pods: Api<Pod>,
    cancel: CancellationToken,
) -> Result<WatchBridge, BridgeError> {
    let workflow_params = ListParams::default();
    let pod_params = ListParams::default().labels(LABEL_KEY_WORKFLOW);

    probe(&workflows, &workflow_params).await?;
    probe(&pods, &pod_params).await?;

    let (workflow_tx, workflow_rx) = handoff();
    let (pod_tx, pod_rx) = handoff();

    let workflow_stream = watcher(workflows, watcher::Config::default()).default_backoff();
    let pod_stream =
        watcher(pods, watcher::Config::default().labels(LABEL_KEY_WORKFLOW)).default_backoff();

    let tasks = vec![
        tokio::spawn(forward_events(workflow_stream, workflow_tx, cancel.clone())),
        tokio::spawn(forward_events(pod_stream, pod_tx, cancel)),
    ];

    info!("watching workflows and workflow pods");
    Ok(WatchBridge {
        channels: EventChannels {
            workflows: workflow_rx,
            pods: pod_rx,
        },
        tasks,
    })
}

async fn probe<K>(api: &Api<K>, params: &ListParams) -> Result<(), BridgeError>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + fmt::Debug,
{
    api.list(&params.clone().limit(1))
        .await
        .map(|_list| ())
        .map_err(|source| BridgeError::Subscribe {
            kind: K::kind(&()).into_owned(),
            source,
        })
}

/// Forward watch events for one kind until the stream ends, the receiver is
/// dropped, or `cancel` fires
pub async fn forward_events<K, S>(stream: S, tx: HandoffSender<K>, cancel: CancellationToken)
where
    K: Resource<DynamicType = ()> + Send,
    S: Stream<Item = Result<watcher::Event<K>, watcher::Error>>,
{
    let kind = K::kind(&()).into_owned();
    pin_mut!(stream);

    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => break,
            next = stream.next() => next,
        };
        let Some(event) = next else {
            info!(kind = %kind, "watch stream ended");
            break;
        };

        let (notification, obj) = match event {
            Ok(watcher::Event::InitApply(obj)) => (NotificationKind::Added, obj),
            Ok(watcher::Event::Apply(obj)) => (NotificationKind::Updated, obj),
            Ok(watcher::Event::Delete(obj)) => (NotificationKind::Deleted, obj),
            Ok(watcher::Event::Init | watcher::Event::InitDone) => continue,
            Err(e) => {
                // The watcher backs off and reconnects on its own
                error!(kind = %kind, error = %e, "watch error");
                continue;
            }
        };

        debug!(kind = %kind, event = %notification, name = %obj.name_any(), "forwarding notification");
        metrics::increment_notifications(&kind, notification.as_str());

        let sent = tokio::select! {
            () = cancel.cancelled() => break,
            sent = tx.send(obj) => sent,
        };
        if sent.is_err() {
            info!(kind = %kind, "control loop stopped, ending watch");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::WorkflowSpec;
    use futures::stream;
    use http::{Request, Response};
    use kube::client::Body;
    use kube::Client;
    use std::time::Duration;
    use tokio::time::timeout;
    use tower_test::mock;

    type Handle = mock::Handle<Request<Body>, Response<Body>>;

    fn mock_apis() -> (Api<Workflow>, Api<Pod>, Handle) {
        let (service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(service, "argo");
        (
            Api::namespaced(client.clone(), "argo"),
            Api::namespaced(client, "argo"),
            handle,
        )
    }

    fn json_response(code: u16, body: &serde_json::Value) -> Response<Body> {
        Response::builder()
            .status(code)
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn forbidden() -> Response<Body> {
        json_response(
            403,
            &serde_json::json!({
                "kind": "Status",
                "apiVersion": "v1",
                "metadata": {},
                "status": "Failure",
                "message": "forbidden",
                "reason": "Forbidden",
                "code": 403,
            }),
        )
    }

    fn wf(name: &str) -> Workflow {
        Workflow::new(name, WorkflowSpec::default())
    }

    #[tokio::test]
    async fn test_forwards_objects_in_order() {
        let events = vec![
            Ok(watcher::Event::Init),
            Ok(watcher::Event::InitApply(wf("a"))),
            Ok(watcher::Event::InitDone),
            Ok(watcher::Event::Apply(wf("b"))),
            Ok(watcher::Event::Delete(wf("c"))),
        ];
        let (tx, mut rx) = handoff();
        let task = tokio::spawn(forward_events(
            stream::iter(events),
            tx,
            CancellationToken::new(),
        ));

        let mut names = Vec::new();
        while let Some(obj) = rx.recv().await {
            names.push(obj.name_any());
        }
        task.await.unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_stops_when_receiver_dropped() {
        let events = vec![
            Ok(watcher::Event::Apply(wf("a"))),
            Ok(watcher::Event::Apply(wf("b"))),
        ];
        let (tx, rx) = handoff::<Workflow>();
        drop(rx);
        let task = tokio::spawn(forward_events(
            stream::iter(events),
            tx,
            CancellationToken::new(),
        ));
        timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cancel_stops_pending_send() {
        let events = vec![Ok(watcher::Event::Apply(wf("a")))];
        let (tx, _rx) = handoff::<Workflow>();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(forward_events(stream::iter(events), tx, cancel.clone()));

        // Nobody receives, so the send is parked until cancellation
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());
        cancel.cancel();
        timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_workflow_subscription_failure_is_returned() {
        let (workflows, pods, mut handle) = mock_apis();
        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.expect("no request sent");
            assert_eq!(
                request.uri().path(),
                "/apis/argoproj.io/v1alpha1/namespaces/argo/workflows"
            );
            assert!(request.uri().query().unwrap_or_default().contains("limit=1"));
            send.send_response(forbidden());
        });

        let err = start_watches(workflows, pods, CancellationToken::new())
            .await
            .unwrap_err();
        server.await.unwrap();
        let BridgeError::Subscribe { kind, .. } = err;
        assert_eq!(kind, "Workflow");
    }

    #[tokio::test]
    async fn test_pod_subscription_failure_is_returned() {
        let (workflows, pods, mut handle) = mock_apis();
        let server = tokio::spawn(async move {
            let (_request, send) = handle.next_request().await.expect("no request sent");
            send.send_response(json_response(
                200,
                &serde_json::json!({
                    "apiVersion": "argoproj.io/v1alpha1",
                    "kind": "WorkflowList",
                    "metadata": { "resourceVersion": "1" },
                    "items": [],
                }),
            ));

            let (request, send) = handle.next_request().await.expect("no pod request sent");
            assert_eq!(request.uri().path(), "/api/v1/namespaces/argo/pods");
            let query = request.uri().query().unwrap_or_default().to_string();
            assert!(query.contains("labelSelector=workflows.argoproj.io%2Fworkflow"));
            send.send_response(forbidden());
        });

        let err = start_watches(workflows, pods, CancellationToken::new())
            .await
            .unwrap_err();
        server.await.unwrap();
        assert!(err.to_string().starts_with("failed to subscribe to Pod notifications"));
    }

    #[test]
    fn test_notification_labels() {
        assert_eq!(NotificationKind::Added.to_string(), "Added");
        assert_eq!(NotificationKind::Deleted.as_str(), "Deleted");
    }
}
