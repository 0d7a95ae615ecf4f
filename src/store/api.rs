//! Store backed by the Kubernetes API.

use super::{ResourceStore, StoreError};
use async_trait::async_trait;
use kube::api::{Api, PostParams};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// `ResourceStore` over a namespaced `kube::Api`
pub struct KubeStore<K> {
    api: Api<K>,
    kind: String,
}

impl<K> KubeStore<K>
where
    K: Resource<DynamicType = ()>,
{
    pub fn new(api: Api<K>) -> Self {
        Self {
            api,
            kind: K::kind(&()).into_owned(),
        }
    }
}

impl<K> Debug for KubeStore<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<K> ResourceStore<K> for KubeStore<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Serialize + Debug + Send + Sync + 'static,
{
    async fn get(&self, name: &str) -> Result<K, StoreError> {
        match self.api.get(name).await {
            Ok(obj) => Ok(obj),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Err(StoreError::NotFound {
                kind: self.kind.clone(),
                name: name.to_string(),
            }),
            Err(e) => Err(StoreError::Api(e)),
        }
    }

    async fn replace_status(&self, obj: &K) -> Result<K, StoreError> {
        let name = obj.meta().name.clone().ok_or(StoreError::MissingName)?;
        // The object still carries the resourceVersion it was read with, so the
        // API server rejects the write with 409 if someone else updated it.
        let data = serde_json::to_vec(obj).map_err(StoreError::Encode)?;
        match self
            .api
            .replace_status(&name, &PostParams::default(), data)
            .await
        {
            Ok(updated) => Ok(updated),
            Err(kube::Error::Api(api_err)) if api_err.code == 409 => {
                Err(StoreError::VersionConflict {
                    kind: self.kind.clone(),
                    name,
                })
            }
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Err(StoreError::NotFound {
                kind: self.kind.clone(),
                name,
            }),
            Err(e) => Err(StoreError::Api(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{NodePhase, NodeStatus, Workflow, WorkflowSpec};
    use http::{Method, Request, Response};
    use kube::client::Body;
    use kube::Client;
    use tower_test::mock;

    type Handle = mock::Handle<Request<Body>, Response<Body>>;

    const WORKFLOW_PATH: &str = "/apis/argoproj.io/v1alpha1/namespaces/argo/workflows/hello";

    fn mock_store() -> (KubeStore<Workflow>, Handle) {
        let (service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(service, "argo");
        (KubeStore::new(Api::namespaced(client, "argo")), handle)
    }

    fn status_response(code: u16, reason: &str) -> Response<Body> {
        let status = serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": format!("workflow {reason}"),
            "reason": reason,
            "code": code,
        });
        Response::builder()
            .status(code)
            .body(Body::from(serde_json::to_vec(&status).unwrap()))
            .unwrap()
    }

    fn workflow() -> Workflow {
        let mut wf = Workflow::new("hello", WorkflowSpec::default());
        wf.metadata.resource_version = Some("7".to_string());
        let mut node = NodeStatus::new("hello-1", "hello[0]");
        node.status = NodePhase::Succeeded;
        wf.set_node("hello-1", node);
        wf
    }

    #[tokio::test]
    async fn test_get_maps_404_to_not_found() {
        let (store, mut handle) = mock_store();
        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.expect("no request sent");
            assert_eq!(request.method(), Method::GET);
            assert_eq!(request.uri().path(), WORKFLOW_PATH);
            send.send_response(status_response(404, "NotFound"));
        });

        let err = store.get("hello").await.unwrap_err();
        server.await.unwrap();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Workflow 'hello' not found");
    }

    #[tokio::test]
    async fn test_status_write_targets_status_subresource() {
        let (store, mut handle) = mock_store();
        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.expect("no request sent");
            assert_eq!(request.method(), Method::PUT);
            assert_eq!(request.uri().path(), format!("{WORKFLOW_PATH}/status"));

            let mut updated = workflow();
            updated.metadata.resource_version = Some("8".to_string());
            send.send_response(
                Response::builder()
                    .body(Body::from(serde_json::to_vec(&updated).unwrap()))
                    .unwrap(),
            );
        });

        let updated = store.replace_status(&workflow()).await.unwrap();
        server.await.unwrap();
        assert_eq!(updated.metadata.resource_version.as_deref(), Some("8"));
        assert_eq!(updated.node("hello-1").unwrap().status, NodePhase::Succeeded);
    }

    #[tokio::test]
    async fn test_status_write_maps_409_to_conflict() {
        let (store, mut handle) = mock_store();
        let server = tokio::spawn(async move {
            let (_request, send) = handle.next_request().await.expect("no request sent");
            send.send_response(status_response(409, "Conflict"));
        });

        let err = store.replace_status(&workflow()).await.unwrap_err();
        server.await.unwrap();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_status_write_without_name() {
        let (store, _handle) = mock_store();
        let mut wf = workflow();
        wf.metadata.name = None;
        assert!(matches!(
            store.replace_status(&wf).await,
            Err(StoreError::MissingName)
        ));
    }
}
