// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request received by [`MockService`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

type Routes = HashMap<(String, String), VecDeque<(u16, String)>>;

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// Several responses registered for the same route are served in order; the
/// last one keeps being served once the others are used up.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PATCH requests matching the exact path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Add a response for DELETE requests matching the exact path
    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests received so far for one method
    pub fn requests_with_method(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&(method.to_string(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(str::to_string);

        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let body = req.into_body().collect().await?.to_bytes();
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path,
                query,
                body: String::from_utf8_lossy(&body).into_owned(),
            });

            let (status, body) = response.unwrap_or_else(|| {
                // Default 404 for unmatched requests
                (404, not_found_json("resource", "unknown"))
            });
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock custom object JSON response
pub fn object_json(
    api_version: &str,
    kind: &str,
    namespace: Option<&str>,
    name: &str,
    spec: serde_json::Value,
    status: Option<serde_json::Value>,
) -> String {
    let mut object = serde_json::json!({
        "apiVersion": api_version,
        "kind": kind,
        "metadata": {
            "name": name,
            "uid": "test-uid",
            "resourceVersion": "1",
            "annotations": {"kubectl.kubernetes.io/last-applied-configuration": "{}"}
        },
        "spec": spec
    });
    if let Some(ns) = namespace {
        object["metadata"]["namespace"] = ns.into();
    }
    if let Some(status) = status {
        object["status"] = status;
    }
    object.to_string()
}

/// Create a success Status response
pub fn status_success_json() -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Success",
        "code": 200
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// Create a server-side failure response such as a 500 or 503
pub fn server_error_json(code: u16, reason: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("the server reported {}", reason),
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 409 conflict response as returned by server-side apply
pub fn conflict_json(field: &str, manager: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("Apply failed with 1 conflict: conflict with \"{}\": {}", manager, field),
        "reason": "Conflict",
        "code": 409
    })
    .to_string()
}

/// Create an `/apis` discovery response listing one group version
pub fn api_group_list_json(group: &str, version: &str) -> String {
    let group_version = format!("{}/{}", group, version);
    serde_json::json!({
        "kind": "APIGroupList",
        "apiVersion": "v1",
        "groups": [{
            "name": group,
            "versions": [{"groupVersion": group_version, "version": version}],
            "preferredVersion": {"groupVersion": group_version, "version": version}
        }]
    })
    .to_string()
}

/// Create an `/apis/<group>/<version>` discovery response for namespaced `(kind, plural)` pairs
pub fn api_resource_list_json(group_version: &str, kinds: &[(&str, &str)]) -> String {
    let resources: Vec<serde_json::Value> = kinds
        .iter()
        .map(|(kind, plural)| {
            serde_json::json!({
                "name": plural,
                "singularName": kind.to_lowercase(),
                "namespaced": true,
                "kind": kind,
                "verbs": ["delete", "get", "list", "patch", "watch"]
            })
        })
        .collect();
    serde_json::json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": group_version,
        "resources": resources
    })
    .to_string()
}
