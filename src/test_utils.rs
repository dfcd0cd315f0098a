//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock API server that returns canned responses keyed by method and
/// path, records every request it sees, and falls back to a Kubernetes
/// style 404 for anything unregistered.
#[derive(Clone, Default)]
pub struct MockApiServer {
    responses: Arc<Mutex<HashMap<(String, String), Vec<(u16, String)>>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for requests matching the method and exact path
    /// (prefix matching applies as a fallback).
    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.on_sequence(method, path, vec![(status, body.to_string())])
    }

    /// Register a sequence of responses; each is consumed once, the last
    /// one sticks.
    pub fn on_sequence(self, method: &str, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), responses);
        self
    }

    /// Build a kube Client backed by this mock.
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    /// Every (method, path) pair seen so far, in order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();

        let key = (method.to_string(), path.to_string());
        if responses.contains_key(&key) {
            return Some(Self::pop(responses.get_mut(&key).expect("checked")));
        }

        // Prefix match for collection paths like .../secrets
        let prefix_key = responses
            .keys()
            .find(|(m, p)| m == method && path.starts_with(p.as_str()))
            .cloned();
        prefix_key.map(|key| Self::pop(responses.get_mut(&key).expect("checked")))
    }

    fn pop(queue: &mut Vec<(u16, String)>) -> (u16, String) {
        if queue.len() > 1 {
            queue.remove(0)
        } else {
            queue[0].clone()
        }
    }
}

impl Service<Request<Body>> for MockApiServer {
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

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));
        let response = self.next_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| {
                (
                    404,
                    r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"not found","reason":"NotFound","code":404}"#
                        .to_string(),
                )
            });
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .expect("static response parts"))
        })
    }
}

/// Minimal Database resource JSON.
pub fn database_json(name: &str, reference: &str) -> String {
    serde_json::json!({
        "apiVersion": "stack.datastack.dev/v1alpha1",
        "kind": "Database",
        "metadata": {"name": name, "namespace": "default", "generation": 1},
        "spec": {"name": name, "reference": reference}
    })
    .to_string()
}

/// Minimal DatabaseConnection resource JSON with inline admin credentials.
pub fn database_connection_json(name: &str, driver: &str, default: bool) -> String {
    serde_json::json!({
        "apiVersion": "stack.datastack.dev/v1alpha1",
        "kind": "DatabaseConnection",
        "metadata": {"name": name, "namespace": "default", "generation": 1},
        "spec": {
            "provider": {
                "driver": driver,
                "host": "127.0.0.1",
                "port": if driver == "mysql" { 3306 } else { 5432 },
                "ssl": false,
                "credential": {"username": "root", "password": "123456"}
            },
            "default": default
        }
    })
    .to_string()
}

/// A DatabaseConnectionList body for list calls.
pub fn database_connection_list_json(connections: &[(&str, &str, bool)]) -> String {
    let items: Vec<serde_json::Value> = connections
        .iter()
        .map(|(name, driver, default)| {
            serde_json::from_str(&database_connection_json(name, driver, *default))
                .expect("fixture json")
        })
        .collect();
    serde_json::json!({
        "apiVersion": "stack.datastack.dev/v1alpha1",
        "kind": "DatabaseConnectionList",
        "metadata": {"resourceVersion": "1"},
        "items": items
    })
    .to_string()
}

/// A 409 Conflict status body for optimistic-concurrency tests.
pub fn conflict_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("Operation cannot be fulfilled on {resource} \"{name}\": the object has been modified"),
        "reason": "Conflict",
        "code": 409
    })
    .to_string()
}
