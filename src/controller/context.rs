//! # Reconciler Context
//!
//! Shared state handed to every reconcile invocation: the Kubernetes
//! client, controller configuration, and per-resource retry backoff.

use kube::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::ControllerConfig;
use crate::runtime::backoff::FibonacciBackoff;

pub struct Context {
    pub client: Client,
    pub config: ControllerConfig,
    /// Backoff state per resource (namespace/name), advanced on failure
    /// and reset on success so resources do not interfere with each other
    backoffs: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl Context {
    pub fn new(client: Client, config: ControllerConfig) -> Self {
        Self {
            client,
            config,
            backoffs: Mutex::new(HashMap::new()),
        }
    }

    /// Next retry delay for a failing resource.
    pub fn next_backoff(&self, namespace: &str, name: &str) -> Duration {
        let key = format!("{namespace}/{name}");
        let mut backoffs = self.backoffs.lock().unwrap_or_else(|p| p.into_inner());
        backoffs
            .entry(key)
            .or_insert_with(|| {
                FibonacciBackoff::new(self.config.backoff_min_secs, self.config.backoff_max_secs)
            })
            .next_backoff()
    }

    /// Forget a resource's error history after a successful reconcile.
    pub fn reset_backoff(&self, namespace: &str, name: &str) {
        let key = format!("{namespace}/{name}");
        let mut backoffs = self.backoffs.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(backoff) = backoffs.get_mut(&key) {
            backoff.reset();
        }
    }
}
