//! # Status Updates
//!
//! Optimistic-concurrency status writes. The resource is refetched before
//! every attempt and the mutation reapplied, so a conflicting writer costs
//! a retry rather than a lost update. Exhausting the retry budget is a
//! hard error for the reconcile pass.

use kube::api::{Api, PostParams};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Fetch the latest version of the resource, apply `mutate` to it, and
/// replace the status subresource, retrying on write conflicts.
pub async fn update_status<K, F>(api: &Api<K>, name: &str, retries: u32, mutate: F) -> Result<()>
where
    K: Clone + DeserializeOwned + Serialize + std::fmt::Debug,
    F: Fn(&mut K),
{
    for attempt in 0..=retries {
        let mut latest = api.get(name).await?;
        mutate(&mut latest);
        match api
            .replace_status(name, &PostParams::default(), serde_json::to_vec(&latest)?)
            .await
        {
            Ok(_) => return Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 409 => {
                debug!(resource = name, attempt, "status update conflict, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(Error::StatusConflict { retries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Database, StatusConditions};
    use crate::test_utils::{conflict_json, database_json, MockApiServer};

    const STATUS_PATH: &str =
        "/apis/stack.datastack.dev/v1alpha1/namespaces/default/databases/orders/status";
    const GET_PATH: &str =
        "/apis/stack.datastack.dev/v1alpha1/namespaces/default/databases/orders";

    #[tokio::test]
    async fn conflict_is_retried_with_refetch() {
        let db = database_json("orders", "postgres-main");
        let mock = MockApiServer::new()
            .on("GET", GET_PATH, 200, &db)
            .on_sequence(
                "PUT",
                STATUS_PATH,
                vec![(409, conflict_json("databases", "orders")), (200, db.clone())],
            );
        let api: Api<Database> = Api::namespaced(mock.client(), "default");

        update_status(&api, "orders", 3, |latest: &mut Database| {
            latest.set_available("database is running");
        })
        .await
        .unwrap();

        let puts = mock
            .requests()
            .into_iter()
            .filter(|(method, _)| method == "PUT")
            .count();
        assert_eq!(puts, 2);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_conflict_error() {
        let db = database_json("orders", "postgres-main");
        let mock = MockApiServer::new()
            .on("GET", GET_PATH, 200, &db)
            .on("PUT", STATUS_PATH, 409, &conflict_json("databases", "orders"));
        let api: Api<Database> = Api::namespaced(mock.client(), "default");

        let err = update_status(&api, "orders", 2, |latest: &mut Database| {
            latest.set_available("database is running");
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::StatusConflict { retries: 2 }));
    }
}
