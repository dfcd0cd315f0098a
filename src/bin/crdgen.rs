//! # CRD Generator
//!
//! Prints the CustomResourceDefinition manifests for all five kinds.
//!
//! ```bash
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::CustomResourceExt;

use datastack_operator::crd::{
    Database, DatabaseConnection, RedisConnection, S3Bucket, S3Connection,
};

fn main() -> anyhow::Result<()> {
    let crds = [
        Database::crd(),
        DatabaseConnection::crd(),
        RedisConnection::crd(),
        S3Bucket::crd(),
        S3Connection::crd(),
    ];
    for crd in crds {
        print!("---\n{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
