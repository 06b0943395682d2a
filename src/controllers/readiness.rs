//! Readiness probe
//!
//! A tier is up when its Deployment reports the expected number of ready
//! replicas. Probing never fails: anything that prevents an answer is "not
//! ready".

use crate::store::ObjectStore;
use crate::tier::Tier;
use k8s_openapi::api::apps::v1::Deployment;
use tracing::{debug, warn};

/// Ready replicas a tier must report to count as up
pub const EXPECTED_READY_REPLICAS: i32 = 1;

/// Ready replicas reported by a live Deployment (absent status counts as zero)
pub fn ready_replicas(deployment: &Deployment) -> i32 {
    deployment
        .status
        .as_ref()
        .and_then(|s| s.ready_replicas)
        .unwrap_or(0)
}

/// Whether the tier's workload in `namespace` is up.
pub async fn is_tier_ready<S: ObjectStore>(store: &S, namespace: &str, tier: Tier) -> bool {
    let name = tier.workload_name();
    match store.get::<Deployment>(namespace, name).await {
        Ok(Some(deployment)) => {
            let ready = ready_replicas(&deployment);
            debug!(
                "Deployment {}/{} has {}/{} ready replicas",
                namespace, name, ready, EXPECTED_READY_REPLICAS
            );
            ready == EXPECTED_READY_REPLICAS
        }
        Ok(None) => {
            warn!("Deployment {}/{} not found", namespace, name);
            false
        }
        Err(e) => {
            warn!("Failed to probe Deployment {}/{}: {}", namespace, name, e);
            false
        }
    }
}
