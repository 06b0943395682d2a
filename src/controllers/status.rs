//! Status updater
//!
//! Mirrors the live state of a tier's Deployment into the VisitorApp status.
//! Writes only when the observation changed, so a pass over a settled cluster
//! issues no status calls.

use crate::controllers::readiness::{ready_replicas, EXPECTED_READY_REPLICAS};
use crate::controllers::Step;
use crate::crd::{AppStatus, TierStatus, VisitorApp};
use crate::error::Result;
use crate::store::ObjectStore;
use crate::tier::Tier;
use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;
use tracing::{debug, info};

/// Refresh `status.<tier>` from the tier's live workload. Never stops the pass.
pub async fn update_tier_status<S: ObjectStore>(
    store: &S,
    app: &VisitorApp,
    tier: Tier,
) -> Result<Step> {
    let Some(field) = status_field(tier) else {
        return Ok(Step::Continue);
    };
    let namespace = app.namespace().unwrap_or_default();
    let name = app.name_any();

    let live = store
        .get::<Deployment>(&namespace, tier.workload_name())
        .await?;
    let recorded = app.status.as_ref().and_then(|s| recorded_status(s, tier));
    let observed = observe(live.as_ref(), recorded);

    let generation = app.metadata.generation;
    let generation_current = app
        .status
        .as_ref()
        .is_some_and(|s| s.observed_generation == generation);

    if recorded.is_some_and(|r| r.same_observation(&observed)) && generation_current {
        debug!("Status of {} tier unchanged for {}/{}", tier, namespace, name);
        return Ok(Step::Continue);
    }

    info!(
        "Updating {} status for {}/{}: ready={} ({}/{})",
        tier, namespace, name, observed.ready, observed.ready_replicas, EXPECTED_READY_REPLICAS
    );

    let mut status = serde_json::Map::new();
    status.insert(field.to_string(), serde_json::to_value(&observed)?);
    status.insert("observedGeneration".to_string(), serde_json::json!(generation));
    let patch = serde_json::json!({ "status": status });
    store
        .patch_status::<VisitorApp>(&namespace, &name, patch)
        .await?;

    Ok(Step::Continue)
}

fn status_field(tier: Tier) -> Option<&'static str> {
    match tier {
        Tier::Database => None,
        Tier::Backend => Some("backend"),
        Tier::Frontend => Some("frontend"),
    }
}

fn recorded_status(status: &AppStatus, tier: Tier) -> Option<&TierStatus> {
    match tier {
        Tier::Database => None,
        Tier::Backend => status.backend.as_ref(),
        Tier::Frontend => status.frontend.as_ref(),
    }
}

/// Build the tier status from a live workload, keeping the previous transition
/// time while readiness is unchanged.
fn observe(live: Option<&Deployment>, previous: Option<&TierStatus>) -> TierStatus {
    let ready_replicas = live.map(ready_replicas).unwrap_or(0);
    let ready = ready_replicas == EXPECTED_READY_REPLICAS;
    let image = live
        .and_then(|d| d.spec.as_ref())
        .and_then(|s| s.template.spec.as_ref())
        .and_then(|p| p.containers.first())
        .and_then(|c| c.image.clone());

    let last_transition_time = match previous {
        Some(p) if p.ready == ready => p.last_transition_time.clone(),
        _ => Some(Utc::now().to_rfc3339()),
    };

    TierStatus {
        ready,
        ready_replicas,
        image,
        last_transition_time,
    }
}
