//! Drift handler
//!
//! Compares the fields the operator owns on a tier's Deployment and Service
//! with their desired shape. Fields the API server defaults (protocols, pull
//! policies, cluster IPs) are ignored.

use crate::controllers::{Outcome, Step};
use crate::crd::VisitorApp;
use crate::desired;
use crate::error::Result;
use crate::store::ObjectStore;
use crate::tier::Tier;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, Service, ServicePort};
use kube::ResourceExt;
use tracing::info;

/// Detect and repair drift on the tier's workload, then its endpoint.
///
/// Issues at most one update and stops the pass when it does.
pub async fn handle_drift<S: ObjectStore>(store: &S, app: &VisitorApp, tier: Tier) -> Result<Step> {
    let namespace = app.namespace().unwrap_or_default();

    let wanted = desired::workload(&app.spec, &namespace, tier);
    if let Some(live) = store
        .get::<Deployment>(&namespace, tier.workload_name())
        .await?
    {
        if let Some(repaired) = workload_drift(&wanted, &live) {
            info!(
                "Deployment {}/{} drifted from {} spec, updating",
                namespace,
                tier.workload_name(),
                tier
            );
            store.update(&namespace, &repaired).await?;
            return Ok(Step::Stop(Outcome::Done));
        }
    }

    let wanted = desired::endpoint(&namespace, tier);
    if let Some(live) = store
        .get::<Service>(&namespace, tier.endpoint_name())
        .await?
    {
        if let Some(repaired) = endpoint_drift(&wanted, &live) {
            info!(
                "Service {}/{} drifted from {} spec, updating",
                namespace,
                tier.endpoint_name(),
                tier
            );
            store.update(&namespace, &repaired).await?;
            return Ok(Step::Stop(Outcome::Done));
        }
    }

    Ok(Step::Continue)
}

/// The live Deployment with desired replicas and containers, if they differ.
///
/// The result keeps the live metadata, so a stale resource version surfaces as
/// a conflict on update.
pub fn workload_drift(desired: &Deployment, live: &Deployment) -> Option<Deployment> {
    let desired_spec = desired.spec.as_ref()?;
    let desired_containers = &desired_spec.template.spec.as_ref()?.containers;

    let live_spec = live.spec.as_ref();
    let live_replicas = live_spec.and_then(|s| s.replicas);
    let live_containers = live_spec
        .and_then(|s| s.template.spec.as_ref())
        .map(|p| p.containers.as_slice())
        .unwrap_or_default();

    let replicas_match = live_replicas == desired_spec.replicas;
    let containers_match = live_containers.len() == desired_containers.len()
        && live_containers
            .iter()
            .zip(desired_containers)
            .all(|(l, d)| container_matches(l, d));

    if replicas_match && containers_match {
        return None;
    }

    let mut repaired = live.clone();
    let spec = repaired.spec.get_or_insert_with(|| desired_spec.clone());
    spec.replicas = desired_spec.replicas;
    spec.template.spec.get_or_insert_with(Default::default).containers = desired_containers.clone();
    Some(repaired)
}

/// The live Service with desired selector and ports, if they differ.
pub fn endpoint_drift(desired: &Service, live: &Service) -> Option<Service> {
    let desired_spec = desired.spec.as_ref()?;
    let live_spec = live.spec.as_ref();

    let live_selector = live_spec.and_then(|s| s.selector.as_ref());
    let live_ports = live_spec
        .and_then(|s| s.ports.as_deref())
        .unwrap_or_default();
    let desired_ports = desired_spec.ports.as_deref().unwrap_or_default();

    let selector_match = live_selector == desired_spec.selector.as_ref();
    let ports_match = live_ports.len() == desired_ports.len()
        && live_ports
            .iter()
            .zip(desired_ports)
            .all(|(l, d)| port_matches(l, d));

    if selector_match && ports_match {
        return None;
    }

    let mut repaired = live.clone();
    let spec = repaired.spec.get_or_insert_with(|| desired_spec.clone());
    spec.selector = desired_spec.selector.clone();
    spec.ports = desired_spec.ports.clone();
    Some(repaired)
}

fn container_matches(live: &Container, desired: &Container) -> bool {
    let ports = |c: &Container| -> Vec<(Option<String>, i32)> {
        c.ports
            .iter()
            .flatten()
            .map(|p| (p.name.clone(), p.container_port))
            .collect()
    };

    live.name == desired.name
        && live.image == desired.image
        && ports(live) == ports(desired)
        && live.env.as_deref().unwrap_or_default() == desired.env.as_deref().unwrap_or_default()
}

fn port_matches(live: &ServicePort, desired: &ServicePort) -> bool {
    live.port == desired.port
        && live.target_port == desired.target_port
        && (desired.node_port.is_none() || live.node_port == desired.node_port)
}
