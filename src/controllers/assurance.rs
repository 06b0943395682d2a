//! Resource assurance
//!
//! Create-if-absent for one child object. An existing object is never
//! touched; repairing its fields is the drift handler's job.

use crate::controllers::{Outcome, Step};
use crate::crd::VisitorApp;
use crate::error::Result;
use crate::store::{ObjectStore, StoreObject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};
use tracing::{debug, info};

/// Ensure `desired` exists, creating it with an owner link to `app` if not.
///
/// Returns `Stop(Done)` when a create was issued, since the resulting watch
/// event will trigger the next pass.
pub async fn assure<S, K>(store: &S, app: &VisitorApp, mut desired: K) -> Result<Step>
where
    S: ObjectStore,
    K: StoreObject,
{
    let namespace = desired.namespace().unwrap_or_default();
    let name = desired.name_any();
    let kind = K::kind(&());

    if store.get::<K>(&namespace, &name).await?.is_some() {
        debug!("{} {}/{} already exists", kind, namespace, name);
        return Ok(Step::Continue);
    }

    desired.meta_mut().owner_references = Some(vec![owner_reference(app)]);

    info!("Creating {} {}/{}", kind, namespace, name);
    store.create(&namespace, &desired).await?;

    Ok(Step::Stop(Outcome::Done))
}

fn owner_reference(app: &VisitorApp) -> OwnerReference {
    OwnerReference {
        api_version: VisitorApp::api_version(&()).to_string(),
        kind: VisitorApp::kind(&()).to_string(),
        name: app.name_any(),
        uid: app.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}
