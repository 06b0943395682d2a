//! VisitorApp Controller
//!
//! Reconciles VisitorApp custom resources into a MySQL Deployment, Service and
//! credentials Secret, then the backend and frontend Deployments and Services.
//! Tiers are brought up strictly in that order; the backend is not created
//! until MySQL reports a ready replica.

use crate::config::ReconcilerConfig;
use crate::controllers::{
    assure, error_policy_backoff, handle_drift, is_tier_ready, sequence, update_tier_status,
    Outcome, Step,
};
use crate::crd::VisitorApp;
use crate::desired;
use crate::error::{OperatorError, Result};
use crate::store::{KubeStore, ObjectStore, StoreObject};
use crate::tier::Tier;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher::Config;
use kube::{Client, ResourceExt};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// Namespaced identity of a VisitorApp
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// The control loop, independent of how passes are triggered.
pub struct Reconciler<S> {
    store: S,
    config: ReconcilerConfig,
}

impl<S: ObjectStore> Reconciler<S> {
    pub fn new(store: S, config: ReconcilerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Run one pass for the VisitorApp identified by `key`.
    ///
    /// The pass runs inside its own span, so every log line it emits carries
    /// the namespace and name.
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Outcome> {
        let span = info_span!("reconcile", namespace = %key.namespace, name = %key.name);
        self.pass(key).instrument(span).await
    }

    async fn pass(&self, key: &ObjectKey) -> Result<Outcome> {
        info!("Reconciling VisitorApp {}", key);

        let app = match self
            .store
            .get::<VisitorApp>(&key.namespace, &key.name)
            .await
        {
            Ok(Some(app)) => app,
            Ok(None) => {
                // Children are removed through their owner references.
                info!("VisitorApp {} not found, ignoring since it must be deleted", key);
                return Ok(Outcome::Done);
            }
            Err(e) => {
                error!("Failed to get VisitorApp {}: {}", key, e);
                return Err(e);
            }
        };

        if app.metadata.deletion_timestamp.is_some() {
            info!("VisitorApp {} is being deleted", key);
            return Ok(Outcome::Done);
        }

        let steps = Tier::ALL
            .into_iter()
            .flat_map(|tier| self.tier_steps(&app, tier))
            .collect();

        match sequence(steps).await? {
            Step::Stop(outcome) => Ok(outcome),
            Step::Continue => {
                info!("VisitorApp {} is up to date", key);
                Ok(Outcome::Done)
            }
        }
    }

    /// Ordered steps for one tier. Nothing runs until the pass reaches it.
    fn tier_steps<'a>(
        &'a self,
        app: &'a VisitorApp,
        tier: Tier,
    ) -> Vec<BoxFuture<'a, Result<Step>>> {
        let namespace = app.namespace().unwrap_or_default();
        let mut steps = Vec::new();

        if let Some(secret) = desired::credentials(&namespace, tier) {
            steps.push(self.assure(app, secret));
        }
        steps.push(self.assure(app, desired::workload(&app.spec, &namespace, tier)));
        steps.push(self.assure(app, desired::endpoint(&namespace, tier)));

        match tier {
            Tier::Database => {
                steps.push(self.readiness_gate(app, tier).boxed());
            }
            Tier::Backend | Tier::Frontend => {
                steps.push(update_tier_status(&self.store, app, tier).boxed());
                steps.push(handle_drift(&self.store, app, tier).boxed());
            }
        }

        steps
    }

    fn assure<'a, K: StoreObject>(
        &'a self,
        app: &'a VisitorApp,
        object: K,
    ) -> BoxFuture<'a, Result<Step>> {
        assure(&self.store, app, object).boxed()
    }

    async fn readiness_gate(&self, app: &VisitorApp, tier: Tier) -> Result<Step> {
        let namespace = app.namespace().unwrap_or_default();
        if is_tier_ready(&self.store, &namespace, tier).await {
            return Ok(Step::Continue);
        }

        let delay = self.config.database_poll_interval;
        info!("{} isn't running, waiting for {:?}", tier, delay);
        Ok(Step::Stop(Outcome::RequeueAfter(delay)))
    }
}

/// Runs the [`Reconciler`] under `kube::runtime::Controller`, re-triggered by
/// changes to any VisitorApp or to the objects it owns.
pub struct VisitorAppController {
    client: Client,
    namespace: Option<String>,
    reconciler: Reconciler<KubeStore>,
}

impl VisitorAppController {
    /// Create a new VisitorApp controller. `namespace = None` watches all namespaces.
    pub fn new(client: Client, namespace: Option<String>, config: ReconcilerConfig) -> Self {
        let reconciler = Reconciler::new(KubeStore::new(client.clone()), config);
        Self {
            client,
            namespace,
            reconciler,
        }
    }

    /// Run the VisitorApp controller
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let apps: Api<VisitorApp> = self.api();

        info!("Starting VisitorApp controller");

        Controller::new(apps, Config::default())
            .owns(self.api::<Deployment>(), Config::default())
            .owns(self.api::<Service>(), Config::default())
            .owns(self.api::<Secret>(), Config::default())
            .shutdown_on_signal()
            .run(
                |app, ctx| async move { ctx.reconcile(app).await },
                |_app, error, ctx| {
                    error!("Reconciliation error: {:?}", error);
                    error_policy_backoff(error, ctx.reconciler.config().error_requeue)
                },
                Arc::clone(&self),
            )
            .for_each(|result| async move {
                match result {
                    Ok((obj, _action)) => {
                        info!("Reconciled VisitorApp: {}", obj.name);
                    }
                    Err(e) => {
                        error!("Reconciliation failed: {:?}", e);
                    }
                }
            })
            .await;

        Ok(())
    }

    async fn reconcile(
        &self,
        app: Arc<VisitorApp>,
    ) -> std::result::Result<Action, OperatorError> {
        let namespace = app.namespace().unwrap_or_else(|| "default".to_string());
        let key = ObjectKey::new(namespace, app.name_any());
        self.reconciler.reconcile(&key).await.map(Action::from)
    }

    fn api<K: StoreObject>(&self) -> Api<K> {
        match &self.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}
