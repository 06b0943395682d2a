//! Object store interface
//!
//! The reconciler only needs four operations against the API server. They are
//! exposed through [`ObjectStore`] so the control loop can be driven by the
//! real `kube` client in production and by an in-memory store in tests.

#[cfg(test)]
pub(crate) mod memory;

use crate::error::Result;
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Namespaced API object the store can read and write.
pub trait StoreObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> StoreObject for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Store operations used by the reconciler
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object; `Ok(None)` when it does not exist.
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<Option<K>>;

    /// Create an object. Fails with `AlreadyExists` if the name is taken.
    async fn create<K: StoreObject>(&self, namespace: &str, object: &K) -> Result<K>;

    /// Replace an object. Fails with `Conflict` if its resource version is stale.
    async fn update<K: StoreObject>(&self, namespace: &str, object: &K) -> Result<K>;

    /// Merge-patch the status subresource.
    async fn patch_status<K: StoreObject>(
        &self,
        namespace: &str,
        name: &str,
        patch: serde_json::Value,
    ) -> Result<K>;
}

/// [`ObjectStore`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K: StoreObject>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        Ok(self.api::<K>(namespace).get_opt(name).await?)
    }

    async fn create<K: StoreObject>(&self, namespace: &str, object: &K) -> Result<K> {
        Ok(self
            .api::<K>(namespace)
            .create(&PostParams::default(), object)
            .await?)
    }

    async fn update<K: StoreObject>(&self, namespace: &str, object: &K) -> Result<K> {
        let name = object.meta().name.clone().unwrap_or_default();
        Ok(self
            .api::<K>(namespace)
            .replace(&name, &PostParams::default(), object)
            .await?)
    }

    async fn patch_status<K: StoreObject>(
        &self,
        namespace: &str,
        name: &str,
        patch: serde_json::Value,
    ) -> Result<K> {
        Ok(self
            .api::<K>(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?)
    }
}
