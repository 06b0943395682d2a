//! In-memory [`ObjectStore`] for reconciler tests.
//!
//! Objects are kept as JSON so any `StoreObject` round-trips the same way it
//! would through the API server. Every mutating call is recorded.

use super::{ObjectStore, StoreObject};
use crate::error::{OperatorError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

type Key = (String, String, String);

/// A mutating call observed by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { kind: String, name: String },
    Update { kind: String, name: String },
    PatchStatus { kind: String, name: String },
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<Key, serde_json::Value>,
    calls: Vec<Call>,
    failing_kinds: HashSet<String>,
    racing_kinds: HashSet<String>,
    next_version: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn key<K: StoreObject>(namespace: &str, name: &str) -> Key {
    (
        K::kind(&()).to_string(),
        namespace.to_string(),
        name.to_string(),
    )
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object directly, bypassing call recording.
    pub fn seed<K: StoreObject>(&self, object: &K) {
        let mut inner = self.inner.lock().unwrap();
        let namespace = object.meta().namespace.clone().unwrap_or_default();
        let name = object.meta().name.clone().unwrap_or_default();
        let value = inner.stamp(serde_json::to_value(object).unwrap(), &name);
        inner.objects.insert(key::<K>(&namespace, &name), value);
    }

    /// Read an object without going through the trait.
    pub fn peek<K: StoreObject>(&self, namespace: &str, name: &str) -> Option<K> {
        let inner = self.inner.lock().unwrap();
        inner
            .objects
            .get(&key::<K>(namespace, name))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    /// Change a stored object in place, as another actor on the cluster would.
    pub fn modify<K: StoreObject>(&self, namespace: &str, name: &str, f: impl FnOnce(&mut K)) {
        let mut object: K = self.peek(namespace, name).unwrap();
        f(&mut object);
        let mut inner = self.inner.lock().unwrap();
        let value = inner.stamp(serde_json::to_value(&object).unwrap(), name);
        inner.objects.insert(key::<K>(namespace, name), value);
    }

    pub fn remove<K: StoreObject>(&self, namespace: &str, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.objects.remove(&key::<K>(namespace, name));
    }

    /// Make every `get` of the given kind fail with a transient error.
    pub fn fail_gets_of(&self, kind: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.failing_kinds.insert(kind.to_string());
    }

    /// Let another writer land between the next read and write of the given
    /// kind: a create finds the object already there, an update finds a newer
    /// resource version.
    pub fn race_next_write_of(&self, kind: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.racing_kinds.insert(kind.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Return and forget the calls recorded so far.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.inner.lock().unwrap().calls)
    }

    pub fn count<K: StoreObject>(&self) -> usize {
        let kind = K::kind(&()).to_string();
        let inner = self.inner.lock().unwrap();
        inner.objects.keys().filter(|(k, _, _)| *k == kind).count()
    }
}

impl Inner {
    fn stamp(&mut self, mut value: serde_json::Value, name: &str) -> serde_json::Value {
        self.next_version += 1;
        let meta = &mut value["metadata"];
        meta["resourceVersion"] = self.next_version.to_string().into();
        if meta.get("uid").is_none() {
            meta["uid"] = format!("uid-{}", name).into();
        }
        value
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let inner = self.inner.lock().unwrap();
        if inner.failing_kinds.contains(&*K::kind(&())) {
            return Err(OperatorError::KubeApi("connection refused".to_string()));
        }
        inner
            .objects
            .get(&key::<K>(namespace, name))
            .map(|v| serde_json::from_value(v.clone()).map_err(OperatorError::from))
            .transpose()
    }

    async fn create<K: StoreObject>(&self, namespace: &str, object: &K) -> Result<K> {
        let mut inner = self.inner.lock().unwrap();
        let name = object.meta().name.clone().unwrap_or_default();
        let k = key::<K>(namespace, &name);
        if inner.racing_kinds.remove(&*K::kind(&())) {
            let theirs = inner.stamp(serde_json::to_value(object)?, &name);
            inner.objects.insert(k.clone(), theirs);
        }
        if inner.objects.contains_key(&k) {
            return Err(OperatorError::AlreadyExists(name));
        }
        let value = inner.stamp(serde_json::to_value(object)?, &name);
        inner.objects.insert(k, value.clone());
        inner.calls.push(Call::Create {
            kind: K::kind(&()).to_string(),
            name,
        });
        Ok(serde_json::from_value(value)?)
    }

    async fn update<K: StoreObject>(&self, namespace: &str, object: &K) -> Result<K> {
        let mut inner = self.inner.lock().unwrap();
        let name = object.meta().name.clone().unwrap_or_default();
        let k = key::<K>(namespace, &name);
        if inner.racing_kinds.remove(&*K::kind(&())) {
            if let Some(theirs) = inner.objects.get(&k).cloned() {
                let theirs = inner.stamp(theirs, &name);
                inner.objects.insert(k.clone(), theirs);
            }
        }
        let current = inner
            .objects
            .get(&k)
            .ok_or_else(|| OperatorError::NotFound(name.clone()))?;
        let current_version = current["metadata"]["resourceVersion"].as_str();
        if current_version != object.meta().resource_version.as_deref() {
            return Err(OperatorError::Conflict(name));
        }
        let value = inner.stamp(serde_json::to_value(object)?, &name);
        inner.objects.insert(k, value.clone());
        inner.calls.push(Call::Update {
            kind: K::kind(&()).to_string(),
            name,
        });
        Ok(serde_json::from_value(value)?)
    }

    async fn patch_status<K: StoreObject>(
        &self,
        namespace: &str,
        name: &str,
        patch: serde_json::Value,
    ) -> Result<K> {
        let mut inner = self.inner.lock().unwrap();
        let k = key::<K>(namespace, name);
        let mut value = inner
            .objects
            .get(&k)
            .cloned()
            .ok_or_else(|| OperatorError::NotFound(name.to_string()))?;
        // Only the status subresource is writable here.
        if let Some(status) = patch.get("status") {
            json_patch::merge(&mut value["status"], status);
        }
        let value = inner.stamp(value, name);
        inner.objects.insert(k, value.clone());
        inner.calls.push(Call::PatchStatus {
            kind: K::kind(&()).to_string(),
            name: name.to_string(),
        });
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{VisitorApp, VisitorAppSpec};
    use kube::api::ObjectMeta;
    use serde_json::json;

    fn app() -> VisitorApp {
        VisitorApp {
            metadata: ObjectMeta {
                name: Some("site".to_string()),
                namespace: Some("ns".to_string()),
                ..Default::default()
            },
            spec: VisitorAppSpec::default(),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_status_patch_drops_null_members() {
        let store = MemoryStore::new();
        store.seed(&app());

        let patch = json!({
            "status": { "backend": { "ready": false, "readyReplicas": 0, "image": null } }
        });
        store
            .patch_status::<VisitorApp>("ns", "site", patch)
            .await
            .unwrap();

        let raw = store.inner.lock().unwrap().objects[&key::<VisitorApp>("ns", "site")].clone();
        assert_eq!(raw["status"]["backend"]["ready"], json!(false));
        assert!(raw["status"]["backend"].get("image").is_none());
    }

    #[tokio::test]
    async fn test_status_patch_leaves_spec_alone() {
        let store = MemoryStore::new();
        store.seed(&app());

        let patch = json!({
            "spec": { "title": "Changed" },
            "status": { "observedGeneration": 2 }
        });
        let patched: VisitorApp = store.patch_status("ns", "site", patch).await.unwrap();

        assert_eq!(patched.spec.title, VisitorAppSpec::default().title);
        assert_eq!(patched.status.unwrap().observed_generation, Some(2));
    }
}
