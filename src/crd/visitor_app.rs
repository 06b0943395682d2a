//! VisitorApp Custom Resource Definition
//!
//! Declares one instance of the Visitors site: a MySQL database, the
//! visitors-service backend and the visitors-webui frontend.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// VisitorApp is the Schema for the visitorapps API
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "default.example.com",
    version = "v1alpha1",
    kind = "VisitorApp",
    namespaced,
    status = "AppStatus",
    shortname = "va",
    printcolumn = r#"{"name":"Backend","type":"boolean","jsonPath":".status.backend.ready"}"#,
    printcolumn = r#"{"name":"Frontend","type":"boolean","jsonPath":".status.frontend.ready"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VisitorAppSpec {
    /// Title displayed by the frontend
    #[serde(default = "default_title")]
    pub title: String,

    /// MySQL container image
    #[serde(default = "default_database_image")]
    pub database_image: String,

    /// visitors-service container image
    #[serde(default = "default_backend_image")]
    pub backend_image: String,

    /// visitors-webui container image
    #[serde(default = "default_frontend_image")]
    pub frontend_image: String,
}

impl Default for VisitorAppSpec {
    fn default() -> Self {
        Self {
            title: default_title(),
            database_image: default_database_image(),
            backend_image: default_backend_image(),
            frontend_image: default_frontend_image(),
        }
    }
}

/// Status of the VisitorApp
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    /// Observed state of the backend tier
    #[serde(default)]
    pub backend: Option<TierStatus>,
    /// Observed state of the frontend tier
    #[serde(default)]
    pub frontend: Option<TierStatus>,
    /// Last observed generation
    #[serde(default)]
    pub observed_generation: Option<i64>,
}

/// Observed state of one tier's workload
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TierStatus {
    /// Whether the tier reports its expected ready replicas
    #[serde(default)]
    pub ready: bool,
    /// Ready replicas reported by the workload
    #[serde(default)]
    pub ready_replicas: i32,
    /// Image the live workload runs
    #[serde(default)]
    pub image: Option<String>,
    /// Last time `ready` flipped
    #[serde(default)]
    pub last_transition_time: Option<String>,
}

impl TierStatus {
    /// True when both describe the same observation, ignoring timestamps.
    pub fn same_observation(&self, other: &TierStatus) -> bool {
        self.ready == other.ready
            && self.ready_replicas == other.ready_replicas
            && self.image == other.image
    }
}

// Default value functions
fn default_title() -> String {
    "Visitors Dashboard".to_string()
}

fn default_database_image() -> String {
    "mysql:5.7".to_string()
}

fn default_backend_image() -> String {
    "jdob/visitors-service:1.0.0".to_string()
}

fn default_frontend_image() -> String {
    "jdob/visitors-webui:1.0.0".to_string()
}
