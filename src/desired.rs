//! Desired-state builders
//!
//! Pure functions from a VisitorApp spec and a tier to the intended shape of
//! that tier's children. Owner references, UIDs and resource versions are left
//! for the store and for assurance to fill in.

use crate::crd::VisitorAppSpec;
use crate::tier::{Tier, SECRET_PASSWORD_KEY, SECRET_USERNAME_KEY};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, PodSpec, PodTemplateSpec, Secret,
    SecretKeySelector, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

/// Replica count every tier runs with
pub const TIER_REPLICAS: i32 = 1;

const DATABASE_NAME: &str = "visitors";
const DATABASE_USER: &str = "visitors-user";
const DATABASE_PASSWORD: &str = "visitors-pass";

/// Credentials Secret for the tier, or `None` for tiers without one.
pub fn credentials(namespace: &str, tier: Tier) -> Option<Secret> {
    let name = tier.credentials_name()?;

    let mut string_data = BTreeMap::new();
    string_data.insert(SECRET_USERNAME_KEY.to_string(), DATABASE_USER.to_string());
    string_data.insert(SECRET_PASSWORD_KEY.to_string(), DATABASE_PASSWORD.to_string());

    Some(Secret {
        metadata: object_meta(name, namespace, tier),
        string_data: Some(string_data),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    })
}

/// Deployment running the tier's single container.
pub fn workload(spec: &VisitorAppSpec, namespace: &str, tier: Tier) -> Deployment {
    let selector = tier.pod_selector();

    let container = Container {
        name: tier.container_name().to_string(),
        image: Some(image(spec, tier).to_string()),
        ports: Some(vec![ContainerPort {
            name: Some(tier.port_name().to_string()),
            container_port: tier.port(),
            ..Default::default()
        }]),
        env: Some(env(spec, tier)),
        ..Default::default()
    };

    Deployment {
        metadata: object_meta(tier.workload_name(), namespace, tier),
        spec: Some(DeploymentSpec {
            replicas: Some(TIER_REPLICAS),
            selector: LabelSelector {
                match_labels: Some(selector.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Service forwarding the tier's port to its pods.
///
/// The database Service is headless; backend and frontend are exposed on fixed
/// node ports.
pub fn endpoint(namespace: &str, tier: Tier) -> Service {
    let port = ServicePort {
        port: tier.port(),
        target_port: Some(IntOrString::Int(tier.port())),
        protocol: Some("TCP".to_string()),
        node_port: tier.node_port(),
        ..Default::default()
    };

    let spec = match tier {
        Tier::Database => ServiceSpec {
            cluster_ip: Some("None".to_string()),
            selector: Some(tier.pod_selector()),
            ports: Some(vec![port]),
            ..Default::default()
        },
        Tier::Backend | Tier::Frontend => ServiceSpec {
            type_: Some("NodePort".to_string()),
            selector: Some(tier.pod_selector()),
            ports: Some(vec![port]),
            ..Default::default()
        },
    };

    Service {
        metadata: object_meta(tier.endpoint_name(), namespace, tier),
        spec: Some(spec),
        ..Default::default()
    }
}

/// Image the tier should run
pub fn image(spec: &VisitorAppSpec, tier: Tier) -> &str {
    match tier {
        Tier::Database => &spec.database_image,
        Tier::Backend => &spec.backend_image,
        Tier::Frontend => &spec.frontend_image,
    }
}

fn object_meta(name: &str, namespace: &str, tier: Tier) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(tier.common_labels()),
        ..Default::default()
    }
}

fn env(spec: &VisitorAppSpec, tier: Tier) -> Vec<EnvVar> {
    match tier {
        Tier::Database => vec![
            literal("MYSQL_RANDOM_ROOT_PASSWORD", "yes"),
            literal("MYSQL_DATABASE", DATABASE_NAME),
            from_secret("MYSQL_USER", SECRET_USERNAME_KEY),
            from_secret("MYSQL_PASSWORD", SECRET_PASSWORD_KEY),
        ],
        Tier::Backend => vec![
            literal("MYSQL_DATABASE", DATABASE_NAME),
            literal("MYSQL_SERVICE_HOST", Tier::Database.endpoint_name()),
            from_secret("MYSQL_USERNAME", SECRET_USERNAME_KEY),
            from_secret("MYSQL_PASSWORD", SECRET_PASSWORD_KEY),
        ],
        Tier::Frontend => vec![literal("REACT_APP_TITLE", &spec.title)],
    }
}

fn literal(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

// Credentials are referenced by key so the Secret stays the only copy.
fn from_secret(name: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: crate::tier::MYSQL_AUTH_SECRET.to_string(),
                key: key.to_string(),
                optional: None,
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
