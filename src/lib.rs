//! Visitors Kubernetes Operator
//!
//! Runs the three-tier Visitors site (MySQL, visitors-service backend,
//! visitors-webui frontend) from a single custom resource.
//!
//! ## Custom Resources
//!
//! - `VisitorApp`: one instance of the site. The operator creates the MySQL
//!   credentials Secret, Deployment and Service, waits for MySQL to report a
//!   ready replica, then creates the backend and frontend Deployments and
//!   Services and mirrors their state into `status`.
//!
//! ## Example
//!
//! ```yaml
//! apiVersion: default.example.com/v1alpha1
//! kind: VisitorApp
//! metadata:
//!   name: site
//! spec:
//!   title: Visitors Dashboard
//! ```

pub mod config;
pub mod controllers;
pub mod crd;
pub mod desired;
pub mod error;
pub mod store;
pub mod tier;

pub use config::ReconcilerConfig;
pub use controllers::{ObjectKey, Outcome, Reconciler, Step, VisitorAppController};
pub use crd::{AppStatus, TierStatus, VisitorApp, VisitorAppSpec};
pub use error::{OperatorError, Result};
pub use store::{KubeStore, ObjectStore};
pub use tier::Tier;
