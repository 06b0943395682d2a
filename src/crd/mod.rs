//! Custom Resource Definitions for the Visitors operator
//!
//! - VisitorApp: the three-tier Visitors application (MySQL, backend, frontend)

mod visitor_app;

pub use visitor_app::{AppStatus, TierStatus, VisitorApp, VisitorAppSpec};
