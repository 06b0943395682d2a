//! Tier identities
//!
//! Every child object of a VisitorApp has a fixed, tier-scoped name and label
//! set. Nothing here is user-configurable.

use std::collections::BTreeMap;
use std::fmt;

/// Name of the Secret holding the database credentials
pub const MYSQL_AUTH_SECRET: &str = "mysql-auth";
/// Secret key for the database user name
pub const SECRET_USERNAME_KEY: &str = "username";
/// Secret key for the database password
pub const SECRET_PASSWORD_KEY: &str = "password";

/// Field manager / managed-by value stamped on every child
pub const MANAGER_NAME: &str = "visitors-operator";

const APP_NAME: &str = "visitors";

/// One tier of the Visitors application, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Database,
    Backend,
    Frontend,
}

impl Tier {
    /// All tiers in the order they are reconciled
    pub const ALL: [Tier; 3] = [Tier::Database, Tier::Backend, Tier::Frontend];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Database => "mysql",
            Tier::Backend => "backend",
            Tier::Frontend => "frontend",
        }
    }

    /// Name of the tier's Deployment
    pub fn workload_name(self) -> &'static str {
        match self {
            Tier::Database => "mysql",
            Tier::Backend => "visitors-backend",
            Tier::Frontend => "visitors-frontend",
        }
    }

    /// Name of the tier's Service
    pub fn endpoint_name(self) -> &'static str {
        match self {
            Tier::Database => "mysql-service",
            Tier::Backend => "visitors-backend-service",
            Tier::Frontend => "visitors-frontend-service",
        }
    }

    /// Name of the tier's credentials Secret, if it has one
    pub fn credentials_name(self) -> Option<&'static str> {
        match self {
            Tier::Database => Some(MYSQL_AUTH_SECRET),
            Tier::Backend | Tier::Frontend => None,
        }
    }

    /// Name of the single container in the tier's pods
    pub fn container_name(self) -> &'static str {
        match self {
            Tier::Database => "visitors-mysql",
            Tier::Backend => "visitors-service",
            Tier::Frontend => "visitors-webui",
        }
    }

    /// Name of the declared container port
    pub fn port_name(self) -> &'static str {
        match self {
            Tier::Database => "mysql",
            Tier::Backend => "visitors",
            Tier::Frontend => "visitors",
        }
    }

    /// Port the container listens on and the Service forwards
    pub fn port(self) -> i32 {
        match self {
            Tier::Database => 3306,
            Tier::Backend => 8000,
            Tier::Frontend => 3000,
        }
    }

    /// Fixed node port exposed outside the cluster (database stays internal)
    pub fn node_port(self) -> Option<i32> {
        match self {
            Tier::Database => None,
            Tier::Backend => Some(30685),
            Tier::Frontend => Some(30686),
        }
    }

    /// Labels selecting exactly the pods of this tier
    pub fn pod_selector(self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("app.kubernetes.io/name".to_string(), APP_NAME.to_string());
        labels.insert(
            "app.kubernetes.io/component".to_string(),
            self.as_str().to_string(),
        );
        labels
    }

    /// Labels stamped on the tier's child objects
    pub fn common_labels(self) -> BTreeMap<String, String> {
        let mut labels = self.pod_selector();
        labels.insert(
            "app.kubernetes.io/managed-by".to_string(),
            MANAGER_NAME.to_string(),
        );
        labels
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tier_order() {
        assert_eq!(Tier::ALL, [Tier::Database, Tier::Backend, Tier::Frontend]);
    }

    #[test]
    fn test_names_are_unique_per_tier() {
        let workloads: HashSet<_> = Tier::ALL.iter().map(|t| t.workload_name()).collect();
        let endpoints: HashSet<_> = Tier::ALL.iter().map(|t| t.endpoint_name()).collect();
        assert_eq!(workloads.len(), 3);
        assert_eq!(endpoints.len(), 3);
    }

    #[test]
    fn test_selectors_do_not_overlap() {
        let selectors: HashSet<_> = Tier::ALL.iter().map(|t| t.pod_selector()).collect();
        assert_eq!(selectors.len(), 3);
    }

    #[test]
    fn test_only_database_has_credentials() {
        assert_eq!(Tier::Database.credentials_name(), Some("mysql-auth"));
        assert!(Tier::Backend.credentials_name().is_none());
        assert!(Tier::Frontend.credentials_name().is_none());
    }
}
