// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `openshift.rs`

#[cfg(test)]
mod tests {
    use crate::openshift::{ClusterOperator, IngressConfig, Route};
    use serde_json::json;

    fn operator(available: &str, progressing: &str, degraded: &str) -> ClusterOperator {
        serde_json::from_value(json!({
            "apiVersion": "config.openshift.io/v1",
            "kind": "ClusterOperator",
            "metadata": { "name": "openshift-apiserver" },
            "spec": {},
            "status": { "conditions": [
                { "type": "Available", "status": available },
                { "type": "Progressing", "status": progressing },
                { "type": "Degraded", "status": degraded }
            ] }
        }))
        .unwrap()
    }

    #[test]
    fn test_cluster_operator_settled() {
        assert!(operator("True", "False", "False").is_settled());
        assert!(!operator("False", "False", "False").is_settled());
        assert!(!operator("True", "True", "False").is_settled());
        assert!(!operator("True", "False", "True").is_settled());
    }

    #[test]
    fn test_cluster_operator_without_status_is_not_settled() {
        let operator: ClusterOperator = serde_json::from_value(json!({
            "apiVersion": "config.openshift.io/v1",
            "kind": "ClusterOperator",
            "metadata": { "name": "openshift-apiserver" },
            "spec": {}
        }))
        .unwrap();

        assert_eq!(operator.condition_status("Available"), None);
        assert!(!operator.is_settled());
    }

    #[test]
    fn test_route_hosts_for_router() {
        let route: Route = serde_json::from_value(json!({
            "apiVersion": "route.openshift.io/v1",
            "kind": "Route",
            "metadata": { "name": "frontend", "namespace": "shop" },
            "spec": { "host": "frontend.apps.example.com" },
            "status": { "ingress": [
                { "host": "frontend.apps.example.com", "routerName": "default" },
                { "host": "frontend.internal.example.com", "routerName": "internal" }
            ] }
        }))
        .unwrap();

        let hosts: Vec<_> = route.hosts_for_router("default").collect();
        assert_eq!(hosts, vec!["frontend.apps.example.com"]);
        assert_eq!(route.hosts_for_router("missing").count(), 0);
    }

    #[test]
    fn test_ingress_config_ignores_unmodelled_fields() {
        let config: IngressConfig = serde_json::from_value(json!({
            "apiVersion": "config.openshift.io/v1",
            "kind": "Ingress",
            "metadata": { "name": "cluster" },
            "spec": {
                "domain": "apps.original.example",
                "appsDomain": "apps.example.com"
            }
        }))
        .unwrap();

        assert_eq!(config.spec.apps_domain.as_deref(), Some("apps.example.com"));
        assert!(config.spec.component_routes.is_none());
    }
}
