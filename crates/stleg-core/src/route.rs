use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// The set of `METHOD:path` pairs reachable without a license token,
/// established once at startup from route registration and immutable
/// thereafter. Also the source of the Public-Scope Digest that PUL tokens
/// must echo.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    public_routes: HashSet<String>,
    scope_digest: String,
}

impl RouteClassifier {
    /// Build the classifier from an iterator of `(method, path)` pairs.
    /// Methods are upper-cased; the digest is computed immediately so it
    /// never drifts from the registered set.
    #[must_use]
    pub fn new(routes: impl IntoIterator<Item = (String, String)>) -> Self {
        let public_routes: HashSet<String> = routes
            .into_iter()
            .map(|(method, path)| format!("{}:{path}", method.to_uppercase()))
            .collect();
        let scope_digest = compute_scope_digest(&public_routes);
        Self {
            public_routes,
            scope_digest,
        }
    }

    #[must_use]
    pub fn is_public(&self, method: &str, path: &str) -> bool {
        let key = format!("{}:{path}", method.to_uppercase());
        self.public_routes.contains(&key)
    }

    /// The digest PUL tokens must present in `scope_digest` to be admitted.
    #[must_use]
    pub fn scope_digest(&self) -> &str {
        &self.scope_digest
    }

    /// The sorted route list, for the administrative/diagnostic surface.
    #[must_use]
    pub fn public_routes_sorted(&self) -> Vec<String> {
        let mut routes: Vec<String> = self.public_routes.iter().cloned().collect();
        routes.sort();
        routes
    }
}

/// `sha256:` of the newline-joined, sorted route list — a stable digest that
/// changes only when the public route set itself changes.
fn compute_scope_digest(routes: &HashSet<String>) -> String {
    let mut sorted: Vec<&str> = routes.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let joined = sorted.join("\n");
    let digest = Sha256::digest(joined.as_bytes());
    format!("sha256:{}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> RouteClassifier {
        RouteClassifier::new([
            ("GET".to_owned(), "/api/health".to_owned()),
            ("GET".to_owned(), "/api/v1/seaside/status".to_owned()),
        ])
    }

    #[test]
    fn membership_is_case_insensitive_on_method() {
        let rc = classifier();
        assert!(rc.is_public("get", "/api/health"));
        assert!(!rc.is_public("GET", "/api/v1/marketside/trade"));
    }

    #[test]
    fn digest_is_stable_across_construction_order() {
        let a = RouteClassifier::new([
            ("GET".to_owned(), "/api/health".to_owned()),
            ("GET".to_owned(), "/api/v1/seaside/status".to_owned()),
        ]);
        let b = RouteClassifier::new([
            ("GET".to_owned(), "/api/v1/seaside/status".to_owned()),
            ("GET".to_owned(), "/api/health".to_owned()),
        ]);
        assert_eq!(a.scope_digest(), b.scope_digest());
        assert!(a.scope_digest().starts_with("sha256:"));
    }
}
