use std::time::Duration;

use stleg_core::{LicenseClaims, RejectionReason, RouteClassifier};

/// Outcome of the Policy Gate for a single request: admission plus whatever
/// annotation should ride along on the response.
#[derive(Debug, Default)]
pub struct PolicyOutcome {
    pub quota_warning: Option<String>,
}

/// Runs after verification and revocation (spec §4.E). Dispatches on the
/// claims variant; PUL and PL have disjoint rule sets.
pub fn evaluate(
    claims: &LicenseClaims,
    method: &str,
    path: &str,
    host: Option<&str>,
    now: i64,
    grace_period: Duration,
    routes: &RouteClassifier,
) -> Result<PolicyOutcome, RejectionReason> {
    match claims {
        LicenseClaims::Pul(pul) => {
            if pul.scope_digest != routes.scope_digest() {
                return Err(RejectionReason::ScopeMismatch);
            }
            if !routes.is_public(method, path) {
                return Err(RejectionReason::RouteNotInScope);
            }
            if pul.exp < now {
                return Err(RejectionReason::Expired);
            }
            Ok(PolicyOutcome::default())
        }
        LicenseClaims::Pl(pl) => {
            let grace_seconds = i64::try_from(grace_period.as_secs()).unwrap_or(i64::MAX);
            if now > pl.exp + grace_seconds {
                return Err(RejectionReason::ExpiredBeyondGrace);
            }

            let mut outcome = PolicyOutcome::default();
            if pl.exp < now {
                let days_remaining = ((pl.exp + grace_seconds) - now) / 86_400;
                outcome.quota_warning = Some(format!(
                    "license expired, operating on grace period: {days_remaining} day(s) remaining"
                ));
            }

            if !pl.domain_bind.is_empty() {
                let host = host.map(host_without_port).unwrap_or_default();
                if !pl.domain_bind.contains(&host) {
                    return Err(RejectionReason::DomainNotAuthorized);
                }
            }

            Ok(outcome)
        }
    }
}

/// Lowercased host portion of a `Host` header, with a trailing `:port`
/// stripped (spec §4.E binds on the host, not the host:port pair). Leaves
/// bracketed IPv6 literals (`[::1]:8443`) alone rather than mangling them.
fn host_without_port(host: &str) -> String {
    let host = host.to_lowercase();
    if host.starts_with('[') {
        return host;
    }
    host.rsplit_once(':').map_or(host.clone(), |(h, _)| h.to_owned())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use stleg_core::{PlClaims, PulClaims, Tier};

    use super::*;

    fn routes() -> RouteClassifier {
        RouteClassifier::new(vec![("GET".to_owned(), "/health".to_owned())])
    }

    #[test]
    fn pul_requires_matching_scope_digest() {
        let r = routes();
        let claims = LicenseClaims::Pul(PulClaims {
            license_id: "lic".to_owned(),
            org: None,
            exp: 9_999_999_999,
            scope_digest: "sha256:wrong".to_owned(),
        });
        let result = evaluate(&claims, "GET", "/health", None, 0, Duration::from_secs(0), &r);
        assert!(matches!(result, Err(RejectionReason::ScopeMismatch)));
    }

    #[test]
    fn pul_rejects_routes_outside_public_scope() {
        let r = routes();
        let claims = LicenseClaims::Pul(PulClaims {
            license_id: "lic".to_owned(),
            org: None,
            exp: 9_999_999_999,
            scope_digest: r.scope_digest().to_owned(),
        });
        let result = evaluate(&claims, "POST", "/other", None, 0, Duration::from_secs(0), &r);
        assert!(matches!(result, Err(RejectionReason::RouteNotInScope)));
    }

    fn pl(exp: i64, domain_bind: HashSet<String>) -> LicenseClaims {
        LicenseClaims::Pl(PlClaims {
            license_id: "lic".to_owned(),
            org: None,
            exp,
            tier: Tier::PlB,
            features: HashSet::new(),
            domain_bind,
            limits: std::collections::HashMap::new(),
            billing: None,
        })
    }

    #[test]
    fn pl_admits_within_grace_with_warning() {
        let r = routes();
        let claims = pl(1_000, HashSet::new());
        let outcome = evaluate(&claims, "GET", "/x", None, 1_500, Duration::from_secs(86_400 * 14), &r)
            .unwrap();
        assert!(outcome.quota_warning.is_some());
    }

    #[test]
    fn pl_rejects_beyond_grace() {
        let r = routes();
        let claims = pl(1_000, HashSet::new());
        let result = evaluate(
            &claims,
            "GET",
            "/x",
            None,
            1_000 + 86_400 * 15,
            Duration::from_secs(86_400 * 14),
            &r,
        );
        assert!(matches!(result, Err(RejectionReason::ExpiredBeyondGrace)));
    }

    #[test]
    fn pl_domain_bind_mismatch_is_rejected() {
        let r = routes();
        let mut domains = HashSet::new();
        domains.insert("example.com".to_owned());
        let claims = pl(9_999_999_999, domains);
        let result = evaluate(
            &claims,
            "GET",
            "/x",
            Some("other.com"),
            0,
            Duration::from_secs(0),
            &r,
        );
        assert!(matches!(result, Err(RejectionReason::DomainNotAuthorized)));
    }

    #[test]
    fn pl_domain_bind_match_is_case_insensitive() {
        let r = routes();
        let mut domains = HashSet::new();
        domains.insert("example.com".to_owned());
        let claims = pl(9_999_999_999, domains);
        let result = evaluate(
            &claims,
            "GET",
            "/x",
            Some("EXAMPLE.COM"),
            0,
            Duration::from_secs(0),
            &r,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn pl_domain_bind_ignores_explicit_port() {
        let r = routes();
        let mut domains = HashSet::new();
        domains.insert("api.example.com".to_owned());
        let claims = pl(9_999_999_999, domains);
        let result = evaluate(
            &claims,
            "GET",
            "/x",
            Some("api.example.com:8443"),
            0,
            Duration::from_secs(0),
            &r,
        );
        assert!(result.is_ok());
    }
}
