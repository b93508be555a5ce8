use std::sync::Arc;

use ed25519_dalek::Signature;
use ed25519_dalek::Verifier as _;
use stleg_core::{LicenseClaims, RejectionReason};
use tokio::time::Instant;
use tracing::warn;

use crate::jws::{self, Header};
use crate::key_directory::{KeyDirectory, KeyDirectorySource};
use crate::timing;

const SUPPORTED_ALGORITHMS: &[&str] = &["EdDSA", "Ed25519"];

/// Verifies compact-JWS license tokens against a `KeyDirectory`, normalizing
/// latency across every outcome so an attacker cannot distinguish "bad
/// signature" from "unknown key" from "valid but expired" by timing alone.
///
/// `source` is optional: a verifier built over a statically seeded directory
/// (tests, or a deployment with no rotation) simply never refreshes.
pub struct TokenVerifier {
    directory: Arc<KeyDirectory>,
    source: Option<Arc<dyn KeyDirectorySource>>,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(directory: Arc<KeyDirectory>) -> Self {
        Self {
            directory,
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(directory: Arc<KeyDirectory>, source: Arc<dyn KeyDirectorySource>) -> Self {
        Self {
            directory,
            source: Some(source),
        }
    }

    /// Whether the underlying Key Directory holds at least one entry, for
    /// the admin readiness probe (spec §6.6: `GET /admin/readyz`).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.directory.is_empty()
    }

    /// Verify `token` against wall-clock time `now` (Unix seconds). Returns
    /// the decoded header and claims on success. Every return path — early
    /// or late, success or failure — is padded to the same latency floor by
    /// `timing::normalize` before this function returns.
    pub async fn verify(
        &self,
        token: &str,
        now: i64,
    ) -> Result<(Header, LicenseClaims), RejectionReason> {
        let start = Instant::now();
        let outcome = self.verify_unpadded(token, now).await;
        timing::normalize(start).await;
        outcome
    }

    /// The same check as `verify`, without the timing-normalization pad.
    /// Callers that fold additional timing-sensitive work into the same
    /// critical section (the gateway pipeline's revocation check, so a
    /// revoked verdict costs the same wall clock as an invalid-signature
    /// one) measure their own single `timing::normalize` window spanning
    /// both and must use this instead of `verify`, or the verdict would be
    /// padded twice.
    pub async fn verify_unpadded(
        &self,
        token: &str,
        now: i64,
    ) -> Result<(Header, LicenseClaims), RejectionReason> {
        self.verify_inner(token, now).await
    }

    async fn verify_inner(
        &self,
        token: &str,
        now: i64,
    ) -> Result<(Header, LicenseClaims), RejectionReason> {
        let parsed = jws::parse(token)?;

        if !SUPPORTED_ALGORITHMS.contains(&parsed.header.alg.as_str()) {
            return Err(RejectionReason::UnsupportedAlgorithm);
        }

        let mut entry = self.directory.get(parsed.header.kid.as_deref());
        if entry.is_none() {
            if let Some(source) = &self.source {
                if self.directory.refresh(source.as_ref()).await.is_ok() {
                    entry = self.directory.get(parsed.header.kid.as_deref());
                }
            }
        }
        let Some(entry) = entry else {
            return Err(RejectionReason::UnknownKid);
        };

        let signature = Signature::from_slice(&parsed.signature)
            .map_err(|_| RejectionReason::InvalidSignature)?;
        let signing_input = jws::signing_input(&parsed.header_b64, &parsed.claims_b64);
        entry
            .public_key
            .verify(&signing_input, &signature)
            .map_err(|_| RejectionReason::InvalidSignature)?;

        let claims_bytes = jws::decode_claims(&parsed.claims_b64)?;
        let claims: LicenseClaims =
            serde_json::from_slice(&claims_bytes).map_err(|_| RejectionReason::Malformed)?;

        if claims.exp() < now {
            return Err(RejectionReason::Expired);
        }

        if matches!(entry.status, crate::key_directory::KeyStatus::Deprecated) {
            warn!(kid = %entry.kid, "token verified against a deprecated key");
        }

        Ok((parsed.header, claims))
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use ed25519_dalek::{Signer, SigningKey};
    use rand_core::OsRng;
    use serde_json::json;

    use super::*;
    use crate::key_directory::{KeyEntry, KeyStatus};

    fn sign_token(signing_key: &SigningKey, kid: &str, claims: serde_json::Value) -> String {
        let header = json!({"alg": "EdDSA", "kid": kid});
        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = jws::signing_input(&header_b64, &claims_b64);
        let signature = signing_key.sign(&signing_input);
        let sig_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());
        format!("{header_b64}.{claims_b64}.{sig_b64}")
    }

    fn pul_claims(exp: i64) -> serde_json::Value {
        json!({
            "typ": "PUL",
            "license_id": "lic_123",
            "exp": exp,
            "scope_digest": "sha256:deadbeef",
        })
    }

    #[tokio::test(start_paused = true)]
    async fn verifies_a_correctly_signed_token() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let directory = Arc::new(KeyDirectory::seeded(vec![KeyEntry {
            kid: "k1".to_owned(),
            public_key: signing_key.verifying_key(),
            status: KeyStatus::Active,
        }]));
        let verifier = TokenVerifier::new(directory);
        let token = sign_token(&signing_key, "k1", pul_claims(9_999_999_999));

        let (_, claims) = verifier.verify(&token, 1_000).await.unwrap();
        assert_eq!(claims.license_id(), "lic_123");
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_tampered_signature() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let other_key = SigningKey::generate(&mut OsRng);
        let directory = Arc::new(KeyDirectory::seeded(vec![KeyEntry {
            kid: "k1".to_owned(),
            public_key: signing_key.verifying_key(),
            status: KeyStatus::Active,
        }]));
        let verifier = TokenVerifier::new(directory);
        // Signed with a different key than the one registered under "k1".
        let token = sign_token(&other_key, "k1", pul_claims(9_999_999_999));

        let err = verifier.verify(&token, 1_000).await.unwrap_err();
        assert!(matches!(err, RejectionReason::InvalidSignature));
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_unknown_kid() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let directory = Arc::new(KeyDirectory::seeded(vec![KeyEntry {
            kid: "k1".to_owned(),
            public_key: signing_key.verifying_key(),
            status: KeyStatus::Active,
        }]));
        let verifier = TokenVerifier::new(directory);
        let token = sign_token(&signing_key, "k_other", pul_claims(9_999_999_999));

        let err = verifier.verify(&token, 1_000).await.unwrap_err();
        assert!(matches!(err, RejectionReason::UnknownKid));
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_expired_claims() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let directory = Arc::new(KeyDirectory::seeded(vec![KeyEntry {
            kid: "k1".to_owned(),
            public_key: signing_key.verifying_key(),
            status: KeyStatus::Active,
        }]));
        let verifier = TokenVerifier::new(directory);
        let token = sign_token(&signing_key, "k1", pul_claims(500));

        let err = verifier.verify(&token, 1_000).await.unwrap_err();
        assert!(matches!(err, RejectionReason::Expired));
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_unsupported_algorithm() {
        let header = json!({"alg": "HS256", "kid": "k1"});
        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
        let claims_b64 = URL_SAFE_NO_PAD.encode(pul_claims(9_999_999_999).to_string());
        let token = format!("{header_b64}.{claims_b64}.AA");

        let directory = Arc::new(KeyDirectory::new());
        let verifier = TokenVerifier::new(directory);
        let err = verifier.verify(&token, 1_000).await.unwrap_err();
        assert!(matches!(err, RejectionReason::UnsupportedAlgorithm));
    }
}
