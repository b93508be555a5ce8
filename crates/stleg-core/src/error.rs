use serde::Serialize;
use thiserror::Error;

/// The client-facing reason a request was rejected by the pipeline.
///
/// Each variant carries its own HTTP status code (`status_code`) and its
/// own stable machine-readable code (`code`), matching the wire taxonomy: the
/// gateway never leaks internal error text, only one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectionReason {
    Malformed,
    UnsupportedAlgorithm,
    InvalidSignature,
    UnknownKid,
    Expired,
    ExpiredBeyondGrace,
    ScopeMismatch,
    RouteNotInScope,
    DomainNotAuthorized,
    RouteRequiresLicense,
    Revoked,
    RateLimited,
    PaymentRequired,
}

impl RejectionReason {
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            Self::Malformed
            | Self::UnsupportedAlgorithm
            | Self::InvalidSignature
            | Self::UnknownKid
            | Self::Expired => 401,
            Self::PaymentRequired => 402,
            Self::ScopeMismatch
            | Self::RouteNotInScope
            | Self::DomainNotAuthorized
            | Self::RouteRequiresLicense
            | Self::Revoked
            | Self::ExpiredBeyondGrace => 403,
            Self::RateLimited => 429,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Malformed => "Malformed",
            Self::UnsupportedAlgorithm => "UnsupportedAlgorithm",
            Self::InvalidSignature => "InvalidSignature",
            Self::UnknownKid => "UnknownKid",
            Self::Expired => "Expired",
            Self::ExpiredBeyondGrace => "ExpiredBeyondGrace",
            Self::ScopeMismatch => "ScopeMismatch",
            Self::RouteNotInScope => "RouteNotInScope",
            Self::DomainNotAuthorized => "DomainNotAuthorized",
            Self::RouteRequiresLicense => "RouteRequiresLicense",
            Self::Revoked => "Revoked",
            Self::RateLimited => "TooManyRequests",
            Self::PaymentRequired => "PaymentRequired",
        }
    }

    /// `true` for the two paths that must be constant-time-delayed
    /// indistinguishably from each other (invalid signature and revoked).
    #[must_use]
    pub fn is_timing_sensitive(self) -> bool {
        matches!(
            self,
            Self::InvalidSignature | Self::UnsupportedAlgorithm | Self::Revoked
        )
    }

    /// Short human-readable message accompanying `code()` on the response
    /// body (spec §7: "a stable machine-readable error code and a short
    /// human message").
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Malformed => "the license token is not a well-formed JWS",
            Self::UnsupportedAlgorithm => "the license token uses an unsupported signing algorithm",
            Self::InvalidSignature => "the license token signature is invalid",
            Self::UnknownKid => "the license token's key id is not recognized",
            Self::Expired => "the license token has expired",
            Self::ExpiredBeyondGrace => "the license token expired beyond its grace period",
            Self::ScopeMismatch => "the license token's scope digest does not match this gateway",
            Self::RouteNotInScope => "this route is not covered by the license token's public scope",
            Self::DomainNotAuthorized => "this host is not authorized for the license token",
            Self::RouteRequiresLicense => "this route requires a license token",
            Self::Revoked => "the license has been revoked",
            Self::RateLimited => "the request rate limit has been exceeded",
            Self::PaymentRequired => "the metered quota has been exceeded and requires payment",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Infrastructure-level failures surfaced by the pipeline's collaborators.
/// Never serialized directly to a client; mapped to a `RejectionReason` (or
/// swallowed by a fail-open policy) at the pipeline boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("state store error: {0}")]
    State(String),

    #[error("key directory error: {0}")]
    KeyDirectory(String),

    #[error("revocation store error: {0}")]
    Revocation(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}
