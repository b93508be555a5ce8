//! Shared types for the license enforcement gateway: the claims model, the
//! rejection/error taxonomy, the pipeline's `Decision` contract, and the
//! handful of small value types (pillar, correlation id, route classifier)
//! every other `stleg-*` crate depends on.

pub mod claims;
pub mod context;
pub mod correlation;
pub mod decision;
pub mod error;
pub mod pillar;
pub mod route;

pub use claims::{Billing, LicenseClaims, OverageBehavior, PlClaims, PulClaims, RateTier, Tier};
pub use context::{RateLimitHeaders, RequestContext};
pub use correlation::CorrelationId;
pub use decision::Decision;
pub use error::{GatewayError, RejectionReason};
pub use pillar::Pillar;
pub use route::RouteClassifier;
