use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Policy applied when a PL license's monthly usage for a metered resource
/// would cross its configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverageBehavior {
    Bill,
    Throttle,
    Block,
}

impl std::fmt::Display for OverageBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Bill => "bill",
            Self::Throttle => "throttle",
            Self::Block => "block",
        };
        f.write_str(s)
    }
}

/// PL paid tier. Determines the rate-limit ceiling (`RateTier`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "PL-B")]
    PlB,
    #[serde(rename = "PL-P")]
    PlP,
    #[serde(rename = "PL-E")]
    PlE,
}

impl Tier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlB => "PL-B",
            Self::PlP => "PL-P",
            Self::PlE => "PL-E",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tier used to key the rate limiter's ceiling table. `PUL` is not a
/// `Tier` (it has no sub-tiers) but it occupies the same ceiling slot, so
/// this is a separate, slightly larger enum than `Tier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateTier {
    Pul,
    PlB,
    PlP,
    PlE,
}

impl RateTier {
    /// Requests/minute/pillar ceiling, or `None` for unlimited (`PL-E`).
    #[must_use]
    pub fn ceiling(self) -> Option<u64> {
        match self {
            Self::Pul => Some(100),
            Self::PlB => Some(1_000),
            Self::PlP => Some(10_000),
            Self::PlE => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pul => "PUL",
            Self::PlB => "PL-B",
            Self::PlP => "PL-P",
            Self::PlE => "PL-E",
        }
    }

    /// The next tier up the ladder, or `None` if already at the top
    /// (`PL-E`). Used to compose the upgrade guidance a 429/402 body
    /// carries (spec §7: "current tier, next tier, limits").
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pul => Some(Self::PlB),
            Self::PlB => Some(Self::PlP),
            Self::PlP => Some(Self::PlE),
            Self::PlE => None,
        }
    }
}

impl std::fmt::Display for RateTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overage handling for a PL license's metered resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Billing {
    pub overage: OverageBehavior,
}

/// Claims carried by a Public-Unlimited License token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulClaims {
    pub license_id: String,
    #[serde(default)]
    pub org: Option<String>,
    pub exp: i64,
    pub scope_digest: String,
}

/// Claims carried by a Private-Limited License token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlClaims {
    pub license_id: String,
    #[serde(default)]
    pub org: Option<String>,
    pub exp: i64,
    pub tier: Tier,
    #[serde(default)]
    pub features: HashSet<String>,
    #[serde(default)]
    pub domain_bind: HashSet<String>,
    #[serde(default)]
    pub limits: HashMap<String, u64>,
    #[serde(default)]
    pub billing: Option<Billing>,
}

/// The decoded, signature-verified claims of a license token. Dispatches on
/// the `typ` field of the wire format (`PUL` or `PL`) via serde's internally
/// tagged representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "typ")]
pub enum LicenseClaims {
    #[serde(rename = "PUL")]
    Pul(PulClaims),
    #[serde(rename = "PL")]
    Pl(PlClaims),
}

impl LicenseClaims {
    #[must_use]
    pub fn license_id(&self) -> &str {
        match self {
            Self::Pul(c) => &c.license_id,
            Self::Pl(c) => &c.license_id,
        }
    }

    #[must_use]
    pub fn org(&self) -> Option<&str> {
        match self {
            Self::Pul(c) => c.org.as_deref(),
            Self::Pl(c) => c.org.as_deref(),
        }
    }

    #[must_use]
    pub fn exp(&self) -> i64 {
        match self {
            Self::Pul(c) => c.exp,
            Self::Pl(c) => c.exp,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pul(_) => "PUL",
            Self::Pl(_) => "PL",
        }
    }

    #[must_use]
    pub fn tier_name(&self) -> Option<&'static str> {
        match self {
            Self::Pul(_) => None,
            Self::Pl(c) => Some(c.tier.as_str()),
        }
    }

    #[must_use]
    pub fn rate_tier(&self) -> RateTier {
        match self {
            Self::Pul(_) => RateTier::Pul,
            Self::Pl(c) => match c.tier {
                Tier::PlB => RateTier::PlB,
                Tier::PlP => RateTier::PlP,
                Tier::PlE => RateTier::PlE,
            },
        }
    }

    #[must_use]
    pub fn as_pul(&self) -> Option<&PulClaims> {
        match self {
            Self::Pul(c) => Some(c),
            Self::Pl(_) => None,
        }
    }

    #[must_use]
    pub fn as_pl(&self) -> Option<&PlClaims> {
        match self {
            Self::Pl(c) => Some(c),
            Self::Pul(_) => None,
        }
    }
}
