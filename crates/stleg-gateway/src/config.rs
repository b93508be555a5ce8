use std::collections::HashMap;
use std::time::Duration;

/// Per-resource overage pricing for the `bill` policy. Loaded as
/// configuration rather than hard-coded, per the resolved open question on
/// billing rates (spec §9).
#[derive(Debug, Clone, Default)]
pub struct OverageRates {
    pub per_unit_rate: HashMap<String, f64>,
}

impl OverageRates {
    #[must_use]
    pub fn rate_for(&self, resource: &str) -> f64 {
        self.per_unit_rate.get(resource).copied().unwrap_or(0.0)
    }
}

/// Split of admission-semaphore permits between PL ("sponsor") and PUL
/// ("free") tokens, expressed as a ratio rather than fixed pool sizes (spec
/// §4.F resolved open question).
#[derive(Debug, Clone, Copy)]
pub struct PrioritySplit {
    pub sponsor_permits: usize,
    pub free_permits: usize,
}

impl Default for PrioritySplit {
    fn default() -> Self {
        Self {
            sponsor_permits: 8,
            free_permits: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub grace_period: Duration,
    pub admission_permits: usize,
    pub priority_split: Option<PrioritySplit>,
    pub overage_rates: OverageRates,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(14 * 24 * 3600),
            admission_permits: 200,
            priority_split: None,
            overage_rates: OverageRates::default(),
        }
    }
}
