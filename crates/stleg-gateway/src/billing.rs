use tracing::info;

/// A metered-overage event, emitted to the correlation sink (a `tracing`
/// event, per spec §4.G) rather than synchronously to the request. Downstream
/// billing consumes these from the log/metrics pipeline.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BillingEvent {
    pub license_id: String,
    pub org: Option<String>,
    pub resource: String,
    pub limit: u64,
    pub usage: u64,
    pub overage: u64,
    pub per_unit_rate: f64,
    pub cost: f64,
}

impl BillingEvent {
    #[must_use]
    pub fn new(
        license_id: String,
        org: Option<String>,
        resource: String,
        limit: u64,
        usage: u64,
        per_unit_rate: f64,
    ) -> Self {
        let overage = usage.saturating_sub(limit);
        #[allow(clippy::cast_precision_loss)]
        let cost = overage as f64 * per_unit_rate;
        Self {
            license_id,
            org,
            resource,
            limit,
            usage,
            overage,
            per_unit_rate,
            cost,
        }
    }

    pub fn emit(&self) {
        info!(
            event = "billing_overage",
            license_id = %self.license_id,
            org = ?self.org,
            resource = %self.resource,
            limit = self.limit,
            usage = self.usage,
            overage = self.overage,
            per_unit_rate = self.per_unit_rate,
            cost = self.cost,
            "metered overage billed"
        );
    }
}
