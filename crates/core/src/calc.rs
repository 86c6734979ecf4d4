//! Ratio formula deriving material quantities from [`Settings`].

use crate::{models::Settings, number::round_half_up};

/// Values derived from the current settings. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedResults {
    /// Pulver needed for the target quantity.
    pub total_resource: f64,
    /// Proportional split factor.
    pub factor: f64,
    /// Tender Timber units needed.
    pub units_a: f64,
    /// Timber units needed.
    pub units_b: f64,
    /// Pulver produced by exchanging `units_a`.
    pub resource_from_a: f64,
    /// Pulver produced by exchanging `units_b`.
    pub resource_from_b: f64,
    /// Sum of both exchanges.
    pub resource_sum: f64,
}

impl DerivedResults {
    /// Apply the ratio formula. Division by zero is not guarded and yields
    /// non-finite values; see [`DerivedResults::is_degenerate`].
    pub fn compute(settings: &Settings) -> Self {
        let total_resource = settings.target_quantity * settings.resource_per_unit_target;
        let factor = total_resource
            / ((settings.ratio_a / settings.rate_a + settings.ratio_b / settings.rate_b)
                * settings.resource_per_exchange);

        let units_a = round_half_up(factor * settings.ratio_a);
        let units_b = round_half_up(factor * settings.ratio_b);

        let resource_from_a = units_a / settings.rate_a * settings.resource_per_exchange;
        let resource_from_b = units_b / settings.rate_b * settings.resource_per_exchange;

        Self {
            total_resource,
            factor,
            units_a,
            units_b,
            resource_from_a,
            resource_from_b,
            resource_sum: resource_from_a + resource_from_b,
        }
    }

    /// True when any derived value is NaN or infinite.
    pub fn is_degenerate(&self) -> bool {
        [
            self.total_resource,
            self.factor,
            self.units_a,
            self.units_b,
            self.resource_from_a,
            self.resource_from_b,
            self.resource_sum,
        ]
        .iter()
        .any(|value| !value.is_finite())
    }
}
