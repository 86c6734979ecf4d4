//! Shared domain models.

use serde::{Deserialize, Deserializer, Serialize};

/// Persisted calculator inputs.
///
/// The record is always stored and loaded as a whole; a stored record that
/// lacks a field is rejected and replaced by [`Settings::default`].
/// Non-finite numbers are written as `null` and read back as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Desired quantity of Abidos Timber.
    #[serde(deserialize_with = "number_or_zero")]
    pub target_quantity: f64,
    /// Relative share of Tender Timber.
    #[serde(deserialize_with = "number_or_zero")]
    pub ratio_a: f64,
    /// Relative share of Timber.
    #[serde(deserialize_with = "number_or_zero")]
    pub ratio_b: f64,
    /// Tender Timber consumed per exchange.
    #[serde(deserialize_with = "number_or_zero")]
    pub rate_a: f64,
    /// Timber consumed per exchange.
    #[serde(deserialize_with = "number_or_zero")]
    pub rate_b: f64,
    /// Pulver cost of one Abidos Timber.
    #[serde(deserialize_with = "number_or_zero")]
    pub resource_per_unit_target: f64,
    /// Pulver yielded by one exchange.
    #[serde(deserialize_with = "number_or_zero")]
    pub resource_per_exchange: f64,
    /// Whether the debug panel is shown.
    pub debug_enabled: bool,
}

fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_quantity: 1320.0,
            ratio_a: 45.0,
            ratio_b: 86.0,
            rate_a: 50.0,
            rate_b: 100.0,
            resource_per_unit_target: 10.0,
            resource_per_exchange: 80.0,
            debug_enabled: false,
        }
    }
}

impl Settings {
    /// Read a numeric field.
    pub fn get(&self, field: NumericField) -> f64 {
        match field {
            NumericField::TargetQuantity => self.target_quantity,
            NumericField::RatioA => self.ratio_a,
            NumericField::RatioB => self.ratio_b,
            NumericField::RateA => self.rate_a,
            NumericField::RateB => self.rate_b,
            NumericField::ResourcePerUnitTarget => self.resource_per_unit_target,
            NumericField::ResourcePerExchange => self.resource_per_exchange,
        }
    }

    /// Overwrite a single numeric field.
    pub fn set(&mut self, field: NumericField, value: f64) {
        let slot = match field {
            NumericField::TargetQuantity => &mut self.target_quantity,
            NumericField::RatioA => &mut self.ratio_a,
            NumericField::RatioB => &mut self.ratio_b,
            NumericField::RateA => &mut self.rate_a,
            NumericField::RateB => &mut self.rate_b,
            NumericField::ResourcePerUnitTarget => &mut self.resource_per_unit_target,
            NumericField::ResourcePerExchange => &mut self.resource_per_exchange,
        };
        *slot = value;
    }
}

/// Numeric fields of [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    /// `targetQuantity`
    TargetQuantity,
    /// `ratioA`
    RatioA,
    /// `ratioB`
    RatioB,
    /// `rateA`
    RateA,
    /// `rateB`
    RateB,
    /// `resourcePerUnitTarget`
    ResourcePerUnitTarget,
    /// `resourcePerExchange`
    ResourcePerExchange,
}

impl NumericField {
    /// Fields exposed as text inputs, in display order.
    pub const EDITABLE: [NumericField; 3] = [
        NumericField::TargetQuantity,
        NumericField::RatioA,
        NumericField::RatioB,
    ];

    /// Key used in the persisted record.
    pub fn key(self) -> &'static str {
        match self {
            NumericField::TargetQuantity => "targetQuantity",
            NumericField::RatioA => "ratioA",
            NumericField::RatioB => "ratioB",
            NumericField::RateA => "rateA",
            NumericField::RateB => "rateB",
            NumericField::ResourcePerUnitTarget => "resourcePerUnitTarget",
            NumericField::ResourcePerExchange => "resourcePerExchange",
        }
    }

    /// Label shown next to the input.
    pub fn label(self) -> &'static str {
        match self {
            NumericField::TargetQuantity => "Zielmenge Abidos Timber",
            NumericField::RatioA => "Verhältnis Tender Timber",
            NumericField::RatioB => "Verhältnis Timber",
            NumericField::RateA => "Tender Timber pro Tausch",
            NumericField::RateB => "Timber pro Tausch",
            NumericField::ResourcePerUnitTarget => "Pulver pro Abidos Timber",
            NumericField::ResourcePerExchange => "Pulver pro Tausch",
        }
    }
}
