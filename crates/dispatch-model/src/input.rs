//! Raw input records as produced by an external loader.
//!
//! Every required value is optional here so that an absent key surfaces as a
//! [`ValidationError::MissingField`](crate::ValidationError::MissingField)
//! naming the field, instead of a deserializer error. Unknown keys are ignored.

use serde::{Deserialize, Serialize};

/// The four sub-records making up one dispatch case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    pub bus: BusRecord,
    pub appliance: ApplianceRecord,
    pub der_profile: DerProductionRecord,
    pub usage: UsageRecord,
}

/// Grid connection point: prices, tariffs, capacities and penalties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusRecord {
    #[serde(rename = "energy_price_DKK_per_kWh", default)]
    pub energy_price: Option<Vec<f64>>,
    #[serde(rename = "import_tariff_DKK/kWh", default)]
    pub import_tariff: Option<f64>,
    #[serde(rename = "export_tariff_DKK/kWh", default)]
    pub export_tariff: Option<f64>,
    #[serde(rename = "max_import_kW", default)]
    pub max_import: Option<f64>,
    #[serde(rename = "max_export_kW", default)]
    pub max_export: Option<f64>,
    #[serde(rename = "penalty_excess_import_DKK/kWh", default)]
    pub penalty_excess_import: Option<f64>,
    #[serde(rename = "penalty_excess_export_DKK/kWh", default)]
    pub penalty_excess_export: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplianceRecord {
    #[serde(default)]
    pub load: Vec<LoadEntry>,
    #[serde(rename = "DER", default)]
    pub der: Vec<DerEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadEntry {
    #[serde(rename = "max_load_kWh_per_hour", default)]
    pub max_load: Option<f64>,
    #[serde(default)]
    pub max_ramp_rate_up_ratio: Option<f64>,
    #[serde(default)]
    pub max_ramp_rate_down_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerEntry {
    #[serde(rename = "max_power_kW", default)]
    pub max_power: Option<f64>,
    #[serde(default)]
    pub max_ramp_rate_up_ratio: Option<f64>,
    #[serde(default)]
    pub max_ramp_rate_down_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerProductionRecord {
    #[serde(default)]
    pub hourly_profile_ratio: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(default)]
    pub load_preferences: Vec<LoadPreference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadPreference {
    /// Minimum daily energy, in hours at maximum load
    #[serde(default)]
    pub min_total_energy_per_day_hour_equivalent: Option<f64>,
}
