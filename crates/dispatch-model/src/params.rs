use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;
use crate::input::RawInput;

/// Validated numeric parameters of one dispatch problem
///
/// Serialized names match the keys echoed in the result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Number of time steps
    #[serde(rename = "T")]
    pub horizon: usize,
    /// Energy price per step (DKK/kWh)
    pub prices: Vec<f64>,
    /// Import tariff (DKK/kWh)
    pub tau_imp: f64,
    /// Export tariff (DKK/kWh)
    pub tau_exp: f64,
    /// Hard import capacity (kW)
    #[serde(rename = "Gmax_imp")]
    pub gmax_imp: f64,
    /// Hard export capacity (kW)
    #[serde(rename = "Gmax_exp")]
    pub gmax_exp: f64,
    /// Penalty per kWh imported above the hard cap
    pub c_pen_imp: f64,
    /// Penalty per kWh exported above the hard cap
    pub c_pen_exp: f64,
    /// Maximum load per step (kWh/h)
    #[serde(rename = "Lmax")]
    pub l_max: f64,
    #[serde(rename = "rhoL_up")]
    pub rho_l_up: f64,
    #[serde(rename = "rhoL_dn")]
    pub rho_l_dn: f64,
    /// Installed PV power (kW)
    #[serde(rename = "Ppv_max")]
    pub ppv_max: f64,
    #[serde(rename = "rhoPV_up")]
    pub rho_pv_up: f64,
    #[serde(rename = "rhoPV_dn")]
    pub rho_pv_dn: f64,
    /// PV availability per step as a fraction of `ppv_max`
    pub pv_ratio: Vec<f64>,
    /// Minimum energy served over the horizon (kWh)
    #[serde(rename = "Emin")]
    pub e_min: f64,
}

impl Parameters {
    /// Normalize a raw input record into validated parameters
    ///
    /// `Emin` is the usage record's minimum in hours at full load, times `Lmax`.
    pub fn from_input(input: &RawInput) -> Result<Self, ValidationError> {
        let bus = &input.bus;
        let load = input
            .appliance
            .load
            .first()
            .ok_or_else(|| missing("appliance.load[0]"))?;
        let der = input
            .appliance
            .der
            .first()
            .ok_or_else(|| missing("appliance.DER[0]"))?;
        let preference = input
            .usage
            .load_preferences
            .first()
            .ok_or_else(|| missing("usage.load_preferences[0]"))?;

        let prices = required(&bus.energy_price, "bus.energy_price_DKK_per_kWh")?;
        let pv_ratio = required(&input.der_profile.hourly_profile_ratio, "der_profile.hourly_profile_ratio")?;
        let l_max = required(&load.max_load, "appliance.load[0].max_load_kWh_per_hour")?;
        let min_hours = required(
            &preference.min_total_energy_per_day_hour_equivalent,
            "usage.load_preferences[0].min_total_energy_per_day_hour_equivalent",
        )?;
        check_non_negative("min_total_energy_per_day_hour_equivalent", min_hours)?;

        let params = Parameters {
            horizon: prices.len(),
            prices,
            tau_imp: required(&bus.import_tariff, "bus.import_tariff_DKK/kWh")?,
            tau_exp: required(&bus.export_tariff, "bus.export_tariff_DKK/kWh")?,
            gmax_imp: required(&bus.max_import, "bus.max_import_kW")?,
            gmax_exp: required(&bus.max_export, "bus.max_export_kW")?,
            c_pen_imp: required(&bus.penalty_excess_import, "bus.penalty_excess_import_DKK/kWh")?,
            c_pen_exp: required(&bus.penalty_excess_export, "bus.penalty_excess_export_DKK/kWh")?,
            l_max,
            rho_l_up: required(&load.max_ramp_rate_up_ratio, "appliance.load[0].max_ramp_rate_up_ratio")?,
            rho_l_dn: required(&load.max_ramp_rate_down_ratio, "appliance.load[0].max_ramp_rate_down_ratio")?,
            ppv_max: required(&der.max_power, "appliance.DER[0].max_power_kW")?,
            rho_pv_up: required(&der.max_ramp_rate_up_ratio, "appliance.DER[0].max_ramp_rate_up_ratio")?,
            rho_pv_dn: required(&der.max_ramp_rate_down_ratio, "appliance.DER[0].max_ramp_rate_down_ratio")?,
            pv_ratio,
            e_min: min_hours * l_max,
        };

        params.validate()?;
        debug!(horizon = params.horizon, e_min = params.e_min, "extracted dispatch parameters");
        Ok(params)
    }

    /// Check the invariants every model build relies on
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.horizon == 0 || self.prices.is_empty() {
            return Err(ValidationError::EmptyHorizon);
        }
        if self.prices.len() != self.horizon || self.pv_ratio.len() != self.horizon {
            return Err(ValidationError::LengthMismatch {
                horizon: self.horizon,
                prices: self.prices.len(),
                pv_ratio: self.pv_ratio.len(),
            });
        }

        for (t, &price) in self.prices.iter().enumerate() {
            check_finite(&format!("prices[{t}]"), price)?;
        }
        check_finite("tau_imp", self.tau_imp)?;
        check_finite("tau_exp", self.tau_exp)?;

        for (field, value) in [
            ("Gmax_imp", self.gmax_imp),
            ("Gmax_exp", self.gmax_exp),
            ("c_pen_imp", self.c_pen_imp),
            ("c_pen_exp", self.c_pen_exp),
            ("Lmax", self.l_max),
            ("Ppv_max", self.ppv_max),
            ("Emin", self.e_min),
        ] {
            check_non_negative(field, value)?;
        }

        for (field, value) in [
            ("rhoL_up", self.rho_l_up),
            ("rhoL_dn", self.rho_l_dn),
            ("rhoPV_up", self.rho_pv_up),
            ("rhoPV_dn", self.rho_pv_dn),
        ] {
            check_unit_interval(field, value)?;
        }
        for (t, &ratio) in self.pv_ratio.iter().enumerate() {
            check_unit_interval(&format!("pv_ratio[{t}]"), ratio)?;
        }

        Ok(())
    }

    /// PV energy available at step `t`
    pub fn pv_available(&self, t: usize) -> f64 {
        self.ppv_max * self.pv_ratio[t]
    }
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingField(field.to_string())
}

fn required<T: Clone>(value: &Option<T>, field: &str) -> Result<T, ValidationError> {
    value.clone().ok_or_else(|| missing(field))
}

fn check_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite(field.to_string()))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_unit_interval(field: &str, value: f64) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
