//! Shared fixtures for unit tests.

use crate::params::Parameters;

/// Two-step case without PV: flat prices, generous caps, free ramps
pub(crate) fn scenario_params(e_min: f64) -> Parameters {
    Parameters {
        horizon: 2,
        prices: vec![1.0, 1.0],
        tau_imp: 0.5,
        tau_exp: 0.4,
        gmax_imp: 100.0,
        gmax_exp: 100.0,
        c_pen_imp: 0.0,
        c_pen_exp: 0.0,
        l_max: 10.0,
        rho_l_up: 1.0,
        rho_l_dn: 1.0,
        ppv_max: 0.0,
        rho_pv_up: 1.0,
        rho_pv_dn: 1.0,
        pv_ratio: vec![0.0, 0.0],
        e_min,
    }
}

/// A 24-step day with a PV bell curve, tight grid caps and binding ramps
pub(crate) fn day_ahead_params() -> Parameters {
    let prices = vec![
        0.62, 0.58, 0.55, 0.53, 0.55, 0.64, 0.85, 1.10, 1.25, 1.05, 0.90, 0.80, 0.72, 0.70, 0.75, 0.88,
        1.15, 1.45, 1.60, 1.40, 1.10, 0.92, 0.78, 0.68,
    ];
    let pv_ratio = vec![
        0.0, 0.0, 0.0, 0.0, 0.0, 0.02, 0.10, 0.25, 0.42, 0.60, 0.75, 0.86, 0.90, 0.86, 0.75, 0.58,
        0.38, 0.18, 0.05, 0.0, 0.0, 0.0, 0.0, 0.0,
    ];
    Parameters {
        horizon: 24,
        prices,
        tau_imp: 0.5,
        tau_exp: 0.4,
        gmax_imp: 3.0,
        gmax_exp: 3.0,
        c_pen_imp: 2.0,
        c_pen_exp: 2.0,
        l_max: 5.0,
        rho_l_up: 0.4,
        rho_l_dn: 0.3,
        ppv_max: 6.0,
        rho_pv_up: 0.5,
        rho_pv_dn: 0.5,
        pv_ratio,
        e_min: 8.0 * 5.0,
    }
}

/// A raw four-record case as an external loader would hand it over
pub(crate) fn raw_input_json() -> serde_json::Value {
    serde_json::json!({
        "bus": {
            "bus_id": "B1",
            "energy_price_DKK_per_kWh": [1.2, 0.8, 0.5, 1.5],
            "import_tariff_DKK/kWh": 0.5,
            "export_tariff_DKK/kWh": 0.4,
            "max_import_kW": 5.0,
            "max_export_kW": 4.0,
            "penalty_excess_import_DKK/kWh": 10.0,
            "penalty_excess_export_DKK/kWh": 10.0
        },
        "appliance": {
            "load": [{
                "load_id": "L1",
                "max_load_kWh_per_hour": 3.0,
                "max_ramp_rate_up_ratio": 0.5,
                "max_ramp_rate_down_ratio": 0.5
            }],
            "DER": [{
                "DER_id": "PV1",
                "max_power_kW": 4.0,
                "max_ramp_rate_up_ratio": 0.6,
                "max_ramp_rate_down_ratio": 0.6
            }]
        },
        "der_profile": {
            "hourly_profile_ratio": [0.0, 0.5, 1.0, 0.25]
        },
        "usage": {
            "consumer_id": "C1",
            "load_preferences": [{
                "min_total_energy_per_day_hour_equivalent": 2.0
            }]
        }
    })
}
