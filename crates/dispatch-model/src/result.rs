use dispatch_solver::{SolutionStatus, VarId};
use serde::{Deserialize, Serialize};

use crate::adapter::SolveOutcome;
use crate::builder::{ConstraintFamily, DispatchModel};
use crate::params::Parameters;

/// Output record of one dispatch solve
///
/// Either fully populated, or status-only with `null` series entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Numeric solve status (2 = optimal)
    pub status: i32,
    #[serde(rename = "obj_val_DKK")]
    pub obj_val: Option<f64>,
    pub params: Parameters,
    pub series: Series,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<Totals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duals: Option<Duals>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub l: Vec<Option<f64>>,
    pub pv: Vec<Option<f64>>,
    pub gimp: Vec<Option<f64>>,
    pub gexp: Vec<Option<f64>>,
    pub eimp: Vec<Option<f64>>,
    pub eexp: Vec<Option<f64>>,
}

impl Series {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[Option<f64>])> {
        [
            ("l", self.l.as_slice()),
            ("pv", self.pv.as_slice()),
            ("gimp", self.gimp.as_slice()),
            ("gexp", self.gexp.as_slice()),
            ("eimp", self.eimp.as_slice()),
            ("eexp", self.eexp.as_slice()),
        ]
        .into_iter()
    }
}

/// Horizon sums of each series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub sum_l: f64,
    pub sum_pv: f64,
    pub sum_imp: f64,
    pub sum_exp: f64,
    pub sum_eimp: f64,
    pub sum_eexp: f64,
}

/// Shadow prices keyed by constraint family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duals {
    /// Energy balance, per step
    pub mu: Vec<f64>,
    /// Daily minimum energy
    pub lambda: f64,
    pub pv_avail: Vec<f64>,
    pub imp_softcap: Vec<f64>,
    pub exp_softcap: Vec<f64>,
    pub l_rup: Vec<f64>,
    pub l_rdn: Vec<f64>,
    pub pv_rup: Vec<f64>,
    pub pv_rdn: Vec<f64>,
}

impl DispatchResult {
    pub fn solution_status(&self) -> Option<SolutionStatus> {
        SolutionStatus::from_code(self.status)
    }

    pub fn is_optimal(&self) -> bool {
        self.solution_status() == Some(SolutionStatus::Optimal)
    }

    /// `sum_l - (sum_pv + sum_imp - sum_exp)`, zero up to solver tolerance
    pub fn balance_residual(&self) -> Option<f64> {
        self.totals
            .as_ref()
            .map(|t| t.sum_l - (t.sum_pv + t.sum_imp - t.sum_exp))
    }
}

/// Reads primal and dual values out of a solved model
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultExtractor {
    extract_duals: bool,
}

impl ResultExtractor {
    pub fn new(extract_duals: bool) -> Self {
        Self { extract_duals }
    }

    pub fn extract(&self, model: &DispatchModel, params: &Parameters, outcome: &SolveOutcome) -> DispatchResult {
        let vars = model.variables();
        let read = |series: &[VarId]| -> Vec<Option<f64>> { series.iter().map(|&var| outcome.value(var)).collect() };

        let series = Series {
            l: read(vars.l.as_slice()),
            pv: read(vars.pv.as_slice()),
            gimp: read(vars.gimp.as_slice()),
            gexp: read(vars.gexp.as_slice()),
            eimp: read(vars.eimp.as_slice()),
            eexp: read(vars.eexp.as_slice()),
        };

        let solved = outcome.solution_count() > 0;

        let totals = solved.then(|| Totals {
            sum_l: total(&series.l),
            sum_pv: total(&series.pv),
            sum_imp: total(&series.gimp),
            sum_exp: total(&series.gexp),
            sum_eimp: total(&series.eimp),
            sum_eexp: total(&series.eexp),
        });

        // Every row of the model has a dual once solved; a short vector is a backend bug
        let duals = (solved && self.extract_duals).then(|| {
            let row_duals = &outcome.solution().duals;
            let family = |f: ConstraintFamily| -> Vec<f64> {
                model.rows(f).iter().map(|row| row_duals[row.index()]).collect()
            };
            Duals {
                mu: family(ConstraintFamily::Balance),
                lambda: row_duals[model.daily_min_row().index()],
                pv_avail: family(ConstraintFamily::PvAvail),
                imp_softcap: family(ConstraintFamily::ImpSoftcap),
                exp_softcap: family(ConstraintFamily::ExpSoftcap),
                l_rup: family(ConstraintFamily::LoadRampUp),
                l_rdn: family(ConstraintFamily::LoadRampDown),
                pv_rup: family(ConstraintFamily::PvRampUp),
                pv_rdn: family(ConstraintFamily::PvRampDown),
            }
        });

        DispatchResult {
            status: outcome.status().code(),
            obj_val: outcome.objective(),
            params: params.clone(),
            series,
            totals,
            duals,
        }
    }
}

fn total(series: &[Option<f64>]) -> f64 {
    series.iter().flatten().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{SolveOptions, SolverAdapter};
    use crate::testing::{day_ahead_params, scenario_params};
    use dispatch_solver::{Analysis, LpBackend, LpProblem, Solution, SolverError};

    const EPS: f64 = 1e-6;

    fn solve(params: &Parameters, extract_duals: bool) -> DispatchResult {
        let model = DispatchModel::build(params).unwrap();
        let outcome = SolverAdapter::from_options(&SolveOptions::default())
            .solve(&model)
            .unwrap();
        ResultExtractor::new(extract_duals).extract(&model, params, &outcome)
    }

    fn values(series: &[Option<f64>]) -> Vec<f64> {
        series
            .iter()
            .map(|v| v.expect("solved series has no nulls"))
            .collect()
    }

    #[test]
    fn test_no_mandated_energy_stays_idle() {
        let result = solve(&scenario_params(0.0), false);

        assert!(result.is_optimal());
        assert_eq!(result.status, 2);
        assert!(result.obj_val.unwrap().abs() < EPS, "obj = {:?}", result.obj_val);
        for (name, series) in result.series.iter() {
            assert_eq!(series.len(), 2);
            for v in values(series) {
                assert!(v.abs() < EPS, "{name} = {v}");
            }
        }
        assert!(result.duals.is_none());
    }

    #[test]
    fn test_minimum_energy_is_imported() {
        let result = solve(&scenario_params(5.0), true);

        assert!(result.is_optimal());
        let obj = result.obj_val.unwrap();
        assert!((obj - 7.5).abs() < EPS, "obj = {obj} (expected 7.5)");

        let totals = result.totals.as_ref().unwrap();
        assert!((totals.sum_l - 5.0).abs() < EPS, "sum_l = {}", totals.sum_l);
        assert!((totals.sum_imp - 5.0).abs() < EPS);
        assert!(totals.sum_exp.abs() < EPS);
        assert!(totals.sum_pv.abs() < EPS);
        assert!(totals.sum_eimp.abs() < EPS);

        let l = values(&result.series.l);
        let gimp = values(&result.series.gimp);
        for t in 0..2 {
            assert!((l[t] - gimp[t]).abs() < EPS);
        }

        // Each extra kWh of mandated energy is one more imported kWh at 1.0 + 0.5
        let duals = result.duals.as_ref().unwrap();
        assert!((duals.lambda - 1.5).abs() < EPS, "lambda = {}", duals.lambda);
        assert_eq!(duals.mu.len(), 2);
        for mu in &duals.mu {
            assert!((mu + 1.5).abs() < EPS, "mu = {mu}");
        }
        assert_eq!(duals.pv_avail.len(), 2);
        assert_eq!(duals.l_rup.len(), 1);
        assert_eq!(duals.pv_rdn.len(), 1);
    }

    #[test]
    fn test_unreachable_minimum_is_infeasible() {
        // Emin = 25 > T * Lmax = 20
        let result = solve(&scenario_params(25.0), true);

        assert!(!result.is_optimal());
        assert_eq!(result.solution_status(), Some(SolutionStatus::Infeasible));
        assert_eq!(result.obj_val, None);
        for (name, series) in result.series.iter() {
            assert_eq!(series.len(), 2, "{name}");
            assert!(series.iter().all(Option::is_none), "{name} has values");
        }
        assert!(result.totals.is_none());
        assert!(result.duals.is_none());
        assert_eq!(result.balance_residual(), None);
        assert_eq!(result.params.e_min, 25.0);
    }

    #[test]
    fn test_soft_cap_excess_is_penalized() {
        let mut params = scenario_params(10.0);
        params.gmax_imp = 2.0;
        params.c_pen_imp = 3.0;

        let result = solve(&params, true);
        assert!(result.is_optimal());

        // 10 kWh imported, 6 of them above the 2 kW cap in the two steps
        let obj = result.obj_val.unwrap();
        assert!((obj - 33.0).abs() < EPS, "obj = {obj} (expected 33)");
        let totals = result.totals.as_ref().unwrap();
        assert!((totals.sum_eimp - 6.0).abs() < EPS, "sum_eimp = {}", totals.sum_eimp);

        let gimp = values(&result.series.gimp);
        let eimp = values(&result.series.eimp);
        for t in 0..2 {
            assert!(gimp[t] <= params.gmax_imp + eimp[t] + EPS);
        }

        let duals = result.duals.as_ref().unwrap();
        assert!((duals.lambda - 4.5).abs() < EPS, "lambda = {}", duals.lambda);
        for d in &duals.imp_softcap {
            assert!((d + 3.0).abs() < EPS, "imp_softcap dual = {d}");
        }
    }

    #[test]
    fn test_day_ahead_dispatch_properties() {
        let params = day_ahead_params();
        let result = solve(&params, true);
        assert!(result.is_optimal(), "status = {}", result.status);

        let l = values(&result.series.l);
        let pv = values(&result.series.pv);
        let gimp = values(&result.series.gimp);
        let gexp = values(&result.series.gexp);
        let eimp = values(&result.series.eimp);
        let eexp = values(&result.series.eexp);

        for t in 0..params.horizon {
            assert!((l[t] - (pv[t] + gimp[t] - gexp[t])).abs() < EPS, "balance at {t}");
            assert!(l[t] >= -EPS && l[t] <= params.l_max + EPS, "l[{t}] = {}", l[t]);
            assert!(pv[t] <= params.pv_available(t) + EPS, "pv[{t}] = {}", pv[t]);
            for v in [pv[t], gimp[t], gexp[t], eimp[t], eexp[t]] {
                assert!(v >= -EPS);
            }
            assert!(gimp[t] <= params.gmax_imp + eimp[t] + EPS);
            assert!(gexp[t] <= params.gmax_exp + eexp[t] + EPS);
        }

        assert!(l.iter().sum::<f64>() >= params.e_min - EPS);

        for t in 1..params.horizon {
            assert!(l[t] - l[t - 1] <= params.rho_l_up * params.l_max + EPS, "l ramp up at {t}");
            assert!(l[t - 1] - l[t] <= params.rho_l_dn * params.l_max + EPS, "l ramp down at {t}");
            assert!(pv[t] - pv[t - 1] <= params.rho_pv_up * params.ppv_max + EPS, "pv ramp up at {t}");
            assert!(pv[t - 1] - pv[t] <= params.rho_pv_dn * params.ppv_max + EPS, "pv ramp down at {t}");
        }

        // Reported objective matches the cost of the reported dispatch
        let cost: f64 = (0..params.horizon)
            .map(|t| {
                let p = params.prices[t];
                (p + params.tau_imp) * gimp[t] - (p - params.tau_exp) * gexp[t]
                    + params.c_pen_imp * eimp[t]
                    + params.c_pen_exp * eexp[t]
            })
            .sum();
        assert!((result.obj_val.unwrap() - cost).abs() < 1e-5);
        assert!(result.balance_residual().unwrap().abs() < 1e-5);

        // Minimization: >= rows price non-negative, <= rows non-positive
        let duals = result.duals.as_ref().unwrap();
        assert_eq!(duals.mu.len(), 24);
        assert_eq!(duals.l_rup.len(), 23);
        assert!(duals.lambda >= -EPS);
        for d in duals
            .pv_avail
            .iter()
            .chain(&duals.imp_softcap)
            .chain(&duals.exp_softcap)
            .chain(&duals.l_rup)
            .chain(&duals.l_rdn)
            .chain(&duals.pv_rup)
            .chain(&duals.pv_rdn)
        {
            assert!(*d <= EPS, "inequality dual {d} has the wrong sign");
        }
    }

    #[test]
    fn test_result_record_shape() {
        let solved = serde_json::to_value(solve(&scenario_params(5.0), false)).unwrap();
        assert_eq!(solved["status"], 2);
        assert!(solved["obj_val_DKK"].is_number());
        assert_eq!(solved["params"]["Emin"], 5.0);
        assert_eq!(solved["series"]["gimp"].as_array().unwrap().len(), 2);
        assert!(solved["totals"]["sum_l"].is_number());
        assert!(solved.get("duals").is_none());

        let failed = serde_json::to_value(solve(&scenario_params(25.0), true)).unwrap();
        assert_eq!(failed["status"], 3);
        assert!(failed["obj_val_DKK"].is_null());
        assert!(failed["series"]["l"][0].is_null());
        assert!(failed.get("totals").is_none());
        assert!(failed.get("duals").is_none());
    }

    /// Reports an optimum without any row duals
    struct DualFreeBackend;

    impl LpBackend for DualFreeBackend {
        fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
            Ok(Solution {
                status: SolutionStatus::Optimal,
                values: vec![0.0; problem.num_variables()],
                objective_value: 0.0,
                duals: Vec::new(),
                analysis: Analysis::default(),
            })
        }
    }

    #[test]
    fn test_daily_min_dual_is_its_own_row() {
        let params = scenario_params(5.0);
        let model = DispatchModel::build(&params).unwrap();
        let outcome = SolverAdapter::from_options(&SolveOptions::default())
            .solve(&model)
            .unwrap();
        let result = ResultExtractor::new(true).extract(&model, &params, &outcome);

        let lambda = outcome.dual(model.daily_min_row()).unwrap();
        assert_eq!(result.duals.unwrap().lambda, lambda);
        assert!((lambda - 1.5).abs() < EPS);
    }

    #[test]
    #[should_panic]
    fn test_missing_row_duals_are_not_zeroed() {
        let params = scenario_params(5.0);
        let model = DispatchModel::build(&params).unwrap();
        let outcome = SolverAdapter::new(DualFreeBackend).solve(&model).unwrap();

        ResultExtractor::new(true).extract(&model, &params, &outcome);
    }
}
