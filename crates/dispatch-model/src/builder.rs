use std::collections::BTreeMap;
use std::fmt;

use dispatch_solver::{ConstraintId, ConstraintOp, LinearExpr, LpProblem, VarId};
use tracing::debug;

use crate::error::ValidationError;
use crate::params::Parameters;

/// Named groups of constraint rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintFamily {
    /// `pv[t] <= Ppv_max * pv_ratio[t]`
    PvAvail,
    /// `l[t] = pv[t] + gimp[t] - gexp[t]`
    Balance,
    /// `gimp[t] <= Gmax_imp + eimp[t]`
    ImpSoftcap,
    /// `gexp[t] <= Gmax_exp + eexp[t]`
    ExpSoftcap,
    /// `sum(l) >= Emin`, a single row
    DailyMin,
    LoadRampUp,
    LoadRampDown,
    PvRampUp,
    PvRampDown,
}

impl ConstraintFamily {
    pub const ALL: [ConstraintFamily; 9] = [
        ConstraintFamily::PvAvail,
        ConstraintFamily::Balance,
        ConstraintFamily::ImpSoftcap,
        ConstraintFamily::ExpSoftcap,
        ConstraintFamily::DailyMin,
        ConstraintFamily::LoadRampUp,
        ConstraintFamily::LoadRampDown,
        ConstraintFamily::PvRampUp,
        ConstraintFamily::PvRampDown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConstraintFamily::PvAvail => "pv_avail",
            ConstraintFamily::Balance => "balance",
            ConstraintFamily::ImpSoftcap => "imp_softcap",
            ConstraintFamily::ExpSoftcap => "exp_softcap",
            ConstraintFamily::DailyMin => "daily_min",
            ConstraintFamily::LoadRampUp => "l_rup",
            ConstraintFamily::LoadRampDown => "l_rdn",
            ConstraintFamily::PvRampUp => "pv_rup",
            ConstraintFamily::PvRampDown => "pv_rdn",
        }
    }
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-step decision variables, one series per family
#[derive(Debug, Clone)]
pub struct DispatchVariables {
    /// Served load, bounded by `Lmax`
    pub l: Vec<VarId>,
    /// PV energy used
    pub pv: Vec<VarId>,
    /// Grid import
    pub gimp: Vec<VarId>,
    /// Grid export
    pub gexp: Vec<VarId>,
    /// Import above the hard cap
    pub eimp: Vec<VarId>,
    /// Export above the hard cap
    pub eexp: Vec<VarId>,
}

impl DispatchVariables {
    /// All series in output order, with their names
    pub fn series(&self) -> [(&'static str, &[VarId]); 6] {
        [
            ("l", self.l.as_slice()),
            ("pv", self.pv.as_slice()),
            ("gimp", self.gimp.as_slice()),
            ("gexp", self.gexp.as_slice()),
            ("eimp", self.eimp.as_slice()),
            ("eexp", self.eexp.as_slice()),
        ]
    }
}

/// The dispatch LP for one parameter set
///
/// Owns its problem exclusively; it is built, solved once and dropped.
#[derive(Debug)]
pub struct DispatchModel {
    problem: LpProblem,
    vars: DispatchVariables,
    rows: BTreeMap<ConstraintFamily, Vec<ConstraintId>>,
    daily_min: ConstraintId,
    horizon: usize,
}

impl DispatchModel {
    /// Build variables, constraint families and the cost objective
    pub fn build(params: &Parameters) -> Result<Self, ValidationError> {
        params.validate()?;
        let horizon = params.horizon;
        let mut problem = LpProblem::new();

        let vars = DispatchVariables {
            l: add_series(&mut problem, "l", horizon, Some(params.l_max)),
            pv: add_series(&mut problem, "pv", horizon, None),
            gimp: add_series(&mut problem, "gimp", horizon, None),
            gexp: add_series(&mut problem, "gexp", horizon, None),
            eimp: add_series(&mut problem, "eimp", horizon, None),
            eexp: add_series(&mut problem, "eexp", horizon, None),
        };

        let mut rows: BTreeMap<ConstraintFamily, Vec<ConstraintId>> =
            ConstraintFamily::ALL.iter().map(|&family| (family, Vec::new())).collect();
        let mut add = |family: ConstraintFamily, t: Option<usize>, expr: LinearExpr, op: ConstraintOp, rhs: f64| {
            let name = match t {
                Some(t) => format!("{}[{}]", family.name(), t),
                None => family.name().to_string(),
            };
            let id = problem.add_constraint(name, expr, op, rhs);
            rows.entry(family).or_default().push(id);
            id
        };

        let DispatchVariables { l, pv, gimp, gexp, eimp, eexp } = &vars;

        for t in 0..horizon {
            add(ConstraintFamily::PvAvail, Some(t), pv[t].into(), ConstraintOp::Le, params.pv_available(t));
            add(
                ConstraintFamily::Balance,
                Some(t),
                l[t] - pv[t] - gimp[t] + gexp[t],
                ConstraintOp::Eq,
                0.0,
            );
            add(ConstraintFamily::ImpSoftcap, Some(t), gimp[t] - eimp[t], ConstraintOp::Le, params.gmax_imp);
            add(ConstraintFamily::ExpSoftcap, Some(t), gexp[t] - eexp[t], ConstraintOp::Le, params.gmax_exp);
        }

        let daily_min = add(
            ConstraintFamily::DailyMin,
            None,
            l.iter().copied().sum(),
            ConstraintOp::Ge,
            params.e_min,
        );

        for t in 1..horizon {
            add(
                ConstraintFamily::LoadRampUp,
                Some(t),
                l[t] - l[t - 1],
                ConstraintOp::Le,
                params.rho_l_up * params.l_max,
            );
            add(
                ConstraintFamily::LoadRampDown,
                Some(t),
                l[t - 1] - l[t],
                ConstraintOp::Le,
                params.rho_l_dn * params.l_max,
            );
            add(
                ConstraintFamily::PvRampUp,
                Some(t),
                pv[t] - pv[t - 1],
                ConstraintOp::Le,
                params.rho_pv_up * params.ppv_max,
            );
            add(
                ConstraintFamily::PvRampDown,
                Some(t),
                pv[t - 1] - pv[t],
                ConstraintOp::Le,
                params.rho_pv_dn * params.ppv_max,
            );
        }

        // Import pays price plus tariff, export earns price minus tariff,
        // excess beyond the hard caps pays the penalty
        let objective: LinearExpr = (0..horizon)
            .map(|t| {
                let price = params.prices[t];
                (price + params.tau_imp) * gimp[t] - (price - params.tau_exp) * gexp[t]
                    + params.c_pen_imp * eimp[t]
                    + params.c_pen_exp * eexp[t]
            })
            .sum();
        problem.set_objective(objective, true);

        debug!(
            horizon,
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "built dispatch model"
        );

        Ok(Self {
            problem,
            vars,
            rows,
            daily_min,
            horizon,
        })
    }

    pub fn problem(&self) -> &LpProblem {
        &self.problem
    }

    pub fn variables(&self) -> &DispatchVariables {
        &self.vars
    }

    /// Row ids of one constraint family, in step order
    pub fn rows(&self, family: ConstraintFamily) -> &[ConstraintId] {
        self.rows.get(&family).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The single `daily_min` row
    pub fn daily_min_row(&self) -> ConstraintId {
        self.daily_min
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }
}

fn add_series(problem: &mut LpProblem, name: &str, horizon: usize, upper: Option<f64>) -> Vec<VarId> {
    (0..horizon)
        .map(|t| problem.add_variable(format!("{name}[{t}]"), upper))
        .collect()
}
