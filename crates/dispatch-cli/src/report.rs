use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use dispatch_model::{DispatchError, DispatchResult, ResultSink};

/// Balance residual above which the text report flags a mismatch
const BALANCE_TOLERANCE: f64 = 1e-6;

fn io_error(e: io::Error) -> DispatchError {
    DispatchError::Io(e.to_string())
}

/// Human readable summary: status, objective, totals, balance check
pub struct TextReport<W: Write> {
    out: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, result: &DispatchResult) -> io::Result<()> {
        let label = result.solution_status().map_or("UNKNOWN", |s| s.label());
        writeln!(self.out, "Status: {} ({})", result.status, label)?;

        let Some(obj) = result.obj_val else {
            writeln!(self.out, "No solution")?;
            return Ok(());
        };
        writeln!(self.out, "Objective: {:.4} DKK", obj)?;

        if let Some(totals) = &result.totals {
            writeln!(self.out)?;
            writeln!(self.out, "Totals (kWh):")?;
            for (name, value) in [
                ("load", totals.sum_l),
                ("pv", totals.sum_pv),
                ("import", totals.sum_imp),
                ("export", totals.sum_exp),
                ("excess import", totals.sum_eimp),
                ("excess export", totals.sum_eexp),
            ] {
                writeln!(self.out, "  {:15} {:10.4}", name, value)?;
            }
        }

        if let Some(residual) = result.balance_residual() {
            let verdict = if residual.abs() <= BALANCE_TOLERANCE { "ok" } else { "MISMATCH" };
            writeln!(self.out)?;
            writeln!(self.out, "Balance check: residual = {:.3e} ({})", residual, verdict)?;
        }

        if let Some(duals) = &result.duals {
            writeln!(self.out)?;
            writeln!(self.out, "Daily minimum dual (lambda): {:.4}", duals.lambda)?;
            writeln!(self.out, "Balance duals (mu):")?;
            for (t, value) in duals.mu.iter().enumerate() {
                writeln!(self.out, "  t={:<3} {:10.4}", t, value)?;
            }
        }

        Ok(())
    }
}

impl<W: Write> ResultSink for TextReport<W> {
    fn accept(&mut self, result: &DispatchResult) -> Result<(), DispatchError> {
        self.write(result).and_then(|_| self.out.flush()).map_err(io_error)
    }
}

/// Writes the result record as pretty JSON
pub struct JsonReport<W: Write> {
    out: W,
}

impl<W: Write> JsonReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonReport<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, DispatchError> {
        let file = File::create(path).map_err(|e| DispatchError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ResultSink for JsonReport<W> {
    fn accept(&mut self, result: &DispatchResult) -> Result<(), DispatchError> {
        serde_json::to_writer_pretty(&mut self.out, result).map_err(|e| DispatchError::Format(e.to_string()))?;
        writeln!(self.out).and_then(|_| self.out.flush()).map_err(io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_model::{Parameters, SolveOptions};

    fn params() -> Parameters {
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
            e_min: 5.0,
        }
    }

    fn solve(params: &Parameters) -> DispatchResult {
        let options = SolveOptions {
            extract_duals: true,
            solver_output: false,
        };
        dispatch_model::Dispatcher::new(options).solve_params(params).unwrap()
    }

    #[test]
    fn test_text_report() {
        let result = solve(&params());
        let mut report = TextReport::new(Vec::new());
        report.accept(&result).unwrap();
        let text = String::from_utf8(report.into_inner()).unwrap();

        assert!(text.starts_with("Status: 2 (OPTIMAL)"), "{text}");
        assert!(text.contains("Objective: 7.5000 DKK"), "{text}");
        assert!(text.contains("(ok)"), "{text}");
        assert!(text.contains("Daily minimum dual (lambda): 1.5000"), "{text}");
    }

    #[test]
    fn test_text_report_without_solution() {
        let mut params = params();
        params.e_min = 25.0;
        let result = solve(&params);

        let mut report = TextReport::new(Vec::new());
        report.accept(&result).unwrap();
        let text = String::from_utf8(report.into_inner()).unwrap();

        assert!(text.starts_with("Status: 3 (INFEASIBLE)"), "{text}");
        assert!(text.contains("No solution"));
        assert!(!text.contains("Totals"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let result = solve(&params());
        let mut report = JsonReport::new(Vec::new());
        report.accept(&result).unwrap();

        let parsed: DispatchResult = serde_json::from_slice(&report.into_inner()).unwrap();
        assert_eq!(parsed.status, 2);
        assert_eq!(parsed.series.l.len(), 2);
        assert!(parsed.duals.is_some());
    }
}
