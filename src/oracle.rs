use std::time::Duration;

use log::{debug, warn};

use crate::{
    conv::ExprToZ3,
    error::{OracleError, TranslationError},
    expr::Expr,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid {
        /// The falsifying assignment, as printed by z3.
        counterexample: Option<String>,
    },
    Error(OracleError),
}

/// Anything that can judge a verification condition.
pub trait Verifier {
    fn check_valid(&self, formula: &Expr) -> Result<Verdict, TranslationError>;
}

/// Decides validity of closed formulas, free variables read as universally
/// quantified. `F` is valid iff `!F` is unsatisfiable, whatever shape `F`
/// has.
pub struct Oracle<'ctx> {
    z3: &'ctx z3::Context,
    solver: z3::Solver<'ctx>,
}

impl<'ctx> Oracle<'ctx> {
    pub fn new(z3: &'ctx z3::Context) -> Self {
        Self::with_timeout(z3, None)
    }

    /// Bounds every check by `timeout`. A check that runs out of time is
    /// reported as [`OracleError::Timeout`].
    pub fn with_timeout(z3: &'ctx z3::Context, timeout: Option<Duration>) -> Self {
        let solver = z3::Solver::new(z3);

        if let Some(timeout) = timeout {
            let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
            let mut params = z3::Params::new(z3);
            params.set_u32("timeout", millis);
            solver.set_params(&params);
        }

        Self { z3, solver }
    }

    pub fn check_valid(&self, formula: &Expr) -> Result<Verdict, TranslationError> {
        let z3_formula = ExprToZ3::new(self.z3).formula(formula)?;

        debug!("Checking validity of {formula}");

        self.solver.push();
        self.solver.assert(&z3_formula.not());
        let z3_verdict = self.solver.check();

        debug!("Z3 verdict on the negation: {z3_verdict:?}");

        let verdict = match z3_verdict {
            z3::SatResult::Unsat => Verdict::Valid,
            z3::SatResult::Sat => Verdict::Invalid {
                counterexample: self.solver.get_model().map(|model| model.to_string()),
            },
            z3::SatResult::Unknown => {
                let reason = self.solver.get_reason_unknown().unwrap_or_default();
                warn!("Z3 could not decide {formula}: {reason}");

                Verdict::Error(OracleError::from_reason(reason))
            },
        };

        self.solver.pop(1);

        Ok(verdict)
    }
}

impl<'ctx> Verifier for Oracle<'ctx> {
    fn check_valid(&self, formula: &Expr) -> Result<Verdict, TranslationError> {
        Oracle::check_valid(self, formula)
    }
}
