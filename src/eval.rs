use crate::{
    error::EvalError,
    expr::Expr,
    grammar::Program,
    synth::Candidate,
};

/// Reduces a program plus a hole assignment to one verification condition.
pub trait Evaluator {
    fn reduce(&self, program: &Program, candidate: &Candidate) -> Result<Expr, EvalError>;
}

/// Plugs each candidate expression in place of the variable naming its hole.
#[derive(Debug, Clone, Copy, Default)]
pub struct Substitution;

impl Evaluator for Substitution {
    fn reduce(&self, program: &Program, candidate: &Candidate) -> Result<Expr, EvalError> {
        let mut missing = None;

        let reduced = program.condition().substitute(&mut |var| {
            program.hole(&var.name)?;

            let completion = candidate.get(&var.name).cloned();
            if completion.is_none() {
                missing.get_or_insert_with(|| var.name.clone());
            }

            completion
        });

        if let Some(hole) = missing {
            return Err(EvalError::UndefinedHole(hole));
        }
        if !reduced.is_concrete() {
            return Err(EvalError::NotConcrete(reduced.to_string()));
        }

        Ok(reduced)
    }
}
