use thiserror::Error;

use crate::expr::{ExprVal, Sort};

/// Authoring defects in a grammar. Never recoverable by trying another
/// candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("grammar has no rules")]
    Empty,
    #[error("rule for '{0}' has no productions")]
    EmptyRule(String),
    #[error("symbol '{0}' has more than one rule")]
    DuplicateRule(String),
    #[error("symbol '{symbol}' has no rule (used in '{template}')")]
    UnknownSymbol {
        symbol: String,
        template: String,
    },
    #[error("sort mismatch in '{context}': expected {expected}, found {found}")]
    SortMismatch {
        context: String,
        expected: Sort,
        found: Sort,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("integer range [{start}, {end}) is empty")]
    EmptyIntRange {
        start: ExprVal,
        end: ExprVal,
    },
}

/// Errors raised while loading a program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("hole '{0}' is declared twice")]
    DuplicateHole(String),
    #[error("hole '{0}' has the same name as a program variable")]
    HoleShadowsVariable(String),
    #[error("hole '{hole}' may use '{var}', which is not a program variable")]
    UndeclaredVariable {
        hole: String,
        var: String,
    },
    #[error("the program condition must be boolean, found {0}")]
    ConditionSort(Sort),
}

/// Something other than a concrete, well-sorted formula reached the oracle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("'{0}' is not concrete")]
    NotConcrete(String),
    #[error("'{expr}' is ill-sorted: expected {expected}, found {found}")]
    IllSorted {
        expr: String,
        expected: Sort,
        found: Sort,
    },
    #[error("variable '{name}' is used both as {first} and as {second}")]
    ConflictingSorts {
        name: String,
        first: Sort,
        second: Sort,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("hole '{0}' has no expression in the candidate")]
    UndefinedHole(String),
    #[error("reduced condition '{0}' is not concrete")]
    NotConcrete(String),
}

/// Solver failures. These are reported as results, not raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("solver timed out")]
    Timeout,
    #[error("solver gave up: {0}")]
    Unknown(String),
}

impl OracleError {
    /// Classifies the reason z3 gives for an `unknown` result.
    pub fn from_reason(reason: String) -> Self {
        if reason.contains("timeout") || reason.contains("canceled") {
            OracleError::Timeout
        } else {
            OracleError::Unknown(reason)
        }
    }
}

/// Fatal errors of a synthesis session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthError {
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("program error: {0}")]
    Program(#[from] ProgramError),
    #[error("translation error: {0}")]
    Translation(#[from] TranslationError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}
