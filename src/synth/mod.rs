pub mod cursor;
pub mod derive;
pub mod enumerate;
pub mod fixed;

use std::fmt;

use crate::{error::SynthError, expr::Expr};

/// One expression for every hole of a program, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Candidate {
    assignment: Vec<(String, Expr)>,
}

impl Candidate {
    pub fn get(&self, hole: &str) -> Option<&Expr> {
        self.assignment.iter()
            .find(|(name, _)| name == hole)
            .map(|(_, expr)| expr)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.assignment.iter().map(|(name, expr)| (name.as_str(), expr))
    }

    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }
}

impl FromIterator<(String, Expr)> for Candidate {
    fn from_iter<T: IntoIterator<Item = (String, Expr)>>(iter: T) -> Self {
        Self {
            assignment: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (name, expr)) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} = {expr}")?;
        }
        f.write_str("}")
    }
}

/// A synthesizer is an iterator-like structure producing hole completions.
/// Synthesizers don't learn from rejected candidates.
pub trait Synthesizer {
    /// Query the synthesizer for the next candidate to try. `None` means it
    /// can no longer provide any new candidate.
    fn next_candidate(&mut self) -> Result<Option<Candidate>, SynthError>;
}
