use log::{debug, info, warn};

use crate::{
    config::{Config, OraclePolicy},
    error::{OracleError, SynthError},
    eval::{Evaluator, Substitution},
    grammar::Program,
    oracle::{Oracle, Verdict, Verifier},
    synth::{enumerate::Enumerator, Candidate, Synthesizer},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchStep {
    Rejected {
        candidate: Candidate,
        counterexample: Option<String>,
    },
    Accepted {
        candidate: Candidate,
    },
    OracleFailed {
        candidate: Candidate,
        error: OracleError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExhaustionReason {
    /// The iteration budget ran out.
    IterationBudget,
    /// The synthesizer ran out of candidates, either because the space is
    /// finite or because the depth limit was hit.
    SearchSpace,
}

/// How a search ended. None of these are errors: running out of budget is
/// not a proof that no completion exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Solved {
        candidate: Candidate,
        iterations: usize,
    },
    Exhausted {
        reason: ExhaustionReason,
        iterations: usize,
    },
    OracleFailed {
        candidate: Candidate,
        error: OracleError,
        iterations: usize,
    },
}

/// Pulls candidates from a synthesizer and checks them against a program
/// until one makes the program's condition valid.
pub struct Search<'a, S, O, E = Substitution> {
    program: &'a Program,
    synth: S,
    evaluator: E,
    oracle: O,
    policy: OraclePolicy,
    iterations: usize,
}

impl<'a, S: Synthesizer, O: Verifier, E: Evaluator> Search<'a, S, O, E> {
    pub fn new(
        program: &'a Program,
        synth: S,
        evaluator: E,
        oracle: O,
    ) -> Self {
        Self {
            program,
            synth,
            evaluator,
            oracle,
            policy: OraclePolicy::default(),
            iterations: 0,
        }
    }

    pub fn with_policy(mut self, policy: OraclePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Candidates checked so far, over every `step` and `run`.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Checks one candidate. `None` once the synthesizer has nothing left.
    pub fn step(&mut self) -> Result<Option<SearchStep>, SynthError> {
        let Some(candidate) = self.synth.next_candidate()? else {
            return Ok(None);
        };
        self.iterations += 1;

        debug!("Try: {candidate}");

        let condition = self.evaluator.reduce(self.program, &candidate)?;
        let step = match self.oracle.check_valid(&condition)? {
            Verdict::Valid => SearchStep::Accepted { candidate },
            Verdict::Invalid { counterexample } => {
                debug!("Rejected, counterexample: {counterexample:?}");
                SearchStep::Rejected {
                    candidate,
                    counterexample,
                }
            },
            Verdict::Error(error) => SearchStep::OracleFailed { candidate, error },
        };

        Ok(Some(step))
    }

    /// Runs at most `budget` more iterations. Can be called again to pick up
    /// where the previous run stopped, e.g. to skip past an oracle failure.
    pub fn run(&mut self, budget: usize) -> Result<Outcome, SynthError> {
        for _ in 0..budget {
            let Some(step) = self.step()? else {
                info!("Out of candidates after {} iterations", self.iterations);
                return Ok(Outcome::Exhausted {
                    reason: ExhaustionReason::SearchSpace,
                    iterations: self.iterations,
                });
            };

            match step {
                SearchStep::Accepted { candidate } => {
                    info!("Found {candidate} after {} iterations", self.iterations);
                    return Ok(Outcome::Solved {
                        candidate,
                        iterations: self.iterations,
                    });
                },
                SearchStep::Rejected { .. } => (),
                SearchStep::OracleFailed { candidate, error } => match self.policy {
                    OraclePolicy::Abort => {
                        return Ok(Outcome::OracleFailed {
                            candidate,
                            error,
                            iterations: self.iterations,
                        });
                    },
                    OraclePolicy::Skip => warn!("Skipping {candidate}: {error}"),
                },
            }
        }

        info!("No solution within {budget} iterations");

        Ok(Outcome::Exhausted {
            reason: ExhaustionReason::IterationBudget,
            iterations: self.iterations,
        })
    }
}

/// Enumerates completions for every hole of `program` and returns the first
/// one under which the program's condition is valid.
pub fn synthesize(
    z3: &z3::Context,
    program: &Program,
    config: &Config,
) -> Result<Outcome, SynthError> {
    info!(
        "Synthesizing {} hole(s), strategy {:?}, budget {}",
        program.holes().len(),
        config.search.strategy,
        config.iteration_budget,
    );

    let synth = Enumerator::new(program, config.search);
    let oracle = Oracle::with_timeout(z3, config.oracle_timeout);
    let mut search = Search::new(program, synth, Substitution, oracle)
        .with_policy(config.oracle_policy);

    search.run(config.iteration_budget)
}
