use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use holesynth::config::{Config, OraclePolicy, SearchConfig};
use holesynth::error::{EvalError, OracleError, SynthError, TranslationError};
use holesynth::eval::{Evaluator, Substitution};
use holesynth::expr::{BinopKind, Expr, Sort, UnopKind, Variable};
use holesynth::grammar::Program;
use holesynth::oracle::{Oracle, Verdict, Verifier};
use holesynth::problems::{self, Problem};
use holesynth::search::{synthesize, ExhaustionReason, Outcome, Search, SearchStep};
use holesynth::synth::fixed::FixedSearch;
use holesynth::synth::Candidate;

pub const EASY_SEARCH_LIMIT: usize = 50;

pub fn run_tests_with_z3<F>(f: F)
where
    F: FnOnce(z3::Context),
{
    let _ = colog::default_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let cfg = z3::Config::default();
    let ctx = z3::Context::new(&cfg);

    f(ctx)
}

fn easy_config() -> Config {
    Config {
        iteration_budget: EASY_SEARCH_LIMIT,
        ..Config::default()
    }
}

fn solved(outcome: Outcome) -> (String, usize) {
    match outcome {
        Outcome::Solved { candidate, iterations } => (candidate.to_string(), iterations),
        other => panic!("expected a solution, got {other:?}"),
    }
}

fn single(hole: &str, expr: Expr) -> Candidate {
    [(hole.to_string(), expr)].into_iter().collect()
}

fn add(x: &Variable, v: i64) -> Expr {
    Expr::binop(BinopKind::Plus, Expr::var(x), Expr::Int(v))
}

/// Hands out canned verdicts in order, then accepts everything.
struct Scripted(RefCell<VecDeque<Verdict>>);

impl Scripted {
    fn new(verdicts: impl IntoIterator<Item = Verdict>) -> Self {
        Self(RefCell::new(verdicts.into_iter().collect()))
    }
}

impl Verifier for Scripted {
    fn check_valid(&self, _formula: &Expr) -> Result<Verdict, TranslationError> {
        Ok(self.0.borrow_mut().pop_front().unwrap_or(Verdict::Valid))
    }
}

fn three_tries() -> FixedSearch {
    let x = Variable::int("x");

    FixedSearch::new([
        single("h", Expr::var(&x)),
        single("h", add(&x, 2)),
        single("h", add(&x, 1)),
    ])
}

fn flaky() -> Scripted {
    Scripted::new([
        Verdict::Error(OracleError::Timeout),
        Verdict::Invalid { counterexample: None },
    ])
}

#[test]
fn test_oracle_validity() {
    run_tests_with_z3(|z3| {
        let oracle = Oracle::new(&z3);
        let x = Variable::int("x");

        let refl = Expr::binop(BinopKind::Eq, Expr::var(&x), Expr::var(&x));
        assert_eq!(oracle.check_valid(&refl), Ok(Verdict::Valid));

        let irrefl = Expr::binop(BinopKind::Gt, Expr::var(&x), Expr::var(&x));
        assert!(matches!(
            oracle.check_valid(&irrefl),
            Ok(Verdict::Invalid { counterexample: Some(_) }),
        ));

        // Not every formula is either valid or unsatisfiable
        let positive = Expr::binop(BinopKind::Gt, Expr::var(&x), Expr::Int(0));
        assert!(matches!(
            oracle.check_valid(&positive),
            Ok(Verdict::Invalid { .. }),
        ));
    });
}

#[test]
fn test_oracle_operators() {
    run_tests_with_z3(|z3| {
        let oracle = Oracle::with_timeout(&z3, Some(Duration::from_secs(5)));
        let x = Variable::int("x");
        let b = Variable::bool("b");

        // abs(x) >= 0
        let abs = Expr::binop(
            BinopKind::Ge,
            Expr::unop(UnopKind::Abs, Expr::var(&x)),
            Expr::Int(0),
        );
        // (b ? x : -x) != x ==> !b
        let ite = Expr::binop(
            BinopKind::Implies,
            Expr::binop(
                BinopKind::Neq,
                Expr::ite(
                    Expr::var(&b),
                    Expr::var(&x),
                    Expr::unop(UnopKind::Negate, Expr::var(&x)),
                ),
                Expr::var(&x),
            ),
            Expr::unop(UnopKind::Not, Expr::var(&b)),
        );
        // (x * 2) / 2 == x
        let div = Expr::binop(
            BinopKind::Eq,
            Expr::binop(
                BinopKind::Div,
                Expr::binop(BinopKind::Times, Expr::var(&x), Expr::Int(2)),
                Expr::Int(2),
            ),
            Expr::var(&x),
        );

        for formula in [abs, ite, div] {
            assert_eq!(oracle.check_valid(&formula), Ok(Verdict::Valid), "{formula}");
        }
    });
}

#[test]
fn test_oracle_rejects_malformed() {
    run_tests_with_z3(|z3| {
        let oracle = Oracle::new(&z3);
        let x = Variable::int("x");

        assert_eq!(
            oracle.check_valid(&Expr::binop(BinopKind::Eq, Expr::var(&x), Expr::IntSlot)),
            Err(TranslationError::NotConcrete("(x == <int>)".to_string())),
        );
        assert_eq!(
            oracle.check_valid(&Expr::Int(1)),
            Err(TranslationError::IllSorted {
                expr: "1".to_string(),
                expected: Sort::Bool,
                found: Sort::Int,
            }),
        );
        assert!(matches!(
            oracle.check_valid(&Expr::binop(
                BinopKind::Eq,
                Expr::var(&x),
                Expr::var(&Variable::bool("x")),
            )),
            Err(TranslationError::ConflictingSorts { .. }),
        ));
    });
}

#[test]
fn test_unknown_reasons() {
    assert_eq!(OracleError::from_reason("timeout".to_string()), OracleError::Timeout);
    assert_eq!(OracleError::from_reason("canceled".to_string()), OracleError::Timeout);
    assert_eq!(
        OracleError::from_reason("(incomplete (theory arithmetic))".to_string()),
        OracleError::Unknown("(incomplete (theory arithmetic))".to_string()),
    );
}

#[test]
fn test_substitution() {
    let program = problems::odd_successor().unwrap();
    let x = Variable::int("x");

    let reduced = Substitution.reduce(&program, &single("h", add(&x, 1))).unwrap();
    assert_eq!(reduced.to_string(), "(((x % 2) == 0) ==> (((x + 1) % 2) == 1))");

    assert_eq!(
        Substitution.reduce(&program, &Candidate::default()),
        Err(EvalError::UndefinedHole("h".to_string())),
    );
    assert_eq!(
        Substitution.reduce(&program, &single("h", Expr::IntSlot)),
        Err(EvalError::NotConcrete(
            "(((x % 2) == 0) ==> ((<int> % 2) == 1))".to_string(),
        )),
    );
}

#[test]
fn test_odd_successor() {
    run_tests_with_z3(|z3| {
        let program = Problem::OddSuccessor.build().unwrap();
        let outcome = synthesize(&z3, &program, &easy_config()).unwrap();

        assert_eq!(solved(outcome), ("{h = (x + 1)}".to_string(), 2));
    });
}

#[test]
fn test_odd_successor_unsolvable() {
    run_tests_with_z3(|z3| {
        let program = Problem::OddSuccessorUnsolvable.build().unwrap();

        let config = Config {
            iteration_budget: 10,
            ..Config::default()
        };
        assert_eq!(
            synthesize(&z3, &program, &config),
            Ok(Outcome::Exhausted {
                reason: ExhaustionReason::IterationBudget,
                iterations: 10,
            }),
        );

        // Rounds at depth 5, 10, .., 160, two candidates each
        let config = Config {
            iteration_budget: 100,
            ..Config::default()
        };
        assert_eq!(
            synthesize(&z3, &program, &config),
            Ok(Outcome::Exhausted {
                reason: ExhaustionReason::SearchSpace,
                iterations: 12,
            }),
        );

        let config = Config {
            search: SearchConfig {
                resume: true,
                ..SearchConfig::default()
            },
            ..easy_config()
        };
        assert_eq!(
            synthesize(&z3, &program, &config),
            Ok(Outcome::Exhausted {
                reason: ExhaustionReason::SearchSpace,
                iterations: 2,
            }),
        );
    });
}

#[test]
fn test_builtin_problems() {
    run_tests_with_z3(|z3| {
        let expected = [
            (Problem::Max2, "{h = ((x > y) ? x : y)}", 8),
            (Problem::Offset, "{h = (x + 3)}", 14),
            (Problem::SplitSum, "{a = x, b = 1}", 3),
        ];

        for (problem, answer, iterations) in expected {
            let program = problem.build().unwrap();
            let outcome = synthesize(&z3, &program, &easy_config()).unwrap();

            assert_eq!(solved(outcome), (answer.to_string(), iterations), "{problem:?}");
        }
    });
}

#[test]
fn test_search_steps() {
    run_tests_with_z3(|z3| {
        let program = problems::odd_successor().unwrap();
        let x = Variable::int("x");
        let synth = FixedSearch::new([
            single("h", add(&x, 2)),
            single("h", add(&x, -1)),
        ]);
        let mut search = Search::new(&program, synth, Substitution, Oracle::new(&z3));

        assert!(matches!(
            search.step(),
            Ok(Some(SearchStep::Rejected { counterexample: Some(_), .. })),
        ));
        assert_eq!(
            search.step(),
            Ok(Some(SearchStep::Accepted {
                candidate: single("h", add(&x, -1)),
            })),
        );
        assert_eq!(search.step(), Ok(None));
        assert_eq!(search.iterations(), 2);
    });
}

#[test]
fn test_search_is_resumable() {
    run_tests_with_z3(|z3| {
        let program = problems::odd_successor().unwrap();
        let x = Variable::int("x");
        let synth = FixedSearch::new([
            single("h", Expr::var(&x)),
            single("h", add(&x, 1)),
        ]);
        let mut search = Search::new(&program, synth, Substitution, Oracle::new(&z3));

        assert_eq!(
            search.run(1),
            Ok(Outcome::Exhausted {
                reason: ExhaustionReason::IterationBudget,
                iterations: 1,
            }),
        );
        assert_eq!(solved(search.run(1).unwrap()), ("{h = (x + 1)}".to_string(), 2));
    });
}

#[test]
fn test_fixed_search_runs_dry() {
    run_tests_with_z3(|z3| {
        let program = problems::odd_successor().unwrap();
        let mut search = Search::new(&program, FixedSearch::new([]), Substitution, Oracle::new(&z3));

        assert_eq!(
            search.run(EASY_SEARCH_LIMIT),
            Ok(Outcome::Exhausted {
                reason: ExhaustionReason::SearchSpace,
                iterations: 0,
            }),
        );
    });
}

#[test]
fn test_eval_errors_are_fatal() {
    run_tests_with_z3(|z3| {
        let program = problems::odd_successor().unwrap();
        let synth = FixedSearch::new([Candidate::default()]);
        let mut search = Search::new(&program, synth, Substitution, Oracle::new(&z3));

        assert_eq!(
            search.run(EASY_SEARCH_LIMIT),
            Err(SynthError::Eval(EvalError::UndefinedHole("h".to_string()))),
        );
    });
}

#[test]
fn test_no_holes() {
    run_tests_with_z3(|z3| {
        let x = Variable::int("x");
        let tautology = Expr::binop(BinopKind::Le, Expr::var(&x), add(&x, 1));
        let program = Program::new([x], [], tautology).unwrap();

        let outcome = synthesize(&z3, &program, &easy_config()).unwrap();
        assert_eq!(solved(outcome), ("{}".to_string(), 1));
    });
}

#[test]
fn test_oracle_failure_aborts() {
    let program = problems::odd_successor().unwrap();
    let mut search = Search::new(&program, three_tries(), Substitution, flaky());

    assert_eq!(
        search.run(EASY_SEARCH_LIMIT),
        Ok(Outcome::OracleFailed {
            candidate: single("h", Expr::var(&Variable::int("x"))),
            error: OracleError::Timeout,
            iterations: 1,
        }),
    );

    // Running again moves past the failed candidate
    assert_eq!(
        solved(search.run(EASY_SEARCH_LIMIT).unwrap()),
        ("{h = (x + 1)}".to_string(), 3),
    );
}

#[test]
fn test_oracle_failure_skipped() {
    let program = problems::odd_successor().unwrap();
    let mut search = Search::new(&program, three_tries(), Substitution, flaky())
        .with_policy(OraclePolicy::Skip);

    assert_eq!(
        solved(search.run(EASY_SEARCH_LIMIT).unwrap()),
        ("{h = (x + 1)}".to_string(), 3),
    );
}

#[test]
fn test_skipped_failures_use_budget() {
    let program = problems::odd_successor().unwrap();
    let mut search = Search::new(&program, three_tries(), Substitution, flaky())
        .with_policy(OraclePolicy::Skip);

    assert_eq!(
        search.run(2),
        Ok(Outcome::Exhausted {
            reason: ExhaustionReason::IterationBudget,
            iterations: 2,
        }),
    );
    assert_eq!(search.iterations(), 2);
}
