//! Small synthesis problems shipped with the binary.

use crate::{
    error::SynthError,
    expr::{BinopKind, Expr, Sort, Variable},
    grammar::{Grammar, HoleDecl, Program, Rule, Symbol},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Problem {
    /// `h` is odd whenever `x` is even, with `h -> x | x + 1 | x - 1`.
    OddSuccessor,
    /// Same condition, with `h -> x | x + 2`. Has no solution.
    OddSuccessorUnsolvable,
    /// `h` is the maximum of `x` and `y`.
    Max2,
    /// `h - x == 3`, with `h -> x + <int>`.
    Offset,
    /// `a + b == x + 1` for two holes `a` and `b`.
    SplitSum,
}

impl Problem {
    pub fn build(self) -> Result<Program, SynthError> {
        match self {
            Problem::OddSuccessor => odd_successor(),
            Problem::OddSuccessorUnsolvable => odd_successor_unsolvable(),
            Problem::Max2 => max2(),
            Problem::Offset => offset(),
            Problem::SplitSum => split_sum(),
        }
    }
}

fn int(v: i64) -> Expr {
    Expr::Int(v)
}

fn bin(kind: BinopKind, l: Expr, r: Expr) -> Expr {
    Expr::binop(kind, l, r)
}

/// `(x % 2 == 0) ==> (h % 2 == 1)`
fn odd_when_even(x: &Variable, h: &Variable) -> Expr {
    let parity = |v: &Variable| bin(BinopKind::Mod, Expr::var(v), int(2));

    bin(
        BinopKind::Implies,
        bin(BinopKind::Eq, parity(x), int(0)),
        bin(BinopKind::Eq, parity(h), int(1)),
    )
}

fn single_hole(
    x: Variable,
    productions: impl IntoIterator<Item = Expr>,
) -> Result<Program, SynthError> {
    let h = Symbol::new("H", Sort::Int);
    let grammar = Grammar::new([Rule::new(h, productions)])?;
    let hole = HoleDecl::new("h", grammar, [x.clone()]);
    let condition = odd_when_even(&x, &hole.variable());

    Ok(Program::new([x], [hole], condition)?)
}

pub fn odd_successor() -> Result<Program, SynthError> {
    let x = Variable::int("x");

    single_hole(x.clone(), [
        Expr::var(&x),
        bin(BinopKind::Plus, Expr::var(&x), int(1)),
        bin(BinopKind::Minus, Expr::var(&x), int(1)),
    ])
}

pub fn odd_successor_unsolvable() -> Result<Program, SynthError> {
    let x = Variable::int("x");

    single_hole(x.clone(), [
        Expr::var(&x),
        bin(BinopKind::Plus, Expr::var(&x), int(2)),
    ])
}

/// `H -> G | (C ? G : G)`, `C -> G > G | G >= G`, `G -> <var:int>`
pub fn max2() -> Result<Program, SynthError> {
    let x = Variable::int("x");
    let y = Variable::int("y");
    let h = Symbol::new("H", Sort::Int);
    let c = Symbol::new("C", Sort::Bool);
    let g = Symbol::new("G", Sort::Int);

    let grammar = Grammar::new([
        Rule::new(h, [
            g.expr(),
            Expr::ite(c.expr(), g.expr(), g.expr()),
        ]),
        Rule::new(c, [
            bin(BinopKind::Gt, g.expr(), g.expr()),
            bin(BinopKind::Ge, g.expr(), g.expr()),
        ]),
        Rule::new(g, [Expr::VarSlot(Sort::Int)]),
    ])?;
    let hole = HoleDecl::new("h", grammar, [x.clone(), y.clone()]);
    let res = Expr::var(&hole.variable());

    let condition = bin(
        BinopKind::And,
        bin(
            BinopKind::And,
            bin(BinopKind::Ge, res.clone(), Expr::var(&x)),
            bin(BinopKind::Ge, res.clone(), Expr::var(&y)),
        ),
        bin(
            BinopKind::Or,
            bin(BinopKind::Eq, res.clone(), Expr::var(&x)),
            bin(BinopKind::Eq, res, Expr::var(&y)),
        ),
    );

    Ok(Program::new([x, y], [hole], condition)?)
}

pub fn offset() -> Result<Program, SynthError> {
    let x = Variable::int("x");
    let h = Symbol::new("H", Sort::Int);
    let grammar = Grammar::new([
        Rule::new(h, [bin(BinopKind::Plus, Expr::var(&x), Expr::IntSlot)]),
    ])?;
    let hole = HoleDecl::new("h", grammar, [x.clone()]);

    let condition = bin(
        BinopKind::Eq,
        bin(BinopKind::Minus, Expr::var(&hole.variable()), Expr::var(&x)),
        int(3),
    );

    Ok(Program::new([x], [hole], condition)?)
}

/// Two holes over `A -> <var:int> | 0 | 1`.
pub fn split_sum() -> Result<Program, SynthError> {
    let x = Variable::int("x");
    let grammar = || {
        Grammar::new([Rule::new(
            Symbol::new("A", Sort::Int),
            [Expr::VarSlot(Sort::Int), int(0), int(1)],
        )])
    };
    let a = HoleDecl::new("a", grammar()?, [x.clone()]);
    let b = HoleDecl::new("b", grammar()?, [x.clone()]);

    let condition = bin(
        BinopKind::Eq,
        bin(BinopKind::Plus, Expr::var(&a.variable()), Expr::var(&b.variable())),
        bin(BinopKind::Plus, Expr::var(&x), int(1)),
    );

    Ok(Program::new([x], [a, b], condition)?)
}
