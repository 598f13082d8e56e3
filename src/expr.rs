use std::fmt;

use crate::grammar::Symbol;

pub type ExprVal = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    Int,
    Bool,
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Int => f.write_str("int"),
            Sort::Bool => f.write_str("bool"),
        }
    }
}

/// A program variable. Holes are referenced from a program's condition
/// through variables named after the hole.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: String,
    pub sort: Sort,
}

impl Variable {
    pub fn new(name: impl Into<String>, sort: Sort) -> Self {
        Self {
            name: name.into(),
            sort,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, Sort::Int)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, Sort::Bool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnopKind {
    Not,
    Negate,
    Abs,
}

impl UnopKind {
    pub fn result_sort(self) -> Sort {
        match self {
            UnopKind::Not => Sort::Bool,
            UnopKind::Negate | UnopKind::Abs => Sort::Int,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinopKind {
    Plus,
    Minus,
    Times,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Implies,
}

impl BinopKind {
    pub fn result_sort(self) -> Sort {
        match self {
            BinopKind::Plus
            | BinopKind::Minus
            | BinopKind::Times
            | BinopKind::Div
            | BinopKind::Mod => Sort::Int,
            BinopKind::Eq
            | BinopKind::Neq
            | BinopKind::Lt
            | BinopKind::Le
            | BinopKind::Gt
            | BinopKind::Ge
            | BinopKind::And
            | BinopKind::Or
            | BinopKind::Implies => Sort::Bool,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinopKind::Plus => "+",
            BinopKind::Minus => "-",
            BinopKind::Times => "*",
            BinopKind::Div => "/",
            BinopKind::Mod => "%",
            BinopKind::Eq => "==",
            BinopKind::Neq => "!=",
            BinopKind::Lt => "<",
            BinopKind::Le => "<=",
            BinopKind::Gt => ">",
            BinopKind::Ge => ">=",
            BinopKind::And => "&&",
            BinopKind::Or => "||",
            BinopKind::Implies => "==>",
        }
    }
}

/// Expressions of programs, grammar productions and hole completions.
///
/// `VarSlot`, `IntSlot` and `Symbol` only ever appear inside production
/// templates. An expression free of all three is *concrete*.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Int(ExprVal),
    Bool(bool),
    Var(Variable),
    Unop(UnopKind, Box<Expr>),
    Binop(BinopKind, Box<(Expr, Expr)>),
    Ite(Box<(Expr, Expr, Expr)>),
    /// Any variable of the given sort from the hole's scope.
    VarSlot(Sort),
    /// Any integer literal from the configured window.
    IntSlot,
    /// A nonterminal, expanded through its grammar rule.
    Symbol(Symbol),
}

impl Expr {
    pub fn var(var: &Variable) -> Self {
        Expr::Var(var.clone())
    }

    pub fn unop(kind: UnopKind, e: Expr) -> Self {
        Expr::Unop(kind, Box::new(e))
    }

    pub fn binop(kind: BinopKind, l: Expr, r: Expr) -> Self {
        Expr::Binop(kind, Box::new((l, r)))
    }

    pub fn ite(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Ite(Box::new((cond, then, otherwise)))
    }

    /// The sort this expression is declared to have. Operands are not
    /// checked; that happens on translation.
    pub fn sort(&self) -> Sort {
        match self {
            Expr::Int(_) | Expr::IntSlot => Sort::Int,
            Expr::Bool(_) => Sort::Bool,
            Expr::Var(v) => v.sort,
            Expr::Unop(kind, _) => kind.result_sort(),
            Expr::Binop(kind, _) => kind.result_sort(),
            Expr::Ite(cte) => cte.1.sort(),
            Expr::VarSlot(sort) => *sort,
            Expr::Symbol(s) => s.sort,
        }
    }

    /// Immediate subexpressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Unop(_, e) => vec![e],
            Expr::Binop(_, lr) => vec![&lr.0, &lr.1],
            Expr::Ite(cte) => vec![&cte.0, &cte.1, &cte.2],
            Expr::Int(_)
            | Expr::Bool(_)
            | Expr::Var(_)
            | Expr::VarSlot(_)
            | Expr::IntSlot
            | Expr::Symbol(_) => Vec::new(),
        }
    }

    /// Builds an expression of the same shape as `self` out of new children.
    /// Leaves are returned as they are.
    pub fn rebuild(&self, children: Vec<Expr>) -> Expr {
        // NOTE: a wrong child count here is a bug in the caller
        debug_assert_eq!(children.len(), self.children().len());

        let mut children = children.into_iter();
        let mut next = || children.next().expect("child count mismatch");

        match self {
            Expr::Unop(kind, _) => Expr::Unop(*kind, Box::new(next())),
            Expr::Binop(kind, _) => {
                let l = next();
                let r = next();
                Expr::Binop(*kind, Box::new((l, r)))
            },
            Expr::Ite(_) => {
                let c = next();
                let t = next();
                let f = next();
                Expr::Ite(Box::new((c, t, f)))
            },
            leaf => leaf.clone(),
        }
    }

    /// Pre-order walk over the whole tree.
    pub fn visit<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a Expr),
    {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    pub fn is_concrete(&self) -> bool {
        let mut concrete = true;
        self.visit(&mut |e| {
            if matches!(e, Expr::VarSlot(_) | Expr::IntSlot | Expr::Symbol(_)) {
                concrete = false;
            }
        });

        concrete
    }

    /// Every nonterminal occurrence, in pre-order.
    pub fn symbols(&self) -> Vec<&Symbol> {
        let mut res = Vec::new();
        self.visit(&mut |e| {
            if let Expr::Symbol(s) = e {
                res.push(s);
            }
        });

        res
    }

    /// Replaces variables for which `f` returns an expression.
    pub fn substitute<F>(&self, f: &mut F) -> Expr
    where
        F: FnMut(&Variable) -> Option<Expr>,
    {
        match self {
            Expr::Var(v) => f(v).unwrap_or_else(|| self.clone()),
            Expr::Unop(..) | Expr::Binop(..) | Expr::Ite(..) => {
                let children = self.children()
                    .into_iter()
                    .map(|child| child.substitute(&mut *f))
                    .collect();

                self.rebuild(children)
            },
            Expr::Int(_)
            | Expr::Bool(_)
            | Expr::VarSlot(_)
            | Expr::IntSlot
            | Expr::Symbol(_) => self.clone(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{v}"),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Var(v) => f.write_str(&v.name),
            Expr::Unop(kind, e) => match kind {
                UnopKind::Not => write!(f, "(! {e})"),
                UnopKind::Negate => write!(f, "(- {e})"),
                UnopKind::Abs => write!(f, "abs({e})"),
            },
            Expr::Binop(kind, lr) => write!(f, "({} {} {})", lr.0, kind.symbol(), lr.1),
            Expr::Ite(cte) => write!(f, "({} ? {} : {})", cte.0, cte.1, cte.2),
            Expr::VarSlot(sort) => write!(f, "<var:{sort}>"),
            Expr::IntSlot => f.write_str("<int>"),
            Expr::Symbol(s) => f.write_str(&s.name),
        }
    }
}
