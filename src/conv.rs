use std::collections::HashMap;

use log::trace;
use z3::ast::{Ast, Bool, Int};

use crate::{
    error::TranslationError,
    expr::{BinopKind, Expr, Sort, UnopKind, Variable},
};

/// A translated term, tagged with its sort.
#[derive(Debug, Clone)]
pub enum Term<'ctx> {
    Int(Int<'ctx>),
    Bool(Bool<'ctx>),
}

impl<'ctx> Term<'ctx> {
    pub fn sort(&self) -> Sort {
        match self {
            Term::Int(_) => Sort::Int,
            Term::Bool(_) => Sort::Bool,
        }
    }
}

fn expect_int<'ctx>(expr: &Expr, term: Term<'ctx>) -> Result<Int<'ctx>, TranslationError> {
    match term {
        Term::Int(x) => Ok(x),
        Term::Bool(_) => Err(TranslationError::IllSorted {
            expr: expr.to_string(),
            expected: Sort::Int,
            found: Sort::Bool,
        }),
    }
}

fn expect_bool<'ctx>(expr: &Expr, term: Term<'ctx>) -> Result<Bool<'ctx>, TranslationError> {
    match term {
        Term::Bool(x) => Ok(x),
        Term::Int(_) => Err(TranslationError::IllSorted {
            expr: expr.to_string(),
            expected: Sort::Bool,
            found: Sort::Int,
        }),
    }
}

/// Equality of two terms of the same sort.
fn equal<'ctx>(r: &Expr, l: Term<'ctx>, rt: Term<'ctx>) -> Result<Bool<'ctx>, TranslationError> {
    match (l, rt) {
        (Term::Int(a), Term::Int(b)) => Ok(a._eq(&b)),
        (Term::Bool(a), Term::Bool(b)) => Ok(a._eq(&b)),
        (l, rt) => Err(TranslationError::IllSorted {
            expr: r.to_string(),
            expected: l.sort(),
            found: rt.sort(),
        }),
    }
}

/// Translates concrete expressions into z3 integer and boolean terms.
/// Variables are created on first use and shared afterwards.
pub struct ExprToZ3<'ctx> {
    z3: &'ctx z3::Context,
    vars: HashMap<String, Term<'ctx>>,
}

impl<'ctx> ExprToZ3<'ctx> {
    pub fn new(z3: &'ctx z3::Context) -> Self {
        Self {
            z3,
            vars: HashMap::new(),
        }
    }

    pub fn get_variable(&self, name: &str) -> Option<&Term<'ctx>> {
        self.vars.get(name)
    }

    /// Translates a boolean formula.
    pub fn formula(&mut self, expr: &Expr) -> Result<Bool<'ctx>, TranslationError> {
        if !expr.is_concrete() {
            return Err(TranslationError::NotConcrete(expr.to_string()));
        }

        let term = self.term(expr)?;
        expect_bool(expr, term)
    }

    pub fn term(&mut self, expr: &Expr) -> Result<Term<'ctx>, TranslationError> {
        trace!("Convert to z3: {expr}");

        match expr {
            Expr::Int(v) => Ok(Term::Int(Int::from_i64(self.z3, *v))),
            Expr::Bool(b) => Ok(Term::Bool(Bool::from_bool(self.z3, *b))),
            Expr::Var(v) => self.variable(v),
            Expr::Unop(kind, e) => self.unop(*kind, e),
            Expr::Binop(kind, lr) => self.binop(*kind, &lr.0, &lr.1),
            Expr::Ite(cte) => {
                let (c, t, f) = (&cte.0, &cte.1, &cte.2);
                let cond = self.term(c)?;
                let cond = expect_bool(c, cond)?;

                match (self.term(t)?, self.term(f)?) {
                    (Term::Int(t), Term::Int(f)) => Ok(Term::Int(cond.ite(&t, &f))),
                    (Term::Bool(t), Term::Bool(f)) => Ok(Term::Bool(cond.ite(&t, &f))),
                    (t, f_term) => Err(TranslationError::IllSorted {
                        expr: f.to_string(),
                        expected: t.sort(),
                        found: f_term.sort(),
                    }),
                }
            },
            Expr::VarSlot(_) | Expr::IntSlot | Expr::Symbol(_) => {
                Err(TranslationError::NotConcrete(expr.to_string()))
            },
        }
    }

    fn variable(&mut self, v: &Variable) -> Result<Term<'ctx>, TranslationError> {
        trace!("Var: {v:?}");

        if let Some(term) = self.vars.get(&v.name) {
            if term.sort() != v.sort {
                return Err(TranslationError::ConflictingSorts {
                    name: v.name.clone(),
                    first: term.sort(),
                    second: v.sort,
                });
            }

            return Ok(term.clone());
        }

        let term = match v.sort {
            Sort::Int => Term::Int(Int::new_const(self.z3, v.name.as_str())),
            Sort::Bool => Term::Bool(Bool::new_const(self.z3, v.name.as_str())),
        };
        self.vars.insert(v.name.clone(), term.clone());

        Ok(term)
    }

    fn unop(&mut self, kind: UnopKind, e: &Expr) -> Result<Term<'ctx>, TranslationError> {
        let term = self.term(e)?;

        Ok(match kind {
            UnopKind::Not => Term::Bool(expect_bool(e, term)?.not()),
            UnopKind::Negate => Term::Int(expect_int(e, term)?.unary_minus()),
            UnopKind::Abs => {
                let x = expect_int(e, term)?;
                let zero = Int::from_i64(self.z3, 0);

                Term::Int(x.ge(&zero).ite(&x, &x.unary_minus()))
            },
        })
    }

    fn binop(
        &mut self,
        kind: BinopKind,
        l: &Expr,
        r: &Expr,
    ) -> Result<Term<'ctx>, TranslationError> {
        let z3 = self.z3;
        let lt = self.term(l)?;
        let rt = self.term(r)?;

        Ok(match kind {
            BinopKind::Plus => Term::Int(Int::add(z3, &[&expect_int(l, lt)?, &expect_int(r, rt)?])),
            BinopKind::Minus => Term::Int(Int::sub(z3, &[&expect_int(l, lt)?, &expect_int(r, rt)?])),
            BinopKind::Times => Term::Int(Int::mul(z3, &[&expect_int(l, lt)?, &expect_int(r, rt)?])),
            BinopKind::Div => Term::Int(expect_int(l, lt)?.div(&expect_int(r, rt)?)),
            BinopKind::Mod => Term::Int(expect_int(l, lt)?.modulo(&expect_int(r, rt)?)),
            BinopKind::Lt => Term::Bool(expect_int(l, lt)?.lt(&expect_int(r, rt)?)),
            BinopKind::Le => Term::Bool(expect_int(l, lt)?.le(&expect_int(r, rt)?)),
            BinopKind::Gt => Term::Bool(expect_int(l, lt)?.gt(&expect_int(r, rt)?)),
            BinopKind::Ge => Term::Bool(expect_int(l, lt)?.ge(&expect_int(r, rt)?)),
            BinopKind::And => Term::Bool(Bool::and(z3, &[&expect_bool(l, lt)?, &expect_bool(r, rt)?])),
            BinopKind::Or => Term::Bool(Bool::or(z3, &[&expect_bool(l, lt)?, &expect_bool(r, rt)?])),
            BinopKind::Implies => Term::Bool(expect_bool(l, lt)?.implies(&expect_bool(r, rt)?)),
            BinopKind::Eq => Term::Bool(equal(r, lt, rt)?),
            BinopKind::Neq => Term::Bool(equal(r, lt, rt)?.not()),
        })
    }
}
