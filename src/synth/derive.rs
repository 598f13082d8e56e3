//! Lazy, depth-bounded expansion of grammar templates.
//!
//! A [`Derivation`] is an explicit state machine standing in for a
//! generator: every call to `next` resumes exactly where the previous one
//! stopped. Composite templates are expanded as an odometer over their
//! children, with child derivations restarted from scratch whenever they
//! wrap around.

use std::{cell::Cell, rc::Rc};

use log::trace;

use crate::{
    config::{IntRange, SearchConfig, Strategy},
    error::GrammarError,
    expr::{Expr, ExprVal, Sort, Variable},
    grammar::{Grammar, HoleDecl, Rule},
};

/// A concrete expression together with its derivation depth: the number of
/// nested symbol substitutions on its deepest path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    pub expr: Expr,
    pub depth: u32,
}

impl Derived {
    fn leaf(expr: Expr) -> Self {
        Self { expr, depth: 0 }
    }

    fn substituted(self) -> Self {
        Self {
            expr: self.expr,
            depth: self.depth + 1,
        }
    }
}

/// Shared by every node of one derivation tree.
#[derive(Clone)]
struct Env<'g> {
    grammar: &'g Grammar,
    scope: &'g [Variable],
    strategy: Strategy,
    ints: IntRange,
    truncated: Rc<Cell<bool>>,
}

enum State<'g> {
    Done,
    Failed(Option<GrammarError>),
    Once(Option<&'g Expr>),
    Vars {
        sort: Sort,
        next: usize,
    },
    Ints {
        next: ExprVal,
    },
    Alternatives {
        rule: &'g Rule,
        next: usize,
        current: Option<Box<Derivation<'g>>>,
    },
    Product(Box<Product<'g>>),
}

/// All concrete expressions derivable from a template within a depth budget.
///
/// With budget `d`, a symbol yields exactly the derivations of depth at most
/// `d + 1`. Productions are tried in the grammar's cost order; the order of
/// child combinations is picked by the [`Strategy`].
pub struct Derivation<'g> {
    budget: i64,
    env: Env<'g>,
    state: State<'g>,
}

impl<'g> Derivation<'g> {
    pub fn new(
        template: &'g Expr,
        grammar: &'g Grammar,
        scope: &'g [Variable],
        budget: i64,
        config: &SearchConfig,
    ) -> Self {
        let env = Env {
            grammar,
            scope,
            strategy: config.strategy,
            ints: config.int_range,
            truncated: Rc::new(Cell::new(false)),
        };

        // An empty child ends a product before later children are built, so
        // stray symbols have to be caught here.
        let stray = template.symbols()
            .into_iter()
            .find(|symbol| grammar.rule(symbol).is_none());
        if let Some(symbol) = stray {
            return Self {
                budget,
                env,
                state: State::Failed(Some(GrammarError::UnknownSymbol {
                    symbol: symbol.name.clone(),
                    template: template.to_string(),
                })),
            };
        }

        Self::with_env(template, budget, env)
    }

    /// Derives a hole's start symbol.
    pub fn for_hole(hole: &'g HoleDecl, budget: i64, config: &SearchConfig) -> Self {
        Self::new(
            hole.grammar().start(),
            hole.grammar(),
            hole.scope(),
            budget,
            config,
        )
    }

    fn with_env(template: &'g Expr, budget: i64, env: Env<'g>) -> Self {
        let state = Self::initial_state(template, budget, &env);

        Self {
            budget,
            env,
            state,
        }
    }

    fn initial_state(template: &'g Expr, budget: i64, env: &Env<'g>) -> State<'g> {
        match template {
            Expr::VarSlot(sort) => State::Vars {
                sort: *sort,
                next: 0,
            },
            Expr::IntSlot => State::Ints {
                next: env.ints.start,
            },
            Expr::Symbol(symbol) => {
                let Some(rule) = env.grammar.rule(symbol) else {
                    return State::Failed(Some(GrammarError::UnknownSymbol {
                        symbol: symbol.name.clone(),
                        template: template.to_string(),
                    }));
                };

                if budget < 0 {
                    env.truncated.set(true);
                    return State::Done;
                }

                State::Alternatives {
                    rule,
                    next: 0,
                    current: None,
                }
            },
            _ if template.is_concrete() => State::Once(Some(template)),
            _ => State::Product(Box::new(Product::new(template, env.strategy))),
        }
    }

    /// Whether some branch of this derivation was cut off by the budget.
    /// A pass that finishes without being truncated has produced the whole
    /// language of its template.
    pub fn truncated(&self) -> bool {
        self.env.truncated.get()
    }

    /// Drops the derivation depths.
    pub fn exprs(self) -> impl Iterator<Item = Result<Expr, GrammarError>> + 'g {
        self.map(|res| res.map(|derived| derived.expr))
    }

    fn advance(&mut self) -> Option<Result<Derived, GrammarError>> {
        let Self { budget, env, state } = self;

        match state {
            State::Done => None,
            State::Failed(err) => err.take().map(Err),
            State::Once(expr) => expr.take()
                .map(|expr| Ok(Derived::leaf(expr.clone()))),
            State::Vars { sort, next } => {
                let (idx, var) = env.scope.iter()
                    .enumerate()
                    .skip(*next)
                    .find(|(_, var)| var.sort == *sort)?;
                *next = idx + 1;

                Some(Ok(Derived::leaf(Expr::Var(var.clone()))))
            },
            State::Ints { next } => {
                if *next >= env.ints.end {
                    return None;
                }
                let val = *next;
                *next += 1;

                Some(Ok(Derived::leaf(Expr::Int(val))))
            },
            State::Alternatives { rule, next, current } => loop {
                let rule: &'g Rule = *rule;

                if let Some(derivation) = current {
                    match derivation.next() {
                        Some(res) => return Some(res.map(Derived::substituted)),
                        None => *current = None,
                    }
                }

                let production = rule.productions().get(*next)?;
                *next += 1;
                trace!("Expanding {} -> {production}", rule.symbol().name);

                *current = Some(Box::new(Derivation::with_env(
                    production,
                    *budget - 1,
                    env.clone(),
                )));
            },
            State::Product(product) => product.advance(*budget, env),
        }
    }
}

impl<'g> Iterator for Derivation<'g> {
    type Item = Result<Derived, GrammarError>;

    fn next(&mut self) -> Option<Self::Item> {
        let res = self.advance();

        // Errors are fatal, don't keep going after one
        if let Some(Err(_)) = &res {
            self.state = State::Done;
        }

        res
    }
}

/// Cross product of the children of a composite template.
struct Product<'g> {
    template: &'g Expr,
    slots: Vec<&'g Expr>,
    /// Child positions, outermost loop first.
    order: Vec<usize>,
    cursors: Vec<Derivation<'g>>,
    current: Vec<Derived>,
    exhausted: bool,
}

impl<'g> Product<'g> {
    fn new(template: &'g Expr, strategy: Strategy) -> Self {
        let slots = template.children();
        let order = strategy.child_order(slots.len());

        Self {
            template,
            slots,
            order,
            cursors: Vec::new(),
            current: Vec::new(),
            exhausted: false,
        }
    }

    fn advance(
        &mut self,
        budget: i64,
        env: &Env<'g>,
    ) -> Option<Result<Derived, GrammarError>> {
        if self.exhausted {
            return None;
        }

        let moved = if self.cursors.is_empty() {
            self.start(budget, env)
        } else {
            self.increment(budget, env)
        };

        match moved {
            Ok(true) => Some(Ok(self.assemble())),
            Ok(false) => {
                self.exhausted = true;
                None
            },
            Err(err) => Some(Err(err)),
        }
    }

    fn start(&mut self, budget: i64, env: &Env<'g>) -> Result<bool, GrammarError> {
        self.cursors = self.slots.iter()
            .map(|&slot| Derivation::with_env(slot, budget, env.clone()))
            .collect();

        let mut current = Vec::with_capacity(self.cursors.len());
        for cursor in &mut self.cursors {
            match cursor.next() {
                Some(Ok(derived)) => current.push(derived),
                Some(Err(err)) => return Err(err),
                // One empty child empties the whole product.
                None => return Ok(false),
            }
        }
        self.current = current;

        Ok(true)
    }

    fn increment(&mut self, budget: i64, env: &Env<'g>) -> Result<bool, GrammarError> {
        for &pos in self.order.iter().rev() {
            match self.cursors[pos].next() {
                Some(Ok(derived)) => {
                    self.current[pos] = derived;
                    return Ok(true);
                },
                Some(Err(err)) => return Err(err),
                None => (),
            }

            // This position wrapped around: restart it and carry into the
            // next outer one.
            let mut restarted = Derivation::with_env(self.slots[pos], budget, env.clone());
            match restarted.next() {
                Some(Ok(derived)) => self.current[pos] = derived,
                Some(Err(err)) => return Err(err),
                None => return Ok(false),
            }
            self.cursors[pos] = restarted;
        }

        // The outermost position wrapped too, we are done.
        Ok(false)
    }

    fn assemble(&self) -> Derived {
        let depth = self.current.iter()
            .map(|derived| derived.depth)
            .max()
            .unwrap_or(0);
        let children = self.current.iter()
            .map(|derived| derived.expr.clone())
            .collect();

        Derived {
            expr: self.template.rebuild(children),
            depth,
        }
    }
}
