use crate::{
    error::{GrammarError, ProgramError},
    expr::{Expr, Sort, Variable},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: String,
    pub sort: Sort,
}

impl Symbol {
    pub fn new(name: impl Into<String>, sort: Sort) -> Self {
        Self {
            name: name.into(),
            sort,
        }
    }

    pub fn expr(&self) -> Expr {
        Expr::Symbol(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    symbol: Symbol,
    productions: Vec<Expr>,
}

impl Rule {
    pub fn new(symbol: Symbol, productions: impl IntoIterator<Item = Expr>) -> Self {
        Self {
            symbol,
            productions: productions.into_iter().collect(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn productions(&self) -> &[Expr] {
        &self.productions
    }
}

/// How many nonterminals a production introduces when it is substituted.
pub fn expansion_cost(production: &Expr) -> usize {
    production.symbols().len()
}

/// A validated set of rules. The first rule's symbol is the start symbol.
///
/// Productions of every rule are kept sorted by ascending
/// [`expansion_cost`], terminal-only productions first. The sort is stable,
/// so ties keep their declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    rules: Vec<Rule>,
    start: Expr,
}

impl Grammar {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Result<Self, GrammarError> {
        let mut rules = rules.into_iter().collect::<Vec<_>>();
        let start = match rules.first() {
            Some(rule) => rule.symbol.expr(),
            None => return Err(GrammarError::Empty),
        };

        for (idx, rule) in rules.iter().enumerate() {
            let name = &rule.symbol.name;
            if rules[..idx].iter().any(|other| &other.symbol.name == name) {
                return Err(GrammarError::DuplicateRule(name.clone()));
            }
            if rule.productions.is_empty() {
                return Err(GrammarError::EmptyRule(name.clone()));
            }
        }

        for rule in &rules {
            for production in &rule.productions {
                Self::check_production(&rules, rule, production)?;
            }
        }

        for rule in &mut rules {
            rule.productions.sort_by_key(expansion_cost);
        }

        Ok(Self { rules, start })
    }

    fn check_production(
        rules: &[Rule],
        rule: &Rule,
        production: &Expr,
    ) -> Result<(), GrammarError> {
        if production.sort() != rule.symbol.sort {
            return Err(GrammarError::SortMismatch {
                context: format!("{} -> {production}", rule.symbol.name),
                expected: rule.symbol.sort,
                found: production.sort(),
            });
        }

        for used in production.symbols() {
            let target = rules.iter()
                .find(|other| other.symbol.name == used.name)
                .ok_or_else(|| GrammarError::UnknownSymbol {
                    symbol: used.name.clone(),
                    template: production.to_string(),
                })?;

            if target.symbol.sort != used.sort {
                return Err(GrammarError::SortMismatch {
                    context: production.to_string(),
                    expected: target.symbol.sort,
                    found: used.sort,
                });
            }
        }

        Ok(())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, symbol: &Symbol) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.symbol.name == symbol.name)
    }

    /// The start symbol, as a template.
    pub fn start(&self) -> &Expr {
        &self.start
    }

    pub fn sort(&self) -> Sort {
        self.start.sort()
    }
}

/// A named placeholder, its grammar and the variables it may reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleDecl {
    name: String,
    grammar: Grammar,
    scope: Vec<Variable>,
}

impl HoleDecl {
    pub fn new(
        name: impl Into<String>,
        grammar: Grammar,
        scope: impl IntoIterator<Item = Variable>,
    ) -> Self {
        Self {
            name: name.into(),
            grammar,
            scope: scope.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn scope(&self) -> &[Variable] {
        &self.scope
    }

    /// The variable standing for this hole inside a program condition.
    pub fn variable(&self) -> Variable {
        Variable::new(self.name.clone(), self.grammar.sort())
    }
}

/// A program reduced to the part synthesis cares about: its variables, its
/// holes and the condition that has to hold for every variable assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    vars: Vec<Variable>,
    holes: Vec<HoleDecl>,
    condition: Expr,
}

impl Program {
    pub fn new(
        vars: impl IntoIterator<Item = Variable>,
        holes: impl IntoIterator<Item = HoleDecl>,
        condition: Expr,
    ) -> Result<Self, ProgramError> {
        let vars = vars.into_iter().collect::<Vec<_>>();
        let holes = holes.into_iter().collect::<Vec<_>>();

        for (idx, hole) in holes.iter().enumerate() {
            if holes[..idx].iter().any(|other| other.name == hole.name) {
                return Err(ProgramError::DuplicateHole(hole.name.clone()));
            }
            if vars.iter().any(|v| v.name == hole.name) {
                return Err(ProgramError::HoleShadowsVariable(hole.name.clone()));
            }
            if let Some(stray) = hole.scope.iter().find(|v| !vars.contains(v)) {
                return Err(ProgramError::UndeclaredVariable {
                    hole: hole.name.clone(),
                    var: stray.name.clone(),
                });
            }
        }

        if condition.sort() != Sort::Bool {
            return Err(ProgramError::ConditionSort(condition.sort()));
        }

        Ok(Self {
            vars,
            holes,
            condition,
        })
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn holes(&self) -> &[HoleDecl] {
        &self.holes
    }

    pub fn hole(&self, name: &str) -> Option<&HoleDecl> {
        self.holes.iter().find(|hole| hole.name == name)
    }

    pub fn hole_can_use(&self, name: &str) -> Option<&[Variable]> {
        self.hole(name).map(HoleDecl::scope)
    }

    pub fn condition(&self) -> &Expr {
        &self.condition
    }
}
