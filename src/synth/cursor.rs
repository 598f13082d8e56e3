use log::debug;

use crate::{
    config::{SearchConfig, DEPTH_GROWTH},
    error::GrammarError,
    expr::Expr,
    grammar::HoleDecl,
};

use super::derive::{Derivation, Derived};

pub enum CursorState<'g> {
    Active {
        max_depth: u32,
        derivation: Derivation<'g>,
    },
    Exhausted {
        max_depth: u32,
    },
}

/// Search state of one hole: a depth-bounded pass over its grammar that is
/// restarted at twice the depth whenever it runs dry.
///
/// Restarting re-derives every candidate of the earlier, shallower passes,
/// unless [`SearchConfig::resume`] is set.
pub struct HoleCursor<'g> {
    hole: &'g HoleDecl,
    config: SearchConfig,
    state: CursorState<'g>,
    restarts: u32,
    /// Some pass at the current depth was cut short by the budget.
    truncated: bool,
    /// Derivation depth fully covered by earlier passes.
    covered: Option<u32>,
    lookahead: Option<Derived>,
}

impl<'g> HoleCursor<'g> {
    pub fn new(hole: &'g HoleDecl, config: SearchConfig) -> Self {
        let max_depth = config.initial_depth.max(1);

        Self {
            hole,
            config,
            state: Self::active(hole, max_depth, &config),
            restarts: 0,
            truncated: false,
            covered: None,
            lookahead: None,
        }
    }

    fn active(hole: &'g HoleDecl, max_depth: u32, config: &SearchConfig) -> CursorState<'g> {
        CursorState::Active {
            max_depth,
            derivation: Derivation::for_hole(hole, i64::from(max_depth), config),
        }
    }

    pub fn hole(&self) -> &'g HoleDecl {
        self.hole
    }

    pub fn state(&self) -> &CursorState<'g> {
        &self.state
    }

    pub fn max_depth(&self) -> u32 {
        match &self.state {
            CursorState::Active { max_depth, .. } | CursorState::Exhausted { max_depth } => *max_depth,
        }
    }

    /// How many times the depth was doubled.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Whether a pass at the current depth hit the depth budget.
    pub fn pass_truncated(&self) -> bool {
        match &self.state {
            CursorState::Active { derivation, .. } => self.truncated || derivation.truncated(),
            CursorState::Exhausted { .. } => self.truncated,
        }
    }

    /// Whether `derived` was out of reach of every earlier pass.
    pub fn is_fresh(&self, derived: &Derived) -> bool {
        self.covered.map_or(true, |covered| derived.depth > covered)
    }

    /// The next candidate of the current pass. Moves to `Exhausted` instead
    /// of restarting when the pass runs dry.
    pub fn pull_in_pass(&mut self) -> Result<Option<Derived>, GrammarError> {
        let CursorState::Active { max_depth, derivation } = &mut self.state else {
            return Ok(None);
        };

        if let Some(derived) = derivation.next().transpose()? {
            return Ok(Some(derived));
        }

        let max_depth = *max_depth;
        self.truncated |= derivation.truncated();
        self.state = CursorState::Exhausted { max_depth };
        debug!(
            "Hole {}: pass at depth {max_depth} exhausted (truncated: {})",
            self.hole.name(),
            self.truncated,
        );

        Ok(None)
    }

    /// Starts the current pass over, at the same depth.
    pub fn rewind(&mut self) {
        if let CursorState::Active { derivation, .. } = &self.state {
            self.truncated |= derivation.truncated();
        }
        self.state = Self::active(self.hole, self.max_depth(), &self.config);
    }

    /// Replaces the current pass with one twice as deep. Returns `false`
    /// once that would go past the depth limit; the cursor then stays
    /// exhausted for good.
    pub fn deepen(&mut self) -> bool {
        let max_depth = self.max_depth();
        let deeper = max_depth.saturating_mul(DEPTH_GROWTH);

        if deeper > self.config.depth_limit || deeper == max_depth {
            debug!(
                "Hole {}: depth limit {} reached",
                self.hole.name(),
                self.config.depth_limit,
            );
            self.state = CursorState::Exhausted { max_depth };
            return false;
        }

        debug!("Hole {}: restarting at depth {deeper}", self.hole.name());
        self.covered = Some(max_depth.saturating_add(1));
        self.truncated = false;
        self.restarts += 1;
        self.state = Self::active(self.hole, deeper, &self.config);

        true
    }

    /// Looks at the next candidate without consuming it.
    pub fn peek(&mut self) -> Result<Option<&Expr>, GrammarError> {
        if self.lookahead.is_none() {
            self.lookahead = self.next_derived()?;
        }

        Ok(self.lookahead.as_ref().map(|derived| &derived.expr))
    }

    /// The next candidate of this hole.
    ///
    /// When the current pass runs dry the cursor goes `Exhausted`, restarts
    /// at twice the depth and retries once. With `resume`, it keeps deepening
    /// as long as deeper passes can still produce something new, and ends
    /// the sequence once a pass proves the language finite.
    pub fn pull(&mut self) -> Result<Option<Expr>, GrammarError> {
        let derived = match self.lookahead.take() {
            Some(derived) => Some(derived),
            None => self.next_derived()?,
        };

        Ok(derived.map(|derived| derived.expr))
    }

    fn next_derived(&mut self) -> Result<Option<Derived>, GrammarError> {
        let mut retried = false;

        loop {
            if let Some(derived) = self.pull_in_pass()? {
                if !self.config.resume || self.is_fresh(&derived) {
                    return Ok(Some(derived));
                }
                continue;
            }

            let give_up = if self.config.resume {
                !self.pass_truncated()
            } else {
                retried
            };
            if give_up || !self.deepen() {
                return Ok(None);
            }
            retried = true;
        }
    }
}
