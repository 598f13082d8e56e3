use std::collections::HashMap;

use log::{debug, info};

use crate::{
    config::SearchConfig,
    error::{GrammarError, SynthError},
    grammar::{HoleDecl, Program},
};

use super::{
    cursor::HoleCursor,
    derive::Derived,
    Candidate,
    Synthesizer,
};

/// Enumerates joint assignments for all holes of a program.
///
/// The search runs in rounds. Within a round every hole makes one pass at
/// the round's depth and the joint product is walked as nested loops, the
/// last declared hole varying fastest. Once the first hole's pass runs dry
/// all cursors double their depth and the next round starts. Rounds are
/// finite, so every assignment derivable at some depth is eventually tried.
pub struct Enumerator<'p> {
    holes: &'p [HoleDecl],
    config: SearchConfig,
    cursors: HashMap<&'p str, HoleCursor<'p>>,
    current: Vec<Derived>,
    rounds: u32,
    started: bool,
    done: bool,
}

impl<'p> Enumerator<'p> {
    pub fn new(program: &'p Program, config: SearchConfig) -> Self {
        Self {
            holes: program.holes(),
            config,
            cursors: HashMap::new(),
            current: Vec::new(),
            rounds: 0,
            started: false,
            done: false,
        }
    }

    /// Completed rounds so far.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn cursor(&self, hole: &str) -> Option<&HoleCursor<'p>> {
        self.cursors.get(hole)
    }

    // Cursors are created on first use.
    fn cursor_at(&mut self, idx: usize) -> &mut HoleCursor<'p> {
        let holes = self.holes;
        let hole = &holes[idx];
        let config = self.config;

        self.cursors
            .entry(hole.name())
            .or_insert_with(|| HoleCursor::new(hole, config))
    }

    fn advance(&mut self) -> Result<bool, GrammarError> {
        if self.done {
            return Ok(false);
        }

        // Nothing to fill: the empty assignment is the only candidate.
        if self.holes.is_empty() {
            self.done = true;
            return Ok(true);
        }

        if self.started {
            if self.increment()? {
                return Ok(true);
            }

            if self.config.resume && !self.round_truncated() {
                info!("Search space is finite and fully enumerated");
                self.done = true;
                return Ok(false);
            }

            if !self.deepen_all() {
                return Ok(false);
            }
        }
        self.started = true;

        loop {
            let Some(empty) = self.fill()? else {
                return Ok(true);
            };

            // Some hole has nothing at this depth. Only a deeper pass can help,
            // and only if this one was cut short.
            debug!("Hole {} has no candidate at this depth", self.holes[empty].name());
            if !self.cursor_at(empty).pass_truncated() || !self.deepen_all() {
                self.done = true;
                return Ok(false);
            }
        }
    }

    /// Pulls the first candidate of every hole. Returns the index of the
    /// first hole that has none.
    fn fill(&mut self) -> Result<Option<usize>, GrammarError> {
        self.current.clear();

        for idx in 0..self.holes.len() {
            match self.cursor_at(idx).pull_in_pass()? {
                Some(derived) => self.current.push(derived),
                None => return Ok(Some(idx)),
            }
        }

        Ok(None)
    }

    fn increment(&mut self) -> Result<bool, GrammarError> {
        for idx in (0..self.holes.len()).rev() {
            let cursor = self.cursor_at(idx);
            if let Some(derived) = cursor.pull_in_pass()? {
                self.current[idx] = derived;
                return Ok(true);
            }

            if idx == 0 {
                break;
            }

            cursor.rewind();
            match cursor.pull_in_pass()? {
                Some(derived) => self.current[idx] = derived,
                None => break,
            }
        }

        Ok(false)
    }

    fn round_truncated(&self) -> bool {
        self.cursors.values().any(HoleCursor::pass_truncated)
    }

    fn deepen_all(&mut self) -> bool {
        self.rounds += 1;

        for idx in 0..self.holes.len() {
            if !self.cursor_at(idx).deepen() {
                info!("Depth limit {} reached", self.config.depth_limit);
                self.done = true;
                return false;
            }
        }

        let depth = self.cursor_at(0).max_depth();
        debug!("Round {}: depth {depth}", self.rounds);

        true
    }

    fn is_fresh(&self) -> bool {
        if self.holes.is_empty() {
            return true;
        }

        self.holes.iter()
            .zip(&self.current)
            .any(|(hole, derived)| {
                self.cursors
                    .get(hole.name())
                    .map_or(true, |cursor| cursor.is_fresh(derived))
            })
    }

    fn snapshot(&self) -> Candidate {
        self.holes.iter()
            .zip(&self.current)
            .map(|(hole, derived)| (hole.name().to_string(), derived.expr.clone()))
            .collect()
    }
}

impl<'p> Synthesizer for Enumerator<'p> {
    fn next_candidate(&mut self) -> Result<Option<Candidate>, SynthError> {
        loop {
            if !self.advance()? {
                return Ok(None);
            }

            if self.config.resume && !self.is_fresh() {
                continue;
            }

            return Ok(Some(self.snapshot()));
        }
    }
}
