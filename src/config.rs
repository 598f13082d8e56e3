use std::{ops::Range, time::Duration};

use crate::{error::ConfigError, expr::ExprVal};

pub const DEFAULT_INITIAL_DEPTH: u32 = 5;
pub const DEFAULT_DEPTH_LIMIT: u32 = 160;
pub const DEPTH_GROWTH: u32 = 2;
pub const DEFAULT_INT_RANGE: IntRange = IntRange { start: -10, end: 10 };
pub const DEFAULT_ITERATION_BUDGET: usize = 1_000;
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(10);

/// The nesting order of child positions when a composite template is
/// expanded. Both orders enumerate the same candidates at any depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Strategy {
    /// The first child varies slowest, the last one fastest.
    #[default]
    LeftToRight,
    /// The last child varies slowest, the first one fastest.
    RightToLeft,
}

impl Strategy {
    /// Child positions, outermost loop first.
    pub fn child_order(self, count: usize) -> Vec<usize> {
        match self {
            Strategy::LeftToRight => (0..count).collect(),
            Strategy::RightToLeft => (0..count).rev().collect(),
        }
    }
}

/// The half-open window integer slots range over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntRange {
    pub start: ExprVal,
    pub end: ExprVal,
}

impl IntRange {
    /// Fails on an empty window, which would leave every integer slot
    /// without a value.
    pub fn new(start: ExprVal, end: ExprVal) -> Result<Self, ConfigError> {
        if start >= end {
            return Err(ConfigError::EmptyIntRange { start, end });
        }

        Ok(Self { start, end })
    }

    pub fn values(self) -> Range<ExprVal> {
        self.start..self.end
    }
}

impl Default for IntRange {
    fn default() -> Self {
        DEFAULT_INT_RANGE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum OraclePolicy {
    /// Stop the search and report the failure.
    #[default]
    Abort,
    /// Log the failure and move on to the next candidate.
    Skip,
}

/// Everything that shapes the candidate sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchConfig {
    /// Depth of the first pass. Values below 1 are treated as 1.
    pub initial_depth: u32,
    /// Passes deeper than this are never started. Derivations recurse once
    /// per level of depth, so very deep passes need a large thread stack.
    pub depth_limit: u32,
    pub strategy: Strategy,
    pub int_range: IntRange,
    /// Skip candidates an earlier, shallower pass already produced.
    pub resume: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            initial_depth: DEFAULT_INITIAL_DEPTH,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            strategy: Strategy::default(),
            int_range: IntRange::default(),
            resume: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub search: SearchConfig,
    pub iteration_budget: usize,
    /// Per-call solver timeout. `None` lets z3 run unbounded.
    pub oracle_timeout: Option<Duration>,
    pub oracle_policy: OraclePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            iteration_budget: DEFAULT_ITERATION_BUDGET,
            oracle_timeout: Some(DEFAULT_ORACLE_TIMEOUT),
            oracle_policy: OraclePolicy::default(),
        }
    }
}
