use crate::error::SynthError;

use super::{Candidate, Synthesizer};

/// This synthesizer simply replays a fixed list of candidates, then stops.
pub struct FixedSearch {
    db: Vec<Candidate>,
    last_tried: usize,
}

impl FixedSearch {
    pub fn new(db: impl IntoIterator<Item = Candidate>) -> Self {
        Self {
            db: db.into_iter().collect(),
            last_tried: 0,
        }
    }
}

impl Synthesizer for FixedSearch {
    fn next_candidate(&mut self) -> Result<Option<Candidate>, SynthError> {
        match self.db.get(self.last_tried) {
            None => Ok(None),
            Some(x) => {
                self.last_tried += 1;
                Ok(Some(x.clone()))
            },
        }
    }
}
