//! ResultSet - order-restoring outcome aggregator
//!
//! Outcomes arrive in completion order and are stored under their record
//! index. Finalizing yields exactly one outcome per index, in index order.
//! The set has a single writer (the dispatcher's collection loop), so slots
//! need no locking.

use crate::error::{BatchError, Result};

use super::Outcome;

/// Fixed-size, index-addressed outcome storage
#[derive(Debug)]
pub struct ResultSet {
    slots: Vec<Option<Outcome>>,
    filled: usize,
}

impl ResultSet {
    /// Empty set expecting `len` outcomes
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
            filled: 0,
        }
    }

    /// Expected number of outcomes
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of outcomes recorded so far
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&Outcome> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Store an outcome under its index.
    ///
    /// Fails if the index is out of range or already holds an outcome.
    pub fn record(&mut self, outcome: Outcome) -> Result<()> {
        let index = outcome.index();
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(BatchError::OutcomeOutOfRange { index, len })?;

        if slot.is_some() {
            return Err(BatchError::DuplicateOutcome { index });
        }
        *slot = Some(outcome);
        self.filled += 1;
        Ok(())
    }

    /// All outcomes ordered by index.
    ///
    /// Fails if any slot is still empty.
    pub fn finalize(self) -> Result<Vec<Outcome>> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(BatchError::MissingOutcome { index }))
            .collect()
    }
}
