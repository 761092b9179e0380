//! Settle ledger for the array layout
//!
//! One bit per array slot: set once the slot's growth (or result) is final.
//! Every task of a level pass claims the slots it produced; a slot claimed
//! twice is a conflict, a slot nobody claimed leaves the level unsettled.

use std::ops::Range;

use bitvec::prelude::*;

use crate::StateError;

/// Per-slot completion bits
#[derive(Debug, Clone)]
pub struct SettleLedger {
    settled: BitVec,
}

impl SettleLedger {
    /// Create ledger with every slot unsettled
    pub fn new(slots: usize) -> Self {
        Self {
            settled: bitvec![0; slots],
        }
    }

    /// Number of tracked slots
    pub fn len(&self) -> usize {
        self.settled.len()
    }

    /// Whether the ledger tracks no slots
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }

    /// Mark a range settled (after the tasks writing it have joined)
    pub fn settle(&mut self, range: Range<usize>) {
        self.settled[range].fill(true);
    }

    /// Settle `range` on behalf of one task. Fails if any slot of it was
    /// already settled or lies outside the ledger.
    pub fn claim(&mut self, range: Range<usize>) -> Result<(), StateError> {
        let conflict = StateError::SlotConflict {
            start: range.start,
            end: range.end,
        };
        if range.start > range.end || range.end > self.settled.len() {
            return Err(conflict);
        }
        if self.settled[range.clone()].any() {
            return Err(conflict);
        }
        self.settled[range].fill(true);
        Ok(())
    }

    /// Claim every piece of a level, then check together they cover it.
    pub fn settle_level<I>(&mut self, level: Range<usize>, pieces: I) -> Result<(), StateError>
    where
        I: IntoIterator<Item = Range<usize>>,
    {
        for piece in pieces {
            if piece.start < level.start || piece.end > level.end {
                return Err(StateError::SlotConflict {
                    start: piece.start,
                    end: piece.end,
                });
            }
            self.claim(piece)?;
        }
        self.ensure_settled(level)
    }

    /// Whether every slot of `range` is settled
    pub fn is_settled(&self, range: Range<usize>) -> bool {
        self.settled[range].all()
    }

    /// Fail with the first unsettled position of `range`
    pub fn ensure_settled(&self, range: Range<usize>) -> Result<(), StateError> {
        match self.settled[range.clone()].first_zero() {
            None => Ok(()),
            Some(offset) => Err(StateError::Unsettled {
                start: range.start + offset,
                end: range.end,
            }),
        }
    }

    /// Number of settled slots
    pub fn settled_count(&self) -> usize {
        self.settled.count_ones()
    }

    /// Verify every slot settled
    pub fn all_settled(&self) -> bool {
        self.settled.all()
    }
}
