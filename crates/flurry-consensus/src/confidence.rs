//! Per-position confidence counting.
//!
//! # State machine
//!
//! ```text
//!            Confirm (count < threshold)
//!              ┌───────┐
//!              ▼       │
//!   ──────► Proposing ─┘ ── Confirm (count == threshold) ──► Decided
//!              ▲   │
//!              └───┘
//!        Disconfirm: count = 0, caller clears the stored entry
//! ```
//!
//! `Decided` is terminal: once reached, further observations are ignored
//! and report [`Step::AlreadyDecided`].
//!
//! The counter is owned by exactly one consensus loop. Nothing else reads or
//! writes it, so it carries no synchronisation of its own.

use crate::threshold::RoundOutcome;

/// Lifecycle of one position's consensus loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Still sampling.
    Proposing,
    /// Enough consecutive confirming rounds were observed. Terminal.
    Decided,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proposing => write!(f, "Proposing"),
            Self::Decided => write!(f, "Decided"),
        }
    }
}

/// What the loop must do after feeding one round outcome to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Round confirmed; keep sampling. Carries the new count.
    Confirmed { count: usize },
    /// Round confirmed and the threshold was reached; stop.
    Decided,
    /// Round disconfirmed; the count was reset and the held value must be
    /// cleared from the record.
    Flipped,
    /// The counter had already decided; nothing changed.
    AlreadyDecided,
}

/// Consecutive-confirmation counter for one position.
#[derive(Debug, Clone)]
pub struct ConfidenceCounter {
    count: usize,
    threshold: usize,
    state: LoopState,
}

impl ConfidenceCounter {
    /// Start a fresh counter at zero.
    ///
    /// A `threshold` of zero is treated as one: a position cannot decide
    /// without observing at least one confirming round.
    pub fn new(threshold: usize) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
            state: LoopState::Proposing,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_decided(&self) -> bool {
        self.state == LoopState::Decided
    }

    /// Feed one round outcome and return the transition taken.
    pub fn observe(&mut self, outcome: RoundOutcome) -> Step {
        if self.is_decided() {
            return Step::AlreadyDecided;
        }

        match outcome {
            RoundOutcome::Confirm => {
                self.count += 1;
                if self.count >= self.threshold {
                    self.state = LoopState::Decided;
                    Step::Decided
                } else {
                    Step::Confirmed { count: self.count }
                }
            }
            RoundOutcome::Disconfirm => {
                self.count = 0;
                Step::Flipped
            }
        }
    }

    /// Confirming rounds still required to decide, assuming no flip.
    pub fn rounds_remaining(&self) -> usize {
        self.threshold.saturating_sub(self.count)
    }
}
