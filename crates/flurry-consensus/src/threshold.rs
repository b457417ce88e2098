//! Round tallies and the majority test.
//!
//! A round confirms the proposed value when at least `majority_threshold`
//! sampled peers agree. The threshold is an absolute count, not a fraction
//! of the sample, so it must be sized together with the sample size.
//!
//! Unreachable peers abstain: they count toward neither agreement nor
//! explicit disagreement.

/// What one sampled peer said about a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerReply {
    /// The peer adopted the value or already held exactly this value.
    Agree,
    /// The peer holds a different value.
    Disagree,
    /// No usable answer: connection failure, timeout or malformed response.
    Unreachable,
}

impl PeerReply {
    /// Map an `accept` flag from the wire onto a reply.
    pub const fn from_accept(accept: bool) -> Self {
        if accept {
            Self::Agree
        } else {
            Self::Disagree
        }
    }
}

/// Result of one round, as consumed by the confidence counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Enough peers agreed with the held value.
    Confirm,
    /// Disagreement or silence dominated.
    Disconfirm,
}

/// Counts collected from every sampled peer in one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundTally {
    pub sampled: usize,
    pub agreed: usize,
    pub disagreed: usize,
    pub unreachable: usize,
}

impl RoundTally {
    /// Tally a full set of replies.
    pub fn from_replies<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = PeerReply>,
    {
        let mut tally = Self::default();
        for reply in replies {
            tally.record(reply);
        }
        tally
    }

    /// Add one reply.
    pub fn record(&mut self, reply: PeerReply) {
        self.sampled += 1;
        match reply {
            PeerReply::Agree => self.agreed += 1,
            PeerReply::Disagree => self.disagreed += 1,
            PeerReply::Unreachable => self.unreachable += 1,
        }
    }

    /// Peers that answered either way.
    pub const fn responded(&self) -> usize {
        self.agreed + self.disagreed
    }

    /// Apply the majority test.
    pub const fn outcome(&self, majority_threshold: usize) -> RoundOutcome {
        if meets_majority(self.agreed, majority_threshold) {
            RoundOutcome::Confirm
        } else {
            RoundOutcome::Disconfirm
        }
    }
}

/// Check whether an agreement count meets the threshold.
pub const fn meets_majority(agreed: usize, majority_threshold: usize) -> bool {
    agreed >= majority_threshold
}

/// How many more agreeing peers a round would have needed.
pub const fn agreements_needed(agreed: usize, majority_threshold: usize) -> usize {
    if agreed >= majority_threshold {
        0
    } else {
        majority_threshold - agreed
    }
}
