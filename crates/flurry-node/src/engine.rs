//! Per-position consensus loops.
//!
//! A loop owns one position's [`ConfidenceCounter`] and repeats
//! sample -> round -> observe until the counter decides:
//!
//! - **Confirm**: count += 1; at the threshold the position is decided and
//!   the loop ends.
//! - **Disconfirm** (flip): the stored entry is cleared and the count reset.
//!   The loop keeps proposing the value it remembers, even though the record
//!   no longer holds it and may later be re-adopted with a different value.
//!
//! At most one loop runs per position. The [`LoopRegistry`] is the guard:
//! a loop is registered before it is spawned and unregistered when it ends,
//! whether it decided, failed or panicked.
//!
//! A position re-adopted with another value while its loop still runs gets
//! no second loop. Instead the running loop hands the position off when it
//! ends: if the record then holds an undecided value other than the one the
//! loop proposed, a fresh loop starts for that value.
//!
//! A failed round (sampler error, dead query task) ends only that loop.
//! Other positions keep running.

use crate::error::Result;
use crate::record::RecordStore;
use crate::round::RoundCoordinator;
use flurry_consensus::{
    agreements_needed, sample_peers, ConfidenceCounter, ConsensusParams, NodeId, Position, Proposal, Step,
    Value,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Positions that currently have a running loop.
#[derive(Debug, Default)]
pub struct LoopRegistry {
    active: Mutex<HashSet<Position>>,
}

impl LoopRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<Position>> {
        // The set stays consistent even if a holder panicked mid-insert.
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim `position`. Returns `false` if a loop already runs there.
    pub fn try_register(&self, position: Position) -> bool {
        self.lock().insert(position)
    }

    pub fn unregister(&self, position: Position) {
        self.lock().remove(&position);
    }

    pub fn is_active(&self, position: Position) -> bool {
        self.lock().contains(&position)
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }
}

/// Releases a registry slot when dropped.
struct Registration {
    registry: Arc<LoopRegistry>,
    position: Position,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(self.position);
    }
}

/// Summary of a loop that reached a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    pub position: Position,
    pub value: Value,
    /// Rounds run, including the deciding one.
    pub rounds: usize,
    /// Disconfirming rounds observed along the way.
    pub flips: usize,
    /// Whether the record still held `value` when the loop decided.
    pub recorded: bool,
}

/// Everything a loop needs; cheap to clone into spawned tasks.
#[derive(Clone)]
pub struct Engine {
    self_id: NodeId,
    network_size: usize,
    params: ConsensusParams,
    round_interval: Duration,
    store: Arc<RecordStore>,
    rounds: RoundCoordinator,
    registry: Arc<LoopRegistry>,
}

impl Engine {
    pub fn new(
        self_id: NodeId,
        network_size: usize,
        params: ConsensusParams,
        round_interval: Duration,
        store: Arc<RecordStore>,
        rounds: RoundCoordinator,
    ) -> Self {
        Self {
            self_id,
            network_size,
            params,
            round_interval,
            store,
            rounds,
            registry: Arc::new(LoopRegistry::new()),
        }
    }

    pub fn registry(&self) -> &Arc<LoopRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Start a background loop for `position` unless one is already running.
    ///
    /// Fire-and-forget: the caller gets no handle on the eventual decision.
    pub fn spawn_loop(&self, position: Position, value: Value) -> bool {
        if !self.registry.try_register(position) {
            debug!("Loop for position {} already running", position);
            return false;
        }

        let registration = Registration {
            registry: Arc::clone(&self.registry),
            position,
        };
        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.run_loop(position, value.clone()).await {
                error!("Consensus loop for position {} stopped: {}", position, e);
            }
            // Release the slot before looking at the record, so a value
            // adopted from here on starts its own loop in the handler.
            drop(registration);
            if let Some(next) = engine.stranded_value(position, &value).await {
                info!(
                    "Position {} re-adopted {:?} while its loop ran, handing off",
                    position,
                    next.as_str()
                );
                engine.spawn_loop(position, next);
            }
        });
        true
    }

    /// An undecided value held for `position` other than `finished`, i.e. one
    /// adopted while `finished`'s loop held the registry slot.
    async fn stranded_value(&self, position: Position, finished: &Value) -> Option<Value> {
        self.store
            .get(position)
            .await
            .filter(|entry| !entry.decided && entry.value != *finished)
            .map(|entry| entry.value)
    }

    async fn finish(&self, position: Position, value: Value, rounds: usize, flips: usize) -> LoopReport {
        let recorded = self.store.mark_decided(position, &value).await;
        if recorded {
            info!("Position {} decided {:?} after {} rounds", position, value.as_str(), rounds);
        } else {
            warn!(
                "Position {} decided {:?} but the record no longer holds it",
                position,
                value.as_str()
            );
        }
        LoopReport {
            position,
            value,
            rounds,
            flips,
            recorded,
        }
    }

    /// Drive `position` to a decision on `value`.
    ///
    /// Runs in the caller's task; [`spawn_loop`](Self::spawn_loop) is the
    /// registered, backgrounded form.
    pub async fn run_loop(&self, position: Position, value: Value) -> Result<LoopReport> {
        let proposal = Proposal {
            position,
            value: value.clone(),
        };
        let mut counter = ConfidenceCounter::new(self.params.counter_threshold);
        let mut rounds = 0;
        let mut flips = 0;

        info!("Proposing {:?} for position {}", value.as_str(), position);

        loop {
            let peers = sample_peers(self.self_id, self.network_size, self.params.sample_size)?;
            let tally = self.rounds.run_round(&proposal, &peers).await?;
            rounds += 1;

            let outcome = tally.outcome(self.params.majority_threshold);
            debug!(
                "Position {} round {}: {}/{} agreed ({} short), {} disagreed, {} unreachable -> {:?}",
                position,
                rounds,
                tally.agreed,
                tally.sampled,
                agreements_needed(tally.agreed, self.params.majority_threshold),
                tally.disagreed,
                tally.unreachable,
                outcome
            );

            match counter.observe(outcome) {
                Step::Confirmed { count } => {
                    debug!(
                        "Position {} confidence {}/{}, {} rounds to go",
                        position,
                        count,
                        counter.threshold(),
                        counter.rounds_remaining()
                    );
                }
                Step::Decided => return Ok(self.finish(position, value, rounds, flips).await),
                // The loop returns on `Decided`, so the counter is never fed again.
                Step::AlreadyDecided => {
                    debug_assert!(false, "position {} observed after deciding", position);
                    return Ok(self.finish(position, value, rounds, flips).await);
                }
                Step::Flipped => {
                    flips += 1;
                    match self.store.clear(position).await {
                        Some(dropped) => info!(
                            "Position {} flipped: dropped {:?}, confidence reset",
                            position,
                            dropped.as_str()
                        ),
                        None => debug!("Position {} flipped with nothing held", position),
                    }
                }
            }

            if !self.round_interval.is_zero() {
                tokio::time::sleep(self.round_interval).await;
            }
        }
    }
}
