//! Replica service
//!
//! Owns a [`StateMachine`] for one shard and connects it to the outside:
//! admission by shard membership, proposing when this replica is the
//! proposer, broadcasting actions and pruning the pool after commits.

use crate::domain::{ReplicaConfig, ReplicaError, ReplicaEvent, Shard};
use crate::ports::{Dispatcher, TxPool};
use hd_01_block::{Blockchain, Height, Round, Transaction};
use hd_02_consensus::{Action, ConsensusConfig, State, StateMachine, Transition};
use shared_crypto::{Signatory, Signer};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};


/// Consensus participant for a single shard
pub struct Replica<D: Dispatcher, P: TxPool, S: Signer> {
    config: ReplicaConfig,
    shard: Shard,
    dispatcher: Arc<D>,
    pool: Arc<P>,
    state_machine: StateMachine<S>,
    last_proposed: Option<(Height, Round)>,
    events: Option<UnboundedSender<ReplicaEvent>>,
}

impl<D: Dispatcher, P: TxPool, S: Signer> Replica<D, P, S> {
    pub fn new(
        config: ReplicaConfig,
        shard: Shard,
        signer: S,
        pool: Arc<P>,
        dispatcher: Arc<D>,
        blockchain: Blockchain,
    ) -> Result<Self, ReplicaError> {
        config.validate()?;
        if !shard.contains(&signer.signatory()) {
            return Err(ReplicaError::Config(format!(
                "signatory {} is not a member of shard {}",
                signer.signatory(),
                shard.hash
            )));
        }

        let consensus = ConsensusConfig {
            threshold: shard.threshold(),
            buffer_capacity: config.buffer_capacity,
        };
        let state_machine = StateMachine::new(consensus, signer, blockchain)?;

        Ok(Self {
            config,
            shard,
            dispatcher,
            pool,
            state_machine,
            last_proposed: None,
            events: None,
        })
    }

    /// Emit [`ReplicaEvent`]s on the given channel.
    pub fn with_events(mut self, events: UnboundedSender<ReplicaEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> State {
        self.state_machine.state()
    }

    pub fn blockchain(&self) -> &Blockchain {
        self.state_machine.blockchain()
    }

    pub fn state_machine(&self) -> &StateMachine<S> {
        &self.state_machine
    }

    pub fn shard(&self) -> &Shard {
        &self.shard
    }

    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    pub fn signatory(&self) -> Signatory {
        self.state_machine.signatory()
    }

    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    /// Start participating: propose if this replica leads the first point.
    pub async fn init(&mut self) -> Result<(), ReplicaError> {
        info!(
            signatory = %self.signatory(),
            shard = %self.shard.hash,
            state = %self.state(),
            "Replica starting"
        );
        self.propose_if_proposer().await
    }

    /// Queue a transaction for a future proposal.
    pub fn transact(&self, tx: Transaction) -> bool {
        self.pool.enqueue(tx)
    }

    /// Feed a verified transition and broadcast whatever it produces.
    ///
    /// Proposals from anyone but the point's proposer and votes from
    /// non-members are dropped silently. Every action is dispatched even
    /// when an earlier one fails; the first dispatch error is returned
    /// after the replica has finished its own bookkeeping.
    pub async fn transition(&mut self, transition: Transition) -> Result<(), ReplicaError> {
        if !self.admit(&transition) {
            return Ok(());
        }

        let before = self.blockchain().height();
        let actions = self.state_machine.transition(transition)?;
        let after = self.blockchain().height();
        if after > before {
            self.on_committed(before + 1, after);
        }

        let mut first_error = None;
        for action in actions {
            if let Err(e) = self.dispatch(action).await {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.propose_if_proposer().await {
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Time out the current point.
    pub async fn timeout(&mut self) -> Result<(), ReplicaError> {
        let (height, round) = self.state().point();
        self.transition(Transition::TimedOut { height, round }).await
    }

    fn admit(&self, transition: &Transition) -> bool {
        match transition {
            Transition::Proposed(block) => {
                let expected = self.shard.proposer(block.height(), block.round());
                if expected != Some(block.signatory) {
                    warn!(
                        height = block.height(),
                        round = block.round(),
                        signatory = %block.signatory,
                        "Dropping proposal from non-proposer"
                    );
                    return false;
                }
                true
            }
            Transition::PreVoted(vote) => self.admit_member(&vote.signatory, "pre_voted"),
            Transition::PreCommitted(vote) => self.admit_member(&vote.signatory, "pre_committed"),
            Transition::TimedOut { .. } => true,
        }
    }

    fn admit_member(&self, signatory: &Signatory, kind: &'static str) -> bool {
        let member = self.shard.contains(signatory);
        if !member {
            warn!(%signatory, kind, "Dropping vote from non-member");
        }
        member
    }

    async fn propose_if_proposer(&mut self) -> Result<(), ReplicaError> {
        let State::WaitForPropose { height, round } = self.state() else {
            return Ok(());
        };
        if self.last_proposed == Some((height, round)) {
            return Ok(());
        }
        if self.shard.proposer(height, round) != Some(self.signatory()) {
            return Ok(());
        }

        let txs = self.pool.pending(self.config.max_txs_per_block);
        let Some(action) = self.state_machine.propose(unix_time(), txs)? else {
            return Ok(());
        };
        self.last_proposed = Some((height, round));
        info!(height, round, "Proposing as shard proposer");
        self.dispatch(action).await
    }

    async fn dispatch(&self, action: Action) -> Result<(), ReplicaError> {
        let (height, round) = action.point();
        debug!(height, round, "Dispatching action");
        self.dispatcher
            .dispatch(self.shard.hash, action)
            .await
            .map_err(|e| {
                warn!(height, round, error = %e, "Dispatch failed");
                ReplicaError::Dispatch(e)
            })
    }

    fn on_committed(&self, from: Height, to: Height) {
        for height in from..=to {
            let Some(block) = self.blockchain().block_at(height) else {
                continue;
            };
            self.pool.remove(block.txs());
            info!(
                height,
                round = block.round(),
                header = %block.header(),
                txs = block.txs().len(),
                "Block finalized"
            );

            if let Some(events) = &self.events {
                let _ = events.send(ReplicaEvent::Committed {
                    signatory: self.signatory(),
                    height,
                    round: block.round(),
                    header: block.header(),
                    txs: block.txs().len(),
                });
            }
        }
    }
}

fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
