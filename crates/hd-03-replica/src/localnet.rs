//! A whole shard in one process
//!
//! Every replica gets its own worker task and channel; a
//! [`ChannelDispatcher`] per replica fans actions out to all of them.

use crate::adapters::{ChannelDispatcher, FifoPool};
use crate::domain::{Message, ReplicaConfig, ReplicaError, ReplicaEvent, Shard};
use crate::service::Replica;
use crate::worker::run_worker;
use hd_01_block::{Blockchain, Transaction};
use shared_crypto::{Secp256k1KeyPair, Signer};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Replica type run by [`LocalNet`]
pub type LocalReplica = Replica<ChannelDispatcher, FifoPool, Secp256k1KeyPair>;

/// Handle to a running in-process shard
pub struct LocalNet {
    shard: Shard,
    senders: Vec<UnboundedSender<Message>>,
    handles: Vec<JoinHandle<LocalReplica>>,
}

impl LocalNet {
    /// Spawn one worker per key, the keys forming the whole shard. Commit
    /// events of every replica arrive on the returned receiver.
    pub fn spawn(
        keys: Vec<Secp256k1KeyPair>,
        config: ReplicaConfig,
    ) -> Result<(Self, UnboundedReceiver<ReplicaEvent>), ReplicaError> {
        let shard = Shard::from_signatories(keys.iter().map(Signer::signatory).collect());
        Self::spawn_in(shard, keys, config)
    }

    /// Spawn workers for some members of `shard`. Members without a key
    /// stay silent.
    pub fn spawn_in(
        shard: Shard,
        keys: Vec<Secp256k1KeyPair>,
        config: ReplicaConfig,
    ) -> Result<(Self, UnboundedReceiver<ReplicaEvent>), ReplicaError> {
        config.validate()?;

        let (senders, receivers): (Vec<_>, Vec<_>) =
            keys.iter().map(|_| unbounded_channel::<Message>()).unzip();
        let peers: Vec<_> = keys
            .iter()
            .map(Signer::signatory)
            .zip(senders.iter().cloned())
            .collect();
        let (events_tx, events_rx) = unbounded_channel();

        let mut replicas = Vec::with_capacity(keys.len());
        for key in keys {
            let replica = Replica::new(
                config.clone(),
                shard.clone(),
                key,
                Arc::new(FifoPool::new()),
                Arc::new(ChannelDispatcher::new(peers.clone())),
                Blockchain::new(),
            )?
            .with_events(events_tx.clone());
            replicas.push(replica);
        }

        let handles = replicas
            .into_iter()
            .zip(receivers)
            .map(|(replica, receiver)| {
                tokio::spawn(run_worker(replica, receiver, config.propose_timeout()))
            })
            .collect();

        info!(
            shard = %shard.hash,
            replicas = shard.len(),
            threshold = shard.threshold(),
            "Local network started"
        );
        Ok((
            Self {
                shard,
                senders,
                handles,
            },
            events_rx,
        ))
    }

    pub fn shard(&self) -> &Shard {
        &self.shard
    }

    /// Hand a transaction to every replica's pool.
    pub fn transact(&self, tx: Transaction) {
        for sender in &self.senders {
            let _ = sender.send(Message::Transact(tx.clone()));
        }
    }

    /// Stop every worker and collect the replicas that exited cleanly.
    pub async fn shutdown(self) -> Vec<LocalReplica> {
        for sender in &self.senders {
            let _ = sender.send(Message::Shutdown);
        }

        let mut replicas = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            match handle.await {
                Ok(replica) => replicas.push(replica),
                Err(e) => warn!(error = %e, "Replica task failed"),
            }
        }
        replicas
    }
}
