//! Worker input and replica output

use hd_01_block::{Height, Round, Transaction};
use hd_02_consensus::Transition;
use shared_crypto::{Hash, Signatory};

/// Input consumed by a replica worker, in channel order
#[derive(Clone, Debug)]
pub enum Message {
    Transition(Transition),
    Transact(Transaction),
    Shutdown,
}

/// Notification emitted by a replica
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicaEvent {
    Committed {
        signatory: Signatory,
        height: Height,
        round: Round,
        header: Hash,
        txs: usize,
    },
}
